pub mod pagination;
pub mod service;

pub use pagination::{parse_page, Page};
pub use service::{check_title, BlogService};
