pub mod password;
pub mod service;
pub mod session;

pub use service::{AuthService, Credentials, Registration};
pub use session::{Session, SessionCodec, SessionUser};
