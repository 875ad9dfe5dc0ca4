// Content store: posts and categories
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row, ToSql};

use crate::db::models::{Category, ImageChange, NewPost, Post, PostChanges, PostFilter};
use crate::db::StoreError;
use crate::state::DbPool;

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn insert_post(&self, post: &NewPost) -> Result<Post, StoreError>;

    /// Posts matching `filter`, newest first.
    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>, StoreError>;

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError>;

    async fn update_post(&self, id: i64, changes: &PostChanges)
        -> Result<Option<Post>, StoreError>;

    /// Returns false when no post had that id.
    async fn delete_post(&self, id: i64) -> Result<bool, StoreError>;

    async fn insert_category(&self, name: &str) -> Result<Category, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn find_category(&self, id: i64) -> Result<Option<Category>, StoreError>;

    async fn rename_category(&self, id: i64, name: &str) -> Result<Option<Category>, StoreError>;

    /// Does not touch posts that reference the category.
    async fn delete_category(&self, id: i64) -> Result<bool, StoreError>;
}

pub struct SqliteContentStore {
    pool: DbPool,
}

impl SqliteContentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "id, title, body, post_date, feature_image, published, category";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        post_date: row.get(3)?,
        feature_image: row.get(4)?,
        published: row.get(5)?,
        category: row.get(6)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn find_post_with(conn: &rusqlite::Connection, id: i64) -> Result<Option<Post>, StoreError> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], post_from_row).optional()?)
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn insert_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        let conn = self.pool.get()?;
        let post_date = Utc::now();

        conn.execute(
            "INSERT INTO posts (title, body, post_date, feature_image, published, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                post.title,
                post.body,
                post_date,
                post.feature_image,
                post.published,
                post.category
            ],
        )?;

        Ok(Post {
            id: conn.last_insert_rowid(),
            title: post.title.clone(),
            body: post.body.clone(),
            post_date,
            feature_image: post.feature_image.clone(),
            published: post.published,
            category: post.category,
        })
    }

    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>, StoreError> {
        let conn = self.pool.get()?;

        let (clause, args): (&str, Vec<Box<dyn ToSql>>) = match filter {
            PostFilter::All => ("", vec![]),
            PostFilter::Category(id) => ("WHERE category = ?1", vec![Box::new(id)]),
            PostFilter::MinDate(min) => ("WHERE post_date >= ?1", vec![Box::new(min)]),
            PostFilter::Published => ("WHERE published = 1", vec![]),
            PostFilter::PublishedInCategory(id) => {
                ("WHERE published = 1 AND category = ?1", vec![Box::new(id)])
            }
        };

        let sql = format!("SELECT {POST_COLUMNS} FROM posts {clause} ORDER BY post_date DESC, id DESC");
        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let conn = self.pool.get()?;
        find_post_with(&conn, id)
    }

    async fn update_post(
        &self,
        id: i64,
        changes: &PostChanges,
    ) -> Result<Option<Post>, StoreError> {
        let conn = self.pool.get()?;

        let rows = match &changes.image {
            ImageChange::Keep => conn.execute(
                "UPDATE posts SET title = ?1, body = ?2, published = ?3, category = ?4,
                    updated_at = datetime('now')
                 WHERE id = ?5",
                params![
                    changes.title,
                    changes.body,
                    changes.published,
                    changes.category,
                    id
                ],
            )?,
            image => conn.execute(
                "UPDATE posts SET title = ?1, body = ?2, published = ?3, category = ?4,
                    feature_image = ?5, updated_at = datetime('now')
                 WHERE id = ?6",
                params![
                    changes.title,
                    changes.body,
                    changes.published,
                    changes.category,
                    image.apply(None),
                    id
                ],
            )?,
        };

        if rows == 0 {
            return Ok(None);
        }
        find_post_with(&conn, id)
    }

    async fn delete_post(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    async fn insert_category(&self, name: &str) -> Result<Category, StoreError> {
        let conn = self.pool.get()?;
        conn.execute("INSERT INTO categories (name) VALUES (?1)", params![name])?;
        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, StoreError> {
        let conn = self.pool.get()?;
        Ok(conn
            .query_row(
                "SELECT id, name FROM categories WHERE id = ?1",
                params![id],
                category_from_row,
            )
            .optional()?)
    }

    async fn rename_category(&self, id: i64, name: &str) -> Result<Option<Category>, StoreError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE categories SET name = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![name, id],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        Ok(Some(Category {
            id,
            name: name.to_string(),
        }))
    }

    async fn delete_category(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
