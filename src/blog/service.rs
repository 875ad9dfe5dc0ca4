use std::sync::Arc;

use crate::db::models::{Category, NewPost, Post, PostChanges, PostFilter};
use crate::db::ContentStore;
use crate::error::{AppError, AppResult};

/// Posts need a non-blank title.
pub fn check_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn ContentStore>,
}

impl BlogService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    // -- Posts --

    pub async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        check_title(&post.title)?;
        let post = self.store.insert_post(&post).await?;
        tracing::info!(id = post.id, "Created post");
        Ok(post)
    }

    pub async fn posts(&self, filter: PostFilter) -> AppResult<Vec<Post>> {
        Ok(self.store.list_posts(filter).await?)
    }

    /// Published posts, optionally restricted to one category.
    pub async fn published_posts(&self, category: Option<i64>) -> AppResult<Vec<Post>> {
        let filter = match category {
            Some(id) => PostFilter::PublishedInCategory(id),
            None => PostFilter::Published,
        };
        self.posts(filter).await
    }

    pub async fn post(&self, id: i64) -> AppResult<Post> {
        self.store
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No post with id {id}")))
    }

    /// Like [`BlogService::post`], but drafts count as missing.
    pub async fn published_post(&self, id: i64) -> AppResult<Post> {
        let post = self.post(id).await?;
        if !post.published {
            return Err(AppError::NotFound(format!("No post with id {id}")));
        }
        Ok(post)
    }

    pub async fn update_post(&self, id: i64, changes: PostChanges) -> AppResult<Post> {
        check_title(&changes.title)?;
        let post = self
            .store
            .update_post(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No post with id {id}")))?;
        tracing::info!(id, "Updated post");
        Ok(post)
    }

    pub async fn delete_post(&self, id: i64) -> AppResult<()> {
        if !self.store.delete_post(id).await? {
            return Err(AppError::NotFound(format!("No post with id {id}")));
        }
        tracing::info!(id, "Deleted post");
        Ok(())
    }

    // -- Categories --

    pub async fn create_category(&self, name: &str) -> AppResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name is required".into()));
        }
        let category = self.store.insert_category(name).await?;
        tracing::info!(id = category.id, "Created category");
        Ok(category)
    }

    pub async fn categories(&self) -> AppResult<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn category(&self, id: i64) -> AppResult<Category> {
        self.store
            .find_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No category with id {id}")))
    }

    pub async fn rename_category(&self, id: i64, name: &str) -> AppResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name is required".into()));
        }
        self.store
            .rename_category(id, name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No category with id {id}")))
    }

    /// Posts filed under the category keep their reference to it.
    pub async fn delete_category(&self, id: i64) -> AppResult<()> {
        if !self.store.delete_category(id).await? {
            return Err(AppError::NotFound(format!("No category with id {id}")));
        }
        tracing::info!(id, "Deleted category");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ImageChange;
    use crate::db::{memory_pool, SqliteContentStore, CONTENT_MIGRATIONS};

    fn service() -> BlogService {
        BlogService::new(Arc::new(SqliteContentStore::new(memory_pool(
            CONTENT_MIGRATIONS,
        ))))
    }

    #[tokio::test]
    async fn created_post_round_trips() {
        let blog = service();
        let created = blog
            .create_post(NewPost {
                title: "A".into(),
                body: "B".into(),
                published: true,
                ..Default::default()
            })
            .await
            .unwrap();

        let fetched = blog.post(created.id).await.unwrap();
        assert_eq!(fetched.title, "A");
        assert_eq!(fetched.body, "B");
        assert!(fetched.published);
        assert_eq!(fetched.post_date, created.post_date);
        assert_eq!(fetched.feature_image, None);
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_public_lookups() {
        let blog = service();
        let draft = blog
            .create_post(NewPost {
                title: "draft".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(blog.post(draft.id).await.is_ok());
        assert!(matches!(
            blog.published_post(draft.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(blog.published_posts(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn untitled_post_is_invalid() {
        let blog = service();
        let err = blog.create_post(NewPost::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_post_operations_are_not_found() {
        let blog = service();
        assert!(matches!(blog.post(7).await, Err(AppError::NotFound(_))));
        assert!(matches!(blog.delete_post(7).await, Err(AppError::NotFound(_))));
        let changes = PostChanges {
            title: "t".into(),
            ..Default::default()
        };
        assert!(matches!(
            blog.update_post(7, changes).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleting_referenced_category_leaves_reference_dangling() {
        let blog = service();
        let unused = blog.create_category("Unused").await.unwrap();
        let used = blog.create_category("Used").await.unwrap();
        let post = blog
            .create_post(NewPost {
                title: "filed".into(),
                category: Some(used.id),
                published: true,
                ..Default::default()
            })
            .await
            .unwrap();

        blog.delete_category(unused.id).await.unwrap();
        blog.delete_category(used.id).await.unwrap();

        let after = blog.post(post.id).await.unwrap();
        assert_eq!(after.category, Some(used.id));
        assert!(blog.categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_applies_image_branch() {
        let blog = service();
        let post = blog
            .create_post(NewPost {
                title: "pic".into(),
                feature_image: Some("https://cdn/a.png".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = blog
            .update_post(
                post.id,
                PostChanges {
                    title: "pic".into(),
                    image: ImageChange::Remove,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.feature_image, None);
    }
}
