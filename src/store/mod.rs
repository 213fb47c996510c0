//! Persistence seams. Handlers and the publish workflow only ever see these
//! traits; [`PgStore`] backs them in production and [`InMemoryStore`] in tests
//! and local experiments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::admin_user::AdminUser;
use crate::domain::blog_post::BlogPost;
use crate::domain::new_blog_post::NewBlogPost;
use crate::domain::pagination::Pagination;
use crate::domain::subscriber::Subscriber;

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("A record violating the unique constraint `{constraint}` already exists.")]
    Conflict { constraint: String },
    #[error("The database returned an error.")]
    Database(#[source] sqlx::Error),
    #[error("The store is unavailable: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::Conflict {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }

        StoreError::Database(err)
    }
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError>;

    /// Inserts a published post attributed to `author_id` and returns it with
    /// the author resolved. A slug collision is reported as
    /// [`StoreError::Conflict`], whatever the caller checked beforehand.
    async fn create(
        &self,
        post: &NewBlogPost,
        author_id: Uuid,
        published_at: DateTime<Utc>,
    ) -> Result<BlogPost, StoreError>;

    /// Newest first. The total counts every post, not just the page.
    async fn list_page(&self, pagination: Pagination) -> Result<(Vec<BlogPost>, i64), StoreError>;
}

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Subscriber>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_admins(&self) -> Result<Vec<AdminUser>, StoreError>;
}
