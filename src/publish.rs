use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::Utc;

use crate::authentication::{require_admin, AuthError};
use crate::domain::blog_post::BlogPost;
use crate::domain::new_blog_post::{NewBlogPost, NewBlogPostBody};
use crate::domain::principal::Principal;
use crate::notification::NotificationDispatcher;
use crate::routes::{error_chain_fmt, ErrorBody};
use crate::store::{PostStore, StoreError};

#[derive(thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    InvalidInput(String),
    #[error("A blog post with this title already exists")]
    DuplicateTitle,
    #[error("Database error during validation")]
    SlugCheck(#[source] StoreError),
    #[error("Failed to create blog post")]
    Storage(#[source] StoreError),
}

impl std::fmt::Debug for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for PublishError {
    fn status_code(&self) -> StatusCode {
        match self {
            PublishError::Auth(err) => err.status_code(),
            PublishError::InvalidInput(_) | PublishError::DuplicateTitle => StatusCode::BAD_REQUEST,
            PublishError::SlugCheck(_) | PublishError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self))
    }
}

/// Validates a draft, stores it as a published post and hands it to the
/// notification dispatcher.
///
/// Every failure happens before the insert succeeds, so a failed publish never
/// leaves a post behind. Notification problems cannot fail a publish.
pub struct PublishWorkflow {
    posts: Arc<dyn PostStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl PublishWorkflow {
    pub fn new(
        posts: Arc<dyn PostStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> PublishWorkflow {
        Self { posts, dispatcher }
    }

    #[tracing::instrument(
        name = "Publishing a blog post",
        skip(self, draft, principal),
        fields(author_id = %principal.id, slug = tracing::field::Empty)
    )]
    pub async fn publish(
        &self,
        draft: NewBlogPostBody,
        principal: &Principal,
    ) -> Result<BlogPost, PublishError> {
        require_admin(principal)?;

        let new_post = NewBlogPost::try_from(draft).map_err(|err| {
            tracing::info!("Validation error: {}", err);
            PublishError::InvalidInput(err)
        })?;
        tracing::Span::current().record("slug", new_post.slug.as_ref());

        let existing = self
            .posts
            .find_by_slug(new_post.slug.as_ref())
            .await
            .map_err(PublishError::SlugCheck)?;
        if existing.is_some() {
            return Err(PublishError::DuplicateTitle);
        }

        // The lookup above only gives a friendly early answer; the store's
        // unique constraint is what settles concurrent publishes.
        let post = self
            .posts
            .create(&new_post, principal.id, Utc::now())
            .await
            .map_err(|err| {
                if err.is_conflict() {
                    PublishError::DuplicateTitle
                } else {
                    PublishError::Storage(err)
                }
            })?;

        self.dispatcher.dispatch(post.clone());

        Ok(post)
    }
}
