use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::authentication::{require_admin, AuthError};
use crate::domain::blog_post::BlogPost;
use crate::domain::pagination::{PageSummary, Pagination};
use crate::domain::principal::Principal;
use crate::routes::{error_chain_fmt, ErrorBody};
use crate::store::{PostStore, StoreError};

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub posts: Vec<BlogPost>,
    pub pagination: PageSummary,
}

#[derive(thiserror::Error)]
pub enum ListPostsError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Internal server error")]
    Storage(#[from] StoreError),
}

impl std::fmt::Debug for ListPostsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ListPostsError {
    fn status_code(&self) -> StatusCode {
        match self {
            ListPostsError::Auth(err) => err.status_code(),
            ListPostsError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self))
    }
}

/// Newest posts first, one page at a time. Admins only.
#[tracing::instrument(name = "Listing blog posts", skip(posts, principal))]
pub async fn list_posts(
    posts: &dyn PostStore,
    principal: &Principal,
    pagination: Pagination,
) -> Result<PostPage, ListPostsError> {
    require_admin(principal)?;

    let (page, total) = posts.list_page(pagination).await?;

    Ok(PostPage {
        posts: page,
        pagination: pagination.summary(total),
    })
}
