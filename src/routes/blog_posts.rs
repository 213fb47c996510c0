use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::domain::blog_post::BlogPost;
use crate::routes::{error_chain_fmt, ErrorBody};
use crate::startup::AppContext;
use crate::store::StoreError;

#[derive(Deserialize, Debug)]
pub struct Parameters {
    pub slug: Option<String>,
}

#[derive(Serialize)]
struct PostsResponse {
    posts: Vec<BlogPost>,
}

#[derive(thiserror::Error)]
pub enum PublicPostError {
    #[error("A slug is required")]
    MissingSlug,
    #[error("Internal server error")]
    Storage(#[from] StoreError),
}

impl std::fmt::Debug for PublicPostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for PublicPostError {
    fn status_code(&self) -> StatusCode {
        match self {
            PublicPostError::MissingSlug => StatusCode::BAD_REQUEST,
            PublicPostError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self))
    }
}

/// `GET /blog/posts?slug=`: what the public post page reads. Answers with an
/// empty list when no published post has the slug.
#[tracing::instrument(name = "Get published post handler", skip(context))]
pub async fn get_published_posts(
    parameters: web::Query<Parameters>,
    context: web::Data<AppContext>,
) -> Result<HttpResponse, PublicPostError> {
    let slug = parameters
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|slug| !slug.is_empty())
        .ok_or(PublicPostError::MissingSlug)?;

    let posts = context
        .posts
        .find_by_slug(slug)
        .await?
        .into_iter()
        .filter(|post| post.is_published)
        .collect();

    Ok(HttpResponse::Ok().json(PostsResponse { posts }))
}
