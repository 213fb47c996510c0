use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::authentication::{authenticate, require_admin};
use crate::domain::blog_post::BlogPost;
use crate::domain::new_blog_post::NewBlogPostBody;
use crate::domain::pagination::{Pagination, PaginationParams};
use crate::listing::{list_posts, ListPostsError};
use crate::publish::PublishError;
use crate::startup::AppContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    success: bool,
    blog_post: BlogPost,
    message: &'static str,
}

/// `POST /admin/blogs`. The body is read as raw bytes and only parsed once the
/// caller is known to be an admin.
#[tracing::instrument(name = "Create blog post handler", skip(request, body, context))]
pub async fn create_blog_post(
    request: HttpRequest,
    body: web::Bytes,
    context: web::Data<AppContext>,
) -> Result<HttpResponse, PublishError> {
    let principal = authenticate(&request, context.authenticator.as_ref())?;
    require_admin(&principal)?;

    let draft: NewBlogPostBody = serde_json::from_slice(&body).map_err(|err| {
        tracing::info!("Rejected a malformed body: {}", err);
        PublishError::InvalidInput(String::from("Request body must be a JSON object"))
    })?;

    let blog_post = context
        .publish_workflow()
        .publish(draft, &principal)
        .await?;

    Ok(HttpResponse::Ok().json(PublishResponse {
        success: true,
        blog_post,
        message: "Blog post created successfully",
    }))
}

/// `GET /admin/blogs?page&limit`.
#[tracing::instrument(name = "List blog posts handler", skip(request, query, context))]
pub async fn list_blog_posts(
    request: HttpRequest,
    query: web::Query<PaginationParams>,
    context: web::Data<AppContext>,
) -> Result<HttpResponse, ListPostsError> {
    let principal = authenticate(&request, context.authenticator.as_ref())?;
    let pagination = Pagination::from(query.into_inner());

    let page = list_posts(context.posts.as_ref(), &principal, pagination).await?;

    Ok(HttpResponse::Ok().json(page))
}
