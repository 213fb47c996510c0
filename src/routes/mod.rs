mod admin_blogs;
mod admin_users;
mod blog_posts;
mod health_check;

pub use admin_blogs::{create_blog_post, list_blog_posts};
pub use admin_users::list_admin_users;
pub use blog_posts::get_published_posts;
pub use health_check::health_check;

/// JSON body of every error response: `{"error": "<message>"}`.
#[derive(serde::Serialize)]
pub struct ErrorBody {
    error: String,
}

impl ErrorBody {
    pub fn new(error: &impl std::fmt::Display) -> ErrorBody {
        Self {
            error: error.to_string(),
        }
    }
}

/// Writes an error followed by its chain of sources.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
