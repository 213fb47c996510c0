use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;

use crate::authentication::{authenticate, require_admin, AuthError};
use crate::domain::admin_user::AdminUser;
use crate::routes::{error_chain_fmt, ErrorBody};
use crate::startup::AppContext;
use crate::store::StoreError;

#[derive(Serialize)]
struct AdminUsersResponse {
    users: Vec<AdminUser>,
}

#[derive(thiserror::Error)]
pub enum ListUsersError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Internal server error")]
    Storage(#[from] StoreError),
}

impl std::fmt::Debug for ListUsersError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ListUsersError {
    fn status_code(&self) -> StatusCode {
        match self {
            ListUsersError::Auth(err) => err.status_code(),
            ListUsersError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self))
    }
}

/// `GET /admin/users`: users holding the admin role.
#[tracing::instrument(name = "List admin users handler", skip(request, context))]
pub async fn list_admin_users(
    request: HttpRequest,
    context: web::Data<AppContext>,
) -> Result<HttpResponse, ListUsersError> {
    let principal = authenticate(&request, context.authenticator.as_ref())?;
    require_admin(&principal)?;

    let users = context.users.list_admins().await?;

    Ok(HttpResponse::Ok().json(AdminUsersResponse { users }))
}
