use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::authentication::{Authenticator, JwtAuthenticator};
use crate::config::{DatabaseSettings, Settings};
use crate::email_client::EmailClient;
use crate::notification::{BroadcastDispatcher, NotificationDispatcher};
use crate::publish::PublishWorkflow;
use crate::routes::{
    create_blog_post, get_published_posts, health_check, list_admin_users, list_blog_posts,
};
use crate::store::{PgStore, PostStore, UserStore};

/// Rich text bodies can carry inline images, so the default 256KiB is too small.
const MAX_PAYLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Everything a request handler may depend on.
pub struct AppContext {
    pub posts: Arc<dyn PostStore>,
    pub users: Arc<dyn UserStore>,
    pub authenticator: Arc<dyn Authenticator>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
}

impl AppContext {
    pub fn publish_workflow(&self) -> PublishWorkflow {
        PublishWorkflow::new(Arc::clone(&self.posts), Arc::clone(&self.dispatcher))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("Sender email is not valid: {0}")]
    InvalidSender(String),
    #[error("Failed to build the email client.")]
    EmailClient(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, StartupError> {
        let store = Arc::new(PgStore::new(get_connection_db_pool(&config.database)));
        let sender_email = config
            .email_client
            .get_sender_email()
            .map_err(StartupError::InvalidSender)?;
        let email_client = EmailClient::new(
            config.email_client.base_url.clone(),
            sender_email,
            config.email_client.api_key.clone(),
            Some(config.email_client.get_timeout()),
        )?;
        let dispatcher = BroadcastDispatcher::new(
            store.clone(),
            Arc::new(email_client),
            config.get_dispatch_settings(),
        );
        let context = AppContext {
            posts: store.clone(),
            users: store,
            authenticator: Arc::new(JwtAuthenticator::new(&config.authentication.jwt_secret)),
            dispatcher: Arc::new(dispatcher),
        };

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener, context)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(listener: TcpListener, context: AppContext) -> Result<Server, std::io::Error> {
    let context = web::Data::new(context);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .route("/health_check", web::get().to(health_check))
            .route("/admin/blogs", web::post().to(create_blog_post))
            .route("/admin/blogs", web::get().to(list_blog_posts))
            .route("/admin/users", web::get().to(list_admin_users))
            .route("/blog/posts", web::get().to(get_published_posts))
            .app_data(context.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}

/// Applies the migrations under `migrations/`.
pub async fn run_migrations(db_pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(db_pool).await
}
