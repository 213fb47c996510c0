//! Run with `cargo test -- --ignored` against the Postgres described in
//! `config/`.

use brokerage_blog::config::{get_configuration, DatabaseSettings};
use brokerage_blog::domain::new_blog_post::{NewBlogPost, NewBlogPostBody};
use brokerage_blog::domain::pagination::Pagination;
use brokerage_blog::startup::{get_connection_db_pool, run_migrations};
use brokerage_blog::store::{PgStore, PostStore, SubscriberStore, UserStore};
use chrono::Utc;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

async fn configure_db(db_config: &mut DatabaseSettings) -> PgPool {
    let db_test_name = format!("db_{}", Uuid::new_v4().to_string().replace('-', "_"));
    let mut connection = PgConnection::connect_with(&db_config.get_server_options())
        .await
        .expect("Failed to connect to Postgres.");

    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, db_test_name))
        .await
        .expect("Failed to create database.");

    db_config.set_name(db_test_name);
    let db_pool = get_connection_db_pool(db_config);

    run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations.");

    db_pool
}

async fn seed_author(db_pool: &PgPool, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, email, first_name, last_name, role)
        VALUES ($1, $2, 'Riley', 'Shaw', $3)
        "#,
    )
    .bind(id)
    .bind(format!("{}@example.com", id))
    .bind(role)
    .execute(db_pool)
    .await
    .expect("Failed to seed a user.");
    id
}

fn draft(title: &str) -> NewBlogPost {
    NewBlogPost::try_from(NewBlogPostBody {
        title: Some(title.to_string()),
        content: Some(String::from("<p>Body</p>")),
        tags: Some(serde_json::json!("condo, downtown")),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn created_posts_are_found_by_slug_with_their_author() {
    let mut config = get_configuration().expect("Missing configuration file.");
    let db_pool = configure_db(&mut config.database).await;
    let author_id = seed_author(&db_pool, "ADMIN").await;
    let store = PgStore::new(db_pool);

    let created = store
        .create(&draft("Downtown Condos"), author_id, Utc::now())
        .await
        .unwrap();
    let found = store.find_by_slug("downtown-condos").await.unwrap();

    assert_eq!(found.as_ref(), Some(&created));
    assert_eq!(created.tags, ["condo", "downtown"]);
    assert_eq!(created.author.first_name.as_deref(), Some("Riley"));
    assert!(created.is_published);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn unique_slug_constraint_settles_concurrent_inserts() {
    let mut config = get_configuration().expect("Missing configuration file.");
    let db_pool = configure_db(&mut config.database).await;
    let author_id = seed_author(&db_pool, "ADMIN").await;
    let store = PgStore::new(db_pool);
    let post = draft("Twin Listing");

    let (first, second) = tokio::join!(
        store.create(&post, author_id, Utc::now()),
        store.create(&post, author_id, Utc::now())
    );

    let conflicts = [&first, &second]
        .iter()
        .filter(|outcome| matches!(outcome, Err(err) if err.is_conflict()))
        .count();
    assert_eq!(conflicts, 1);
    assert!(first.is_ok() || second.is_ok());

    let (_, total) = store.list_page(Pagination::default()).await.unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn only_active_subscribers_and_admin_users_are_listed() {
    let mut config = get_configuration().expect("Missing configuration file.");
    let db_pool = configure_db(&mut config.database).await;
    let admin_id = seed_author(&db_pool, "ADMIN").await;
    seed_author(&db_pool, "USER").await;
    for (email, is_active) in [("on@example.com", true), ("off@example.com", false)] {
        sqlx::query(
            "INSERT INTO newsletter_subscriptions (id, email, is_active) VALUES ($1, $2, $3)",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(is_active)
        .execute(&db_pool)
        .await
        .expect("Failed to seed a subscriber.");
    }
    let store = PgStore::new(db_pool);

    let subscribers = store.list_active().await.unwrap();
    let admins = store.list_admins().await.unwrap();

    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].email.as_ref(), "on@example.com");
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].id, admin_id);
}
