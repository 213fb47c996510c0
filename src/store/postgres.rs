use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::admin_user::AdminUser;
use crate::domain::blog_post::{BlogPost, PostAuthor};
use crate::domain::new_blog_post::NewBlogPost;
use crate::domain::pagination::Pagination;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::store::{PostStore, StoreError, SubscriberStore, UserStore};

const BLOG_POST_COLUMNS: &str = r#"
    p.id, p.title, p.slug, p.excerpt, p.content, p.featured_image, p.category,
    p.tags, p.is_published, p.published_at, p.created_at,
    u.id AS author_id, u.first_name AS author_first_name,
    u.last_name AS author_last_name, u.email AS author_email
"#;

#[derive(Clone)]
pub struct PgStore {
    db_pool: PgPool,
}

impl PgStore {
    pub fn new(db_pool: PgPool) -> PgStore {
        Self { db_pool }
    }
}

fn blog_post_from_row(row: PgRow) -> Result<BlogPost, sqlx::Error> {
    Ok(BlogPost {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        featured_image: row.try_get("featured_image")?,
        category: row.try_get("category")?,
        tags: row.try_get("tags")?,
        is_published: row.try_get("is_published")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        author: PostAuthor {
            id: row.try_get("author_id")?,
            first_name: row.try_get("author_first_name")?,
            last_name: row.try_get("author_last_name")?,
            email: row.try_get("author_email")?,
        },
    })
}

#[async_trait]
impl PostStore for PgStore {
    #[tracing::instrument(name = "Fetching a blog post by slug", skip(self))]
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        let query = format!(
            r#"
            SELECT {BLOG_POST_COLUMNS}
            FROM blog_posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.slug = $1
            "#
        );

        let post = sqlx::query(&query)
            .bind(slug)
            .try_map(blog_post_from_row)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(post)
    }

    #[tracing::instrument(
        name = "Inserting a new blog post into the database",
        skip(self, post),
        fields(slug = %post.slug)
    )]
    async fn create(
        &self,
        post: &NewBlogPost,
        author_id: Uuid,
        published_at: DateTime<Utc>,
    ) -> Result<BlogPost, StoreError> {
        let query = format!(
            r#"
            WITH p AS (
                INSERT INTO blog_posts (
                    id, title, slug, excerpt, content, featured_image, category,
                    tags, is_published, published_at, created_at, author_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, $9, $10)
                RETURNING *
            )
            SELECT {BLOG_POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.author_id
            "#
        );

        let created = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(post.title.as_ref())
            .bind(post.slug.as_ref())
            .bind(post.excerpt.as_deref())
            .bind(post.content.as_ref())
            .bind(post.featured_image.as_deref())
            .bind(post.category.as_deref())
            .bind(post.tags.as_ref().to_vec())
            .bind(published_at)
            .bind(author_id)
            .try_map(blog_post_from_row)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|err| {
                tracing::error!("Failed to execute query: {:?}", err);
                err
            })?;

        Ok(created)
    }

    #[tracing::instrument(name = "Fetching a page of blog posts", skip(self))]
    async fn list_page(&self, pagination: Pagination) -> Result<(Vec<BlogPost>, i64), StoreError> {
        let query = format!(
            r#"
            SELECT {BLOG_POST_COLUMNS}
            FROM blog_posts p
            JOIN users u ON u.id = p.author_id
            ORDER BY p.created_at DESC
            OFFSET $1
            LIMIT $2
            "#
        );

        let page = sqlx::query(&query)
            .bind(pagination.offset())
            .bind(pagination.limit)
            .try_map(blog_post_from_row)
            .fetch_all(&self.db_pool);
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blog_posts").fetch_one(&self.db_pool);

        let (posts, total) = tokio::try_join!(page, total)?;

        Ok((posts, total))
    }
}

#[async_trait]
impl SubscriberStore for PgStore {
    #[tracing::instrument(name = "Fetching active newsletter subscribers", skip(self))]
    async fn list_active(&self) -> Result<Vec<Subscriber>, StoreError> {
        let emails: Vec<String> = sqlx::query(
            r#"
            SELECT email
            FROM newsletter_subscriptions
            WHERE is_active = TRUE
            "#,
        )
        .try_map(|row: PgRow| row.try_get("email"))
        .fetch_all(&self.db_pool)
        .await?;

        let subscribers = emails
            .into_iter()
            .filter_map(|email| match SubscriberEmail::parse(email) {
                Ok(email) => Some(Subscriber {
                    email,
                    is_active: true,
                }),
                Err(err) => {
                    tracing::warn!("Skipping an active subscriber with an invalid email: {}", err);
                    None
                }
            })
            .collect();

        Ok(subscribers)
    }
}

#[async_trait]
impl UserStore for PgStore {
    #[tracing::instrument(name = "Fetching admin users", skip(self))]
    async fn list_admins(&self) -> Result<Vec<AdminUser>, StoreError> {
        let users = sqlx::query(
            r#"
            SELECT id, first_name, last_name, email
            FROM users
            WHERE role = 'ADMIN'
            "#,
        )
        .try_map(|row: PgRow| {
            Ok(AdminUser {
                id: row.try_get("id")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                email: row.try_get("email")?,
            })
        })
        .fetch_all(&self.db_pool)
        .await?;

        Ok(users)
    }
}
