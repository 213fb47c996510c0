use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::admin_user::AdminUser;
use crate::domain::blog_post::{BlogPost, PostAuthor};
use crate::domain::new_blog_post::NewBlogPost;
use crate::domain::pagination::Pagination;
use crate::domain::subscriber::Subscriber;
use crate::store::{PostStore, StoreError, SubscriberStore, UserStore};

const ADMIN_ROLE: &str = "ADMIN";

#[derive(Debug, Clone)]
struct StoredUser {
    user: AdminUser,
    role: String,
}

#[derive(Default)]
struct State {
    users: Vec<StoredUser>,
    posts: Vec<BlogPost>,
    subscribers: Vec<Subscriber>,
}

/// Process-local store. Slug uniqueness is checked and the post inserted
/// under the same lock, the way a unique index behaves in Postgres.
///
/// Every trait call is counted, which lets tests assert that rejected requests
/// never reached the store.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        Self::default()
    }

    pub fn add_user(&self, user: AdminUser, role: &str) -> Result<(), StoreError> {
        self.lock()?.users.push(StoredUser {
            user,
            role: role.to_string(),
        });
        Ok(())
    }

    pub fn add_subscriber(&self, subscriber: Subscriber) -> Result<(), StoreError> {
        self.lock()?.subscribers.push(subscriber);
        Ok(())
    }

    /// Snapshot of every stored post, in insertion order.
    pub fn posts(&self) -> Result<Vec<BlogPost>, StoreError> {
        Ok(self.lock()?.posts.clone())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend(String::from("in-memory store lock is poisoned")))
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        self.record_call();
        let state = self.lock()?;

        Ok(state.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn create(
        &self,
        post: &NewBlogPost,
        author_id: Uuid,
        published_at: DateTime<Utc>,
    ) -> Result<BlogPost, StoreError> {
        self.record_call();
        let mut state = self.lock()?;

        if state.posts.iter().any(|p| p.slug == post.slug.as_ref()) {
            return Err(StoreError::Conflict {
                constraint: String::from("blog_posts_slug_key"),
            });
        }

        let author = state
            .users
            .iter()
            .find(|stored| stored.user.id == author_id)
            .map(|stored| PostAuthor {
                id: stored.user.id,
                first_name: stored.user.first_name.clone(),
                last_name: stored.user.last_name.clone(),
                email: stored.user.email.clone(),
            })
            .ok_or_else(|| StoreError::Backend(format!("author {} does not exist", author_id)))?;

        let created = BlogPost {
            id: Uuid::new_v4(),
            title: post.title.as_ref().to_string(),
            slug: post.slug.as_ref().to_string(),
            excerpt: post.excerpt.clone(),
            content: post.content.as_ref().to_string(),
            featured_image: post.featured_image.clone(),
            category: post.category.clone(),
            tags: post.tags.as_ref().to_vec(),
            is_published: true,
            published_at: Some(published_at),
            created_at: published_at,
            author,
        };
        state.posts.push(created.clone());

        Ok(created)
    }

    async fn list_page(&self, pagination: Pagination) -> Result<(Vec<BlogPost>, i64), StoreError> {
        self.record_call();
        let state = self.lock()?;

        // Later insertions win ties on created_at.
        let mut posts: Vec<BlogPost> = state.posts.iter().rev().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = posts.len() as i64;
        let page = posts
            .into_iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(pagination.limit).unwrap_or(0))
            .collect();

        Ok((page, total))
    }
}

#[async_trait]
impl SubscriberStore for InMemoryStore {
    async fn list_active(&self) -> Result<Vec<Subscriber>, StoreError> {
        self.record_call();
        let state = self.lock()?;

        Ok(state
            .subscribers
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn list_admins(&self) -> Result<Vec<AdminUser>, StoreError> {
        self.record_call();
        let state = self.lock()?;

        Ok(state
            .users
            .iter()
            .filter(|stored| stored.role == ADMIN_ROLE)
            .map(|stored| stored.user.clone())
            .collect())
    }
}
