//! Newsletter fan-out triggered by a successful publish.
//!
//! Every active subscriber gets exactly one attempt. Failures end up in the
//! logs, never back at the publisher.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::domain::blog_post::BlogPost;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::{Mailer, MailerError};
use crate::store::{StoreError, SubscriberStore};

const EXCERPT_FALLBACK: &str = "Read our latest blog post!";

/// Receives every freshly published post. Implementations must not block the
/// caller on delivery.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, post: BlogPost);
}

/// The email announcing one post. Every subscriber receives the same one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub html: String,
}

impl Notification {
    pub fn for_post(post: &BlogPost, base_url: &str) -> Notification {
        Self {
            subject: format!("New Blog Post: {}", post.title),
            html: Self::html_for(post, base_url),
        }
    }

    fn html_for(post: &BlogPost, base_url: &str) -> String {
        let base_url = base_url.trim_end_matches('/');
        let post_url = format!("{}/blog/{}", base_url, post.slug);
        let unsubscribe_url = format!("{}/newsletter/unsubscribe", base_url);
        let excerpt = post.excerpt.as_deref().unwrap_or(EXCERPT_FALLBACK);

        format!(
            r#"<h1>{}</h1>
<p>{}</p>
<a href="{}">Read More</a>
<p>You received this email because you subscribed to our newsletter.</p>
<p>To unsubscribe, please visit: <a href="{}">Unsubscribe</a></p>"#,
            escape_html(&post.title),
            escape_html(excerpt),
            post_url,
            unsubscribe_url
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[derive(thiserror::Error, Debug)]
pub enum DeliveryFailure {
    #[error("Failed to fetch the active subscribers.")]
    Subscribers(#[source] StoreError),
    #[error("Failed to send the notification to {recipient}.")]
    Send {
        recipient: SubscriberEmail,
        #[source]
        source: MailerError,
    },
    #[error("Sending the notification to {recipient} timed out.")]
    TimedOut { recipient: SubscriberEmail },
}

/// Outcome of one fan-out, for logs only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Sends still queued or in flight when the overall budget ran out.
    pub abandoned: usize,
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub base_url: String,
    pub send_timeout: Duration,
    pub overall_budget: Duration,
    pub max_concurrency: usize,
}

/// Emails every active subscriber directly, without a queue.
#[derive(Clone)]
pub struct BroadcastDispatcher {
    subscribers: Arc<dyn SubscriberStore>,
    mailer: Arc<dyn Mailer>,
    settings: DispatchSettings,
}

impl BroadcastDispatcher {
    pub fn new(
        subscribers: Arc<dyn SubscriberStore>,
        mailer: Arc<dyn Mailer>,
        settings: DispatchSettings,
    ) -> BroadcastDispatcher {
        Self {
            subscribers,
            mailer,
            settings,
        }
    }

    /// Runs the whole fan-out for `post` and reports what happened.
    pub async fn deliver(&self, post: &BlogPost) -> DeliveryReport {
        let subscribers = match self.subscribers.list_active().await {
            Ok(subscribers) => subscribers,
            Err(err) => {
                let failure = DeliveryFailure::Subscribers(err);
                tracing::error!(error.cause_chain = ?failure, "{}", failure);
                return DeliveryReport::default();
            }
        };

        let report = self.send_all(post, subscribers).await;

        if report.failed + report.abandoned > 0 {
            tracing::warn!(
                recipients = report.recipients,
                delivered = report.delivered,
                failed = report.failed,
                abandoned = report.abandoned,
                "Newsletter notification delivered partially"
            );
        } else {
            tracing::info!(
                recipients = report.recipients,
                delivered = report.delivered,
                "Newsletter notification delivered"
            );
        }

        report
    }

    async fn send_all(&self, post: &BlogPost, subscribers: Vec<Subscriber>) -> DeliveryReport {
        let permits = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let notification = Arc::new(Notification::for_post(post, &self.settings.base_url));
        let mut sends = JoinSet::new();

        for subscriber in subscribers {
            let permits = Arc::clone(&permits);
            let mailer = Arc::clone(&self.mailer);
            let notification = Arc::clone(&notification);
            let send_timeout = self.settings.send_timeout;

            sends.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let recipient = subscriber.email;
                let send =
                    mailer.send_email(&recipient, &notification.subject, &notification.html);
                let outcome = tokio::time::timeout(send_timeout, send).await;

                match outcome {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(source)) => Err(DeliveryFailure::Send { recipient, source }),
                    Err(_) => Err(DeliveryFailure::TimedOut { recipient }),
                }
            });
        }

        let mut report = DeliveryReport {
            recipients: sends.len(),
            ..DeliveryReport::default()
        };
        let deadline = tokio::time::Instant::now() + self.settings.overall_budget;

        loop {
            let next = tokio::time::timeout_at(deadline, sends.join_next()).await;
            match next {
                Ok(None) => break,
                Ok(Some(Ok(Ok(())))) => report.delivered += 1,
                Ok(Some(Ok(Err(failure)))) => {
                    report.failed += 1;
                    tracing::error!(error.cause_chain = ?failure, "{}", failure);
                }
                Ok(Some(Err(join_error))) => {
                    report.failed += 1;
                    tracing::error!("A notification task did not complete: {}", join_error);
                }
                Err(_) => {
                    report.abandoned = sends.len();
                    sends.abort_all();
                    break;
                }
            }
        }

        report
    }
}

impl NotificationDispatcher for BroadcastDispatcher {
    fn dispatch(&self, post: BlogPost) {
        let dispatcher = self.clone();
        let span = tracing::info_span!("Notifying newsletter subscribers", slug = %post.slug);

        tokio::spawn(
            async move {
                dispatcher.deliver(&post).await;
            }
            .instrument(span),
        );
    }
}
