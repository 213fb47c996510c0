use crate::domain::subscriber_email::SubscriberEmail;

/// A newsletter subscription as seen by the publish workflow. Never mutated here.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub email: SubscriberEmail,
    pub is_active: bool,
}
