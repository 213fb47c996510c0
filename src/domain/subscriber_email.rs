use validator::validate_email;

/// An email address that passed syntactic validation. Used both for newsletter
/// recipients and for the configured sender address.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: impl Into<String>) -> Result<SubscriberEmail, String> {
        let email = email.into();

        if !validate_email(&email) {
            return Err(format!("{} is not a valid email address", email));
        }

        Ok(Self(email))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
