use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::subscriber_email::SubscriberEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum MailerError {
    #[error("The email API request failed.")]
    Request(#[from] reqwest::Error),
    #[error("The email API answered {0}.")]
    Rejected(String),
}

/// Something able to deliver one HTML email to one recipient.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<(), MailerError>;
}

/// SendGrid v3 `mail/send` client.
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    api_key: Secret<String>,
}

#[derive(serde::Serialize)]
struct SendEmailBody<'a> {
    personalizations: Vec<SendgridPersonalization<'a>>,
    from: SendgridEmail<'a>,
    subject: &'a str,
    content: Vec<SendgridContent<'a>>,
}

#[derive(serde::Serialize)]
struct SendgridEmail<'a> {
    email: &'a str,
}

#[derive(serde::Serialize)]
struct SendgridPersonalization<'a> {
    to: Vec<SendgridEmail<'a>>,
}

#[derive(serde::Serialize)]
struct SendgridContent<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> Result<EmailClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(EmailClient {
            http_client,
            base_url,
            sender,
            api_key,
        })
    }
}

#[async_trait]
impl Mailer for EmailClient {
    #[tracing::instrument(
        name = "Sending an email",
        skip(self, html_content),
        fields(recipient = %recipient)
    )]
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<(), MailerError> {
        let url = format!("{}/mail/send", self.base_url);
        let body = SendEmailBody {
            from: SendgridEmail {
                email: self.sender.as_ref(),
            },
            personalizations: vec![SendgridPersonalization {
                to: vec![SendgridEmail {
                    email: recipient.as_ref(),
                }],
            }],
            subject,
            content: vec![SendgridContent {
                content_type: "text/html",
                value: html_content,
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailerError::Rejected(status.to_string()));
        }

        Ok(())
    }
}
