use crate::config::WhatsAppSettings;
use async_trait::async_trait;
use log::{error, info};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("messaging transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("messaging provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers a one-time code to a phone number. `context_name` names the
/// counterparty so the recipient knows who the code is shared with.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_code(
        &self,
        phone_number: &str,
        code: &str,
        context_name: &str,
    ) -> Result<(), MessagingError>;
}

// WhatsApp Cloud API request structures
#[derive(Debug, Serialize)]
struct TemplateMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    template: Template<'a>,
}

#[derive(Debug, Serialize)]
struct Template<'a> {
    name: &'a str,
    language: Language<'a>,
    components: Vec<Component<'a>>,
}

#[derive(Debug, Serialize)]
struct Language<'a> {
    code: &'a str,
}

#[derive(Debug, Serialize)]
struct Component<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<&'static str>,
    parameters: Vec<TextParameter<'a>>,
}

#[derive(Debug, Serialize)]
struct TextParameter<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

impl<'a> TextParameter<'a> {
    fn text(text: &'a str) -> Self {
        TextParameter { kind: "text", text }
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

fn code_template<'a>(
    settings: &'a WhatsAppSettings,
    phone_number: &'a str,
    code: &'a str,
    context_name: &'a str,
) -> TemplateMessage<'a> {
    TemplateMessage {
        messaging_product: "whatsapp",
        to: phone_number,
        kind: "template",
        template: Template {
            name: &settings.template,
            language: Language {
                code: &settings.language,
            },
            components: vec![
                Component {
                    kind: "body",
                    sub_type: None,
                    index: None,
                    parameters: vec![TextParameter::text(code), TextParameter::text(context_name)],
                },
                // copy-code button
                Component {
                    kind: "button",
                    sub_type: Some("url"),
                    index: Some("0"),
                    parameters: vec![TextParameter::text(code)],
                },
            ],
        },
    }
}

// WhatsApp Cloud API client
#[derive(Clone)]
pub struct WhatsAppClient {
    client: Client,
    settings: WhatsAppSettings,
}

impl WhatsAppClient {
    pub fn new(settings: WhatsAppSettings) -> Result<Self, MessagingError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(WhatsAppClient { client, settings })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.phone_number_id
        )
    }
}

#[async_trait]
impl Messenger for WhatsAppClient {
    async fn send_code(
        &self,
        phone_number: &str,
        code: &str,
        context_name: &str,
    ) -> Result<(), MessagingError> {
        let message = code_template(&self.settings, phone_number, code, context_name);

        let response = self
            .client
            .post(self.messages_url())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.settings.access_token),
            )
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                "WhatsApp message to {} rejected with status {}: {}",
                phone_number, status, body
            );
            return Err(MessagingError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendMessageResponse = response.json().await?;
        let ids: Vec<&str> = sent.messages.iter().map(|m| m.id.as_str()).collect();
        info!("WhatsApp message sent to {}: {:?}", phone_number, ids);
        Ok(())
    }
}
