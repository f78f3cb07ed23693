//! TelegramClient - Bot API binding for the chat transport ports.
//!
//! Long-polls `getUpdates` for inbound events and renders prompts as
//! messages with a single-row inline keyboard.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use scanbot_core::chat::{
    ChatId, ChatTransport, EventKind, EventSource, InboundEvent, Prompt, PromptHandle, UserId,
};
use scanbot_core::error::{Result, ScanBotError};
use scanbot_core::scanner::DocumentStream;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::io::ReaderStream;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

// Extra headroom on top of the long-poll timeout before a JSON call gives up.
const DEFAULT_REQUEST_HEADROOM: Duration = Duration::from_secs(60);

/// Upper bound for a single `sendDocument` upload.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Telegram Bot API client implementing [`ChatTransport`] and [`EventSource`].
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
    poll_timeout: Duration,
    request_headroom: Duration,
    upload_timeout: Duration,
    offset: Mutex<i64>,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, poll_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|err| {
                ScanBotError::config(format!("Failed to build Telegram client: {}", err.without_url()))
            })?;

        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            poll_timeout,
            request_headroom: DEFAULT_REQUEST_HEADROOM,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            offset: Mutex::new(0),
        })
    }

    /// Points the client at a different Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Time a JSON call may take beyond the long-poll timeout.
    pub fn with_request_headroom(mut self, headroom: Duration) -> Self {
        self.request_headroom = headroom;
        self
    }

    /// Time a document upload may take, independent of the polling timeout.
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Returns the bot's username, confirming the token is valid.
    pub async fn get_me(&self) -> Result<String> {
        let me: BotUser = self.call("getMe", &json!({})).await?;
        Ok(me.username.unwrap_or_else(|| me.id.to_string()))
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(self.poll_timeout + self.request_headroom)
            .json(body)
            .send()
            .await
            // The URL carries the bot token.
            .map_err(|err| {
                ScanBotError::transport(format!("{method} failed: {}", err.without_url()))
            })?;
        parse_response(method, response).await
    }

    async fn call_multipart<T: DeserializeOwned>(&self, method: &str, form: Form) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                ScanBotError::transport(format!("{method} failed: {}", err.without_url()))
            })?;
        parse_response(method, response).await
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_prompt(&self, chat_id: ChatId, prompt: &Prompt) -> Result<PromptHandle> {
        let message: Message = self
            .call(
                "sendMessage",
                &json!({
                    "chat_id": chat_id.0,
                    "text": prompt.text,
                    "reply_markup": inline_keyboard(prompt),
                }),
            )
            .await?;
        Ok(PromptHandle(message.message_id))
    }

    async fn edit_prompt(
        &self,
        chat_id: ChatId,
        handle: PromptHandle,
        prompt: &Prompt,
    ) -> Result<()> {
        let edited: Result<Value> = self
            .call(
                "editMessageText",
                &json!({
                    "chat_id": chat_id.0,
                    "message_id": handle.0,
                    "text": prompt.text,
                    "reply_markup": inline_keyboard(prompt),
                }),
            )
            .await;

        match edited {
            Ok(_) => Ok(()),
            Err(ScanBotError::Transport(message)) if message.contains("message is not modified") => {
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn delete_prompt(&self, chat_id: ChatId, handle: PromptHandle) -> Result<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                &json!({ "chat_id": chat_id.0, "message_id": handle.0 }),
            )
            .await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        document: DocumentStream,
        file_name: &str,
    ) -> Result<()> {
        let part = Part::stream(Body::wrap_stream(ReaderStream::new(document)))
            .file_name(file_name.to_string());
        let form = Form::new()
            .text("chat_id", chat_id.0.to_string())
            .part("document", part);

        tracing::info!("[Telegram] Sending {} to chat {}", file_name, chat_id);
        let _: Message = self.call_multipart("sendDocument", form).await?;
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str, text: &str) -> Result<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({ "callback_query_id": callback_id, "text": text }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventSource for TelegramClient {
    async fn next_events(&self) -> Result<Vec<InboundEvent>> {
        let mut offset = self.offset.lock().await;
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &json!({
                    "offset": *offset,
                    "timeout": self.poll_timeout.as_secs(),
                    "allowed_updates": ["message", "callback_query"],
                }),
            )
            .await?;

        if let Some(last) = updates.iter().map(|update| update.update_id).max() {
            *offset = last + 1;
        }

        Ok(updates.into_iter().filter_map(Update::into_event).collect())
    }
}

fn inline_keyboard(prompt: &Prompt) -> Value {
    let row: Vec<Value> = prompt
        .labels()
        .into_iter()
        .map(|label| json!({ "text": label, "callback_data": label }))
        .collect();
    let rows: Vec<Vec<Value>> = if row.is_empty() { Vec::new() } else { vec![row] };
    json!({ "inline_keyboard": rows })
}

async fn parse_response<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await.map_err(|err| {
        ScanBotError::transport(format!("{method}: failed to read response: {}", err.without_url()))
    })?;

    let parsed: ApiResponse<T> = serde_json::from_slice(&body).map_err(|err| {
        ScanBotError::transport(format!("{method}: undecodable response ({status}): {err}"))
    })?;

    match (parsed.ok, parsed.result) {
        (true, Some(result)) => Ok(result),
        _ => Err(ScanBotError::transport(format!(
            "{method} rejected ({}): {}",
            parsed.error_code.unwrap_or(i64::from(status.as_u16())),
            parsed.description.unwrap_or_else(|| "no description".to_string())
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    id: i64,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
    #[serde(default)]
    from: Option<BotUser>,
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    from: BotUser,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    callback_query: Option<CallbackQuery>,
}

impl Update {
    fn into_event(self) -> Option<InboundEvent> {
        if let Some(message) = self.message {
            let from = message.from?;
            return Some(InboundEvent {
                user_id: UserId(from.id),
                chat_id: ChatId(message.chat.id),
                kind: EventKind::Message {
                    text: message.text.unwrap_or_default(),
                },
            });
        }

        let query = self.callback_query?;
        let chat = query.message?.chat;
        Some(InboundEvent {
            user_id: UserId(query.from.id),
            chat_id: ChatId(chat.id),
            kind: EventKind::Callback {
                id: query.id,
                data: query.data.unwrap_or_default(),
            },
        })
    }
}
