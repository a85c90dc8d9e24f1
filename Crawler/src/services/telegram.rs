// src/services/telegram.rs

//! Telegram Bot API client.
//!
//! Only the methods the watcher needs: `getMe`, `sendMessage`,
//! `setMyCommands` and `getUpdates`. Every call is a JSON `POST` to
//! `{api_base}/bot{token}/{method}`; the API answers with an envelope of the
//! form `{"ok": bool, "result": ..., "description": ...}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Credentials, TelegramConfig};
use crate::services::{BotApi, Notifier};

/// Response envelope shared by every Bot API method.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

/// An incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

/// A chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The bot's own account, from `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// A command shown in the client's command menu.
#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

impl BotCommand {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_parameters: Option<ReplyParameters>,
}

#[derive(Serialize)]
struct ReplyParameters {
    message_id: i64,
    allow_sending_without_reply: bool,
}

#[derive(Serialize)]
struct SetMyCommands<'a> {
    commands: &'a [BotCommand],
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

/// Client for the Telegram Bot HTTP API.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    endpoint: String,
    parse_mode: Option<String>,
}

impl TelegramClient {
    /// Create a client for the bot identified by `credentials`.
    pub fn new(config: &TelegramConfig, credentials: &Credentials) -> Result<Self> {
        // Long polls hold the connection open, so no global request timeout.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(config, credentials, client))
    }

    /// Create a client sharing an existing HTTP client.
    pub fn with_client(config: &TelegramConfig, credentials: &Credentials, client: Client) -> Self {
        let parse_mode = Some(config.parse_mode.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        Self {
            client,
            endpoint: format!(
                "{}/bot{}",
                config.api_base.trim_end_matches('/'),
                credentials.bot_token
            ),
            parse_mode,
        }
    }

    /// Fetch the bot's own account.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::Map::new(), None).await
    }

    /// Send `text` to `chat_id`, optionally as a reply to a message.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        let params = SendMessage {
            chat_id,
            text,
            parse_mode: self.parse_mode.as_deref(),
            reply_parameters: reply_to.map(|message_id| ReplyParameters {
                message_id,
                allow_sending_without_reply: true,
            }),
        };
        self.call("sendMessage", &params, None).await
    }

    /// Replace the bot's command menu.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let _: bool = self
            .call("setMyCommands", &SetMyCommands { commands }, None)
            .await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let params = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        };
        let deadline = Duration::from_secs(timeout_secs + 10);
        self.call("getUpdates", &params, Some(deadline)).await
    }

    async fn call<P, R>(&self, method: &str, params: &P, timeout: Option<Duration>) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, method);
        let mut request = self.client.post(&url).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // reqwest errors embed the URL, which carries the bot token.
        let response = request.send().await.map_err(|e| e.without_url())?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| e.without_url())?;

        decode_response(method, status, &body)
    }
}

fn decode_response<R: DeserializeOwned>(
    method: &str,
    status: reqwest::StatusCode,
    body: &[u8],
) -> Result<R> {
    let envelope: ApiResponse<R> = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(AppError::telegram(method, format!("HTTP {status}")));
        }
        Err(e) => return Err(AppError::Json(e)),
    };

    if !envelope.ok {
        let message = envelope
            .description
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(AppError::telegram(method, message));
    }

    envelope
        .result
        .ok_or_else(|| AppError::telegram(method, "response has no result"))
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<()> {
        self.send_message(chat_id, text, None).await?;
        Ok(())
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn poll(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        self.get_updates(offset, timeout_secs).await
    }

    async fn reply(&self, message: &Message, text: &str) -> Result<()> {
        let chat_id = message.chat.id.to_string();
        self.send_message(&chat_id, text, Some(message.message_id))
            .await?;
        Ok(())
    }
}
