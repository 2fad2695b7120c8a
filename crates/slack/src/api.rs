use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::blocks::ModalView;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SlackApiError {
    #[error("slack {method} failed: {error}")]
    Platform { method: &'static str, error: String },
    #[error("slack {method} request failed: {message}")]
    Transport { method: &'static str, message: String },
    #[error("slack {method} response could not be decoded: {message}")]
    Decode { method: &'static str, message: String },
    #[error("message event carried no trigger_id")]
    MissingTriggerId,
}

impl SlackApiError {
    /// Short reason suitable for echoing back into Slack.
    pub fn reason(&self) -> &str {
        match self {
            Self::Platform { error, .. } => error,
            Self::Transport { message, .. } | Self::Decode { message, .. } => message,
            Self::MissingTriggerId => "missing_trigger_id",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: Option<String>,
}

/// The two Web API methods the bot needs.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError>;
    async fn post_message(&self, channel: &str, text: &str)
        -> Result<PostedMessage, SlackApiError>;
}

#[derive(Serialize)]
struct OpenViewRequest<'a> {
    trigger_id: &'a str,
    view: &'a ModalView,
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
    channel: Option<String>,
    ts: Option<String>,
}

pub struct HttpSlackApi {
    http: reqwest::Client,
    api_base: String,
    bot_token: SecretString,
}

impl HttpSlackApi {
    pub fn new(
        api_base: &str,
        bot_token: SecretString,
        request_timeout: Duration,
    ) -> Result<Self, SlackApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("eventlink/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .map_err(|error| SlackApiError::Transport {
                method: "client.build",
                message: error.to_string(),
            })?;

        Ok(Self { http, api_base: api_base.trim_end_matches('/').to_owned(), bot_token })
    }

    async fn call<B, T>(&self, method: &'static str, body: &B) -> Result<T, SlackApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(method, "calling slack web api");
        let response = self
            .http
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(self.bot_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|error| SlackApiError::Transport { method, message: error.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackApiError::Transport {
                method,
                message: format!("unexpected http status {}", status.as_u16()),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|error| SlackApiError::Decode { method, message: error.to_string() })
    }
}

fn ensure_ok(method: &'static str, response: &SlackResponse) -> Result<(), SlackApiError> {
    if response.ok {
        return Ok(());
    }
    Err(SlackApiError::Platform {
        method,
        error: response.error.clone().unwrap_or_else(|| "unknown_error".to_owned()),
    })
}

#[async_trait]
impl SlackApi for HttpSlackApi {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        let response: SlackResponse =
            self.call("views.open", &OpenViewRequest { trigger_id, view }).await?;
        ensure_ok("views.open", &response)
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
    ) -> Result<PostedMessage, SlackApiError> {
        let response: SlackResponse =
            self.call("chat.postMessage", &PostMessageRequest { channel, text }).await?;
        ensure_ok("chat.postMessage", &response)?;

        Ok(PostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_owned()),
            ts: response.ts,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    OpenView { trigger_id: String, view: ModalView },
    PostMessage { channel: String, text: String },
}

/// In-memory `SlackApi` that records every call and replays scripted errors.
#[derive(Default)]
pub struct RecordingSlackApi {
    state: Mutex<RecordingState>,
}

#[derive(Default)]
struct RecordingState {
    calls: Vec<RecordedCall>,
    open_view_error: Option<SlackApiError>,
    post_message_error: Option<SlackApiError>,
}

impl RecordingSlackApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_open_view(error: SlackApiError) -> Self {
        Self {
            state: Mutex::new(RecordingState {
                open_view_error: Some(error),
                ..RecordingState::default()
            }),
        }
    }

    pub fn failing_post_message(error: SlackApiError) -> Self {
        Self {
            state: Mutex::new(RecordingState {
                post_message_error: Some(error),
                ..RecordingState::default()
            }),
        }
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn posted_messages(&self) -> Vec<(String, String)> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::PostMessage { channel, text } => Some((channel, text)),
                RecordedCall::OpenView { .. } => None,
            })
            .collect()
    }

    pub async fn opened_views(&self) -> Vec<(String, ModalView)> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::OpenView { trigger_id, view } => Some((trigger_id, view)),
                RecordedCall::PostMessage { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl SlackApi for RecordingSlackApi {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall::OpenView {
            trigger_id: trigger_id.to_owned(),
            view: view.clone(),
        });
        state.open_view_error.clone().map_or(Ok(()), Err)
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
    ) -> Result<PostedMessage, SlackApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall::PostMessage {
            channel: channel.to_owned(),
            text: text.to_owned(),
        });
        match state.post_message_error.clone() {
            Some(error) => Err(error),
            None => Ok(PostedMessage { channel: channel.to_owned(), ts: None }),
        }
    }
}
