//! Slack Integration - webhook bot interface
//!
//! This crate provides the Slack side of eventlink:
//! - **Events** (`events`) - Webhook payload parsing and handler dispatch
//! - **Trigger** (`trigger`) - "create event" detection and modal opening
//! - **Submission** (`submission`) - Modal form extraction and link delivery
//! - **Block Kit** (`blocks`) - Modal view builders
//! - **Web API** (`api`) - `views.open` and `chat.postMessage` client
//! - **Signatures** (`signature`) - `X-Slack-Signature` verification
//!
//! # Architecture
//!
//! ```text
//! POST /slack/events → parse_webhook_body → EventDispatcher
//!                                               ├─ TriggerDetector → views.open
//!                                               └─ FormProcessor   → chat.postMessage (DM)
//! ```
//!
//! # Key Types
//!
//! - `EventDispatcher` - Routes events to appropriate handlers
//! - `SlackApi` - Trait over the two Web API methods the bot uses
//! - `SignatureVerifier` - Request authenticity check

pub mod api;
pub mod blocks;
pub mod events;
pub mod form;
pub mod notifier;
pub mod signature;
pub mod submission;
pub mod trigger;

pub use api::{HttpSlackApi, RecordingSlackApi, SlackApi, SlackApiError};
pub use events::{
    default_dispatcher, parse_webhook_body, DispatchError, EventContext, EventDispatcher,
    HandlerResult, PayloadError, SlackEvent,
};
pub use signature::{SignatureError, SignatureVerifier};
