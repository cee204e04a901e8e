//! Delphi Core - Headless Chat Session Logic
//!
//! Everything the Delphi chat widget does that is not drawing: talking to the
//! Delphi backend, remembering each user's conversation, splitting replies on
//! citation markers, and the session state machine with its Free-tier quota.
//! Surfaces (the terminal UI, tests) drive a [`ChatController`] and render
//! its accessors.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               Surface (delphi-tui)           │
//! │   keys ──▶ select_user / submit ──▶ Job      │
//! │   render ◀── messages / prompt / locks       │
//! └───────────────┬──────────────────▲───────────┘
//!                 │ Job::run         │ Outcome
//! ┌───────────────▼──────────────────┴───────────┐
//! │                 DELPHI CORE                  │
//! │  ┌────────────┐ ┌──────────────┐ ┌─────────┐ │
//! │  │ Controller │ │ Conversation │ │ Backend │ │
//! │  │  (state)   │ │    Cache     │ │ (HTTP)  │ │
//! │  └────────────┘ └──────────────┘ └─────────┘ │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ChatController`]: session state, transcript and input locks
//! - [`ConversationBackend`]: the three remote operations; [`DelphiClient`] is the HTTP one
//! - [`ConversationCache`]: email to conversation id, over any [`KeyValueStore`]
//! - [`annotate`]: lazy `[n]` callout segmentation
//! - [`ChatConfig`]: layered configuration
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use delphi_core::{ChatController, ConversationCache, DelphiClient, MemoryStore};
//!
//! let config = delphi_core::config::load_config()?;
//! let backend = Arc::new(DelphiClient::new(&config.client_config())?);
//! let cache = ConversationCache::new(MemoryStore::new());
//! let mut controller = ChatController::new(backend, cache, &config);
//!
//! controller.choose_user(Some(1)).await;
//! controller.send_message("hello").await;
//! for message in controller.messages() {
//!     println!("{}: {}", message.sender.as_str(), message.text);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod annotation;
pub mod client;
pub mod config;
pub mod controller;
pub mod messages;
pub mod store;
pub mod users;

pub use annotation::{annotate, Annotated, Segment, Segments};
pub use client::{
    ClientConfig, ClientError, ConversationBackend, DelphiClient, NewConversation, RetryPolicy,
};
pub use config::{ChatConfig, ConfigError, ConfigOverrides, ConfigSource};
pub use controller::{ChatController, Job, Outcome, SessionError, SessionState};
pub use messages::{count_user_messages, ConversationId, Message, Sender};
pub use store::{ConversationCache, FileStore, KeyValueStore, MemoryStore, StoreError};
pub use users::{demo_users, ProgramType, User};
