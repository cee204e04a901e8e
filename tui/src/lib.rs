//! Delphi TUI - Terminal interface for Delphi clones
//!
//! A full-screen chat surface over [`delphi_core`]: pick a demo user, talk to
//! the hosted clone, see citations as superscripts.
//!
//! # Architecture
//!
//! - **SessionClient**: runs controller jobs on the runtime, feeds outcomes back
//! - **Display**: transcript to wrapped, styled lines
//! - **Widgets**: borderless scrollable text block, user roster panel
//! - **Theme**: the widget's orange accent and callout pill

pub mod app;
pub mod display;
pub mod session_client;
pub mod theme;
pub mod widgets;

pub use app::App;
pub use session_client::SessionClient;
