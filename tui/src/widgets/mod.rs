//! Widgets

pub mod text_block;
pub mod user_panel;

pub use text_block::{TextBlock, TextBlockState};
pub use user_panel::UserPanel;
