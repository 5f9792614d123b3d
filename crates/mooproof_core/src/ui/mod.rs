//! crates/mooproof_core/src/ui/mod.rs
//!
//! Client-side controller for the proofreading page and its feedback renderer.

pub mod render;
pub mod state;

pub use render::{escape_html, render_feedback};
pub use state::{
    transition, ChatPhase, ChatReply, Phase, StagedFile, SubmitReply, Tab, UiEffect, UiEvent,
    UiState,
};
