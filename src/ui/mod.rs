//! Rendering side of the workflow.
//!
//! The controller never formats anything itself; it hands view models to a
//! [`Renderer`]. The terminal renderer backs the CLI, [`html`] builds page
//! fragments, and the `web` module mounts a leptos page in the browser.

use crate::core::pipeline::Stage;
use crate::core::state::{Progress, Step};
use crate::core::view::{AudioView, EnhancementView, GalleryView, OutputView, PromptCard};
use std::time::Duration;

pub mod html;
#[cfg(not(target_arch = "wasm32"))]
pub mod terminal;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// How long a transient notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    pub fn css_class(self) -> &'static str {
        match self {
            NoticeLevel::Success => "notification notification-success",
            NoticeLevel::Error => "notification notification-error",
        }
    }
}

/// Non-blocking message that dismisses itself after [`NOTICE_TTL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Renderer {
    /// Makes `step`'s panel the only visible one.
    fn show_step(&self, step: Step);
    fn update_progress(&self, progress: &Progress);
    fn set_loading(&self, loading: bool);
    /// Blocking message: validation failures and failed stages.
    fn alert(&self, message: &str);
    fn notify(&self, notice: &Notice);
    fn set_action_enabled(&self, stage: Stage, enabled: bool);

    fn render_enhancement(&self, view: &EnhancementView);
    fn render_prompts(&self, cards: &[PromptCard]);
    fn render_gallery(&self, view: &GalleryView);
    fn render_audio(&self, view: &AudioView);
    fn render_output(&self, view: &OutputView);
}

/// Shows the loading indicator until dropped, whatever path the
/// surrounding code leaves by.
pub struct LoadingGuard<'a> {
    renderer: &'a dyn Renderer,
}

impl<'a> LoadingGuard<'a> {
    pub fn new(renderer: &'a dyn Renderer) -> Self {
        renderer.set_loading(true);
        Self { renderer }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.renderer.set_loading(false);
    }
}
