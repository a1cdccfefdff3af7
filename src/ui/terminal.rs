use crate::core::model::VideoKind;
use crate::core::pipeline::Stage;
use crate::core::state::{Progress, Step, MAX_STEP};
use crate::core::view::{
    AudioView, EnhancementView, GalleryItem, GalleryView, OutputView, PromptCard,
};
use crate::ui::{Notice, NoticeLevel, Renderer};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::sync::Mutex;
use std::time::Duration;

/// Prints panels to stdout and shows a spinner while a request is in flight.
#[derive(Default)]
pub struct TerminalRenderer {
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn is_loading(&self) -> bool {
        self.spinner.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    fn start_spinner(&self) {
        let Ok(mut slot) = self.spinner.lock() else {
            return;
        };
        if slot.is_some() {
            return;
        }
        let pb = ProgressBar::new_spinner();
        let style =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}");
        if let Ok(style) = style {
            pb.set_style(style);
        }
        pb.set_message("Processing...");
        pb.enable_steady_tick(Duration::from_millis(120));
        *slot = Some(pb);
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Renderer for TerminalRenderer {
    fn show_step(&self, step: Step) {
        println!();
        println!("== Step {}: {} ==", step.number(), step.title());
    }

    fn update_progress(&self, progress: &Progress) {
        println!(
            "[{}/{}] {:>3}% {}",
            progress.step, MAX_STEP, progress.percentage, progress.label
        );
    }

    fn set_loading(&self, loading: bool) {
        if loading {
            self.start_spinner();
        } else {
            self.stop_spinner();
        }
    }

    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Error => eprintln!("[!] {}", notice.message),
            NoticeLevel::Success => println!("[ok] {}", notice.message),
        }
    }

    fn set_action_enabled(&self, stage: Stage, enabled: bool) {
        debug!("{} {}", stage, if enabled { "armed" } else { "disarmed" });
    }

    fn render_enhancement(&self, view: &EnhancementView) {
        println!("Enhancement level: {} ({})", view.level, view.description);
    }

    fn render_prompts(&self, cards: &[PromptCard]) {
        for card in cards {
            println!("--- {} ---", card.heading);
            println!("Original Text: {}", card.scene_text);
            println!("Generated Prompt: {}", card.prompt);
        }
    }

    fn render_gallery(&self, view: &GalleryView) {
        for item in &view.items {
            match item {
                GalleryItem::Generated { caption, filename, view_url, .. } => {
                    println!("{}: {} <{}>", caption, filename, view_url)
                }
                GalleryItem::Failed { caption, error } => println!(
                    "{}: Error: {} (using fallback image generation)",
                    caption, error
                ),
            }
        }
        println!("{}", view.summary.headline());
        if let Some(note) = view.summary.fallback_note() {
            println!("{}", note);
        }
    }

    fn render_audio(&self, view: &AudioView) {
        println!("Narration audio generated: {} <{}>", view.filename, view.url);
    }

    fn render_output(&self, view: &OutputView) {
        println!("Your teaching content is ready!");
        let kind = match view.video_kind {
            VideoKind::Slideshow => "Interactive slideshow",
            VideoKind::Video => "Teaching video",
        };
        println!("{}: {}", kind, view.video_url);
        println!("Narration audio: {}", view.audio_url);
        for image in &view.gallery {
            println!("{}: {}", image.caption, image.url);
        }
        println!("Downloads:");
        for link in &view.downloads {
            println!("  {} -> {}", link.label, link.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::LoadingGuard;

    #[test]
    fn test_spinner_cleared_when_guard_drops() {
        let renderer = TerminalRenderer::new();
        {
            let _loading = LoadingGuard::new(&renderer);
            assert!(renderer.is_loading());
        }
        assert!(!renderer.is_loading());
    }
}
