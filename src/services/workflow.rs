use crate::core::error::{ApiError, WorkflowError};
use crate::core::model::{usable_image_files, AudioArtifact, Prompt, Scene, VideoArtifact};
use crate::core::pipeline::Stage;
use crate::core::state::WorkflowState;
use crate::core::view::{
    audio_view, gallery_view, output_view, prompt_cards, AssetLinks, EnhancementView,
};
use crate::services::backend::{Backend, EnhancementStatus};
use crate::ui::{LoadingGuard, Notice, Renderer};
use log::{error, info, warn};

/// Drives the five remote stages and keeps the rendered panels in sync
/// with [`WorkflowState`].
pub struct WorkflowController {
    backend: Box<dyn Backend>,
    renderer: Box<dyn Renderer>,
    links: AssetLinks,
    state: WorkflowState,
    enhancement: Option<EnhancementStatus>,
}

impl WorkflowController {
    pub fn new(backend: Box<dyn Backend>, renderer: Box<dyn Renderer>) -> Self {
        let links = backend.asset_links();
        let controller = Self {
            backend,
            renderer,
            links,
            state: WorkflowState::default(),
            enhancement: None,
        };
        controller.refresh_view();
        controller
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn enhancement(&self) -> Option<&EnhancementStatus> {
        self.enhancement.as_ref()
    }

    /// Stages the user can trigger right now.
    pub fn available_actions(&self) -> Vec<Stage> {
        self.state
            .armed_stages()
            .into_iter()
            .filter(|stage| *stage != Stage::GeneratePrompts || !self.state.scenes.is_empty())
            .collect()
    }

    // --- Enhancement level ---

    /// Failures are only logged; the page keeps working without a level.
    pub async fn load_status(&mut self) {
        match self.backend.get_status().await {
            Ok(status) => {
                let view = EnhancementView::new(status.enabled, status.level.clone());
                self.renderer.render_enhancement(&view);
                self.enhancement = Some(status);
            }
            Err(e) => error!("Failed to load system status: {}", e),
        }
    }

    pub async fn toggle_enhancement(&mut self, use_groq: bool) -> Result<String, ApiError> {
        match self.backend.toggle_enhancement(use_groq).await {
            Ok(level) => {
                self.renderer
                    .render_enhancement(&EnhancementView::new(use_groq, level.clone()));
                self.renderer
                    .notify(&Notice::success(format!("Switched to {}", level)));
                self.enhancement = Some(EnhancementStatus {
                    enabled: use_groq,
                    level: level.clone(),
                });
                Ok(level)
            }
            Err(e) => {
                error!("Error toggling enhancement: {}", e);
                // The last confirmed status is kept; the toggle control is left as the user set it.
                self.renderer.notify(&Notice::error("Failed to switch levels"));
                Err(e)
            }
        }
    }

    // --- Stages ---

    /// Splits the script and, on success, generates prompts in the same action.
    pub async fn split_script(&mut self, script_text: &str) -> Result<(), WorkflowError> {
        let result = self.try_split_script(script_text).await;
        self.report(result)
    }

    pub async fn generate_prompts(&mut self) -> Result<(), WorkflowError> {
        let result = self.try_generate_prompts().await;
        self.report(result)
    }

    pub async fn generate_images(&mut self) -> Result<(), WorkflowError> {
        let result = self.try_generate_images().await;
        self.report(result)
    }

    pub async fn generate_audio(&mut self, script_text: &str) -> Result<(), WorkflowError> {
        let result = self.try_generate_audio(script_text).await;
        self.report(result)
    }

    pub async fn create_video(&mut self) -> Result<(), WorkflowError> {
        let result = self.try_create_video().await;
        self.report(result)
    }

    pub async fn run_stage(&mut self, stage: Stage, script_text: &str) -> Result<(), WorkflowError> {
        match stage {
            Stage::SplitScript => self.split_script(script_text).await,
            Stage::GeneratePrompts => self.generate_prompts().await,
            Stage::GenerateImages => self.generate_images().await,
            Stage::GenerateAudio => {
                let script = self
                    .state
                    .script
                    .clone()
                    .unwrap_or_else(|| script_text.to_string());
                self.generate_audio(&script).await
            }
            Stage::CreateVideo => self.create_video().await,
        }
    }

    /// Runs every stage in pipeline order, stopping at the first failure.
    pub async fn run_all(&mut self, script_text: &str) -> Result<(), WorkflowError> {
        let mut next = Some(Stage::SplitScript);
        while let Some(stage) = next {
            info!("Running stage: {}", stage);
            self.run_stage(stage, script_text).await?;
            next = stage.next_user_stage();
        }
        Ok(())
    }

    async fn try_split_script(&mut self, script_text: &str) -> Result<(), WorkflowError> {
        let script = script_text.trim();
        if script.is_empty() {
            return Err(WorkflowError::validation("Please enter a teaching script first."));
        }
        self.state.ensure_armed(Stage::SplitScript)?;

        let prompts = {
            let _loading = LoadingGuard::new(self.renderer.as_ref());

            let scenes = self
                .backend
                .split_script(script)
                .await
                .map_err(|e| WorkflowError::api(Stage::SplitScript, e))?;
            info!("Script split into {} scenes", scenes.len());
            self.state.script = Some(script.to_string());
            self.state.scenes = scenes;

            // Chained: prompt generation runs under the same loading indicator.
            fetch_prompts(self.backend.as_ref(), &self.state.scenes).await?
        };

        self.apply_prompts(prompts)
    }

    async fn try_generate_prompts(&mut self) -> Result<(), WorkflowError> {
        if self.state.scenes.is_empty() {
            return Err(WorkflowError::validation(
                "No scenes available. Please split the script first.",
            ));
        }
        self.state.ensure_armed(Stage::GeneratePrompts)?;

        let prompts = {
            let _loading = LoadingGuard::new(self.renderer.as_ref());
            fetch_prompts(self.backend.as_ref(), &self.state.scenes).await?
        };

        self.apply_prompts(prompts)
    }

    fn apply_prompts(&mut self, prompts: Vec<Prompt>) -> Result<(), WorkflowError> {
        self.state.prompts = prompts;
        self.renderer.render_prompts(&prompt_cards(&self.state.prompts));
        self.complete(Stage::GeneratePrompts)
    }

    async fn try_generate_images(&mut self) -> Result<(), WorkflowError> {
        if self.state.prompts.is_empty() {
            return Err(WorkflowError::validation(
                "No prompts available. Please generate prompts first.",
            ));
        }
        self.state.ensure_armed(Stage::GenerateImages)?;

        let images = {
            let _loading = LoadingGuard::new(self.renderer.as_ref());
            self.backend
                .generate_images(&self.state.prompts)
                .await
                .map_err(|e| WorkflowError::api(Stage::GenerateImages, e))?
        };

        if images.len() != self.state.prompts.len() {
            return Err(WorkflowError::api(
                Stage::GenerateImages,
                ApiError::Malformed(format!(
                    "expected {} images, got {}",
                    self.state.prompts.len(),
                    images.len()
                )),
            ));
        }

        self.state.images = images;
        let gallery = gallery_view(&self.state.images, &self.links);
        if gallery.summary.fallback_count() > 0 {
            warn!(
                "{} of {} images failed",
                gallery.summary.fallback_count(),
                gallery.summary.total_count
            );
        }
        self.renderer.render_gallery(&gallery);
        self.complete(Stage::GenerateImages)
    }

    async fn try_generate_audio(&mut self, script_text: &str) -> Result<(), WorkflowError> {
        let script = script_text.trim();
        if script.is_empty() {
            return Err(WorkflowError::validation("No script text available."));
        }
        self.state.ensure_armed(Stage::GenerateAudio)?;

        let filename = {
            let _loading = LoadingGuard::new(self.renderer.as_ref());
            self.backend
                .generate_audio(script)
                .await
                .map_err(|e| WorkflowError::api(Stage::GenerateAudio, e))?
        };
        if filename.is_empty() {
            return Err(WorkflowError::api(
                Stage::GenerateAudio,
                ApiError::Malformed("empty audio_filename".to_string()),
            ));
        }

        let audio = AudioArtifact { filename };
        self.renderer.render_audio(&audio_view(&audio, &self.links));
        self.state.audio = Some(audio);
        self.complete(Stage::GenerateAudio)
    }

    async fn try_create_video(&mut self) -> Result<(), WorkflowError> {
        let audio = match &self.state.audio {
            Some(audio) if !self.state.images.is_empty() => audio.clone(),
            _ => {
                return Err(WorkflowError::validation(
                    "Audio and images are required to create video.",
                ))
            }
        };

        let image_files = usable_image_files(&self.state.images);
        if image_files.is_empty() {
            return Err(WorkflowError::validation(
                "No valid images available for video creation.",
            ));
        }
        self.state.ensure_armed(Stage::CreateVideo)?;

        let filename = {
            let _loading = LoadingGuard::new(self.renderer.as_ref());
            self.backend
                .create_video(&image_files, &audio.filename)
                .await
                .map_err(|e| WorkflowError::api(Stage::CreateVideo, e))?
        };
        if filename.is_empty() {
            return Err(WorkflowError::api(
                Stage::CreateVideo,
                ApiError::Malformed("empty video_filename".to_string()),
            ));
        }

        let video = VideoArtifact { filename };
        self.renderer
            .render_output(&output_view(&video, &audio, &image_files, &self.links));
        self.state.video = Some(video);
        self.complete(Stage::CreateVideo)
    }

    fn complete(&mut self, stage: Stage) -> Result<(), WorkflowError> {
        if let Some(step) = stage.landing_step() {
            self.state.advance_to(step)?;
            info!("Step {}: {}", step.number(), self.state.progress().label);
        }
        self.refresh_view();
        Ok(())
    }

    fn refresh_view(&self) {
        self.renderer.show_step(self.state.current_step());
        self.renderer.update_progress(&self.state.progress());
        let available = self.available_actions();
        for stage in Stage::ALL {
            self.renderer
                .set_action_enabled(stage, available.contains(&stage));
        }
    }

    fn report(&self, result: Result<(), WorkflowError>) -> Result<(), WorkflowError> {
        if let Err(e) = &result {
            if e.is_validation() {
                warn!("{}", e);
            } else {
                error!("{}", e);
            }
            self.renderer.alert(&e.to_string());
            // A failed stage may still leave new data behind (scenes after a split).
            self.refresh_view();
        }
        result
    }
}

async fn fetch_prompts(
    backend: &dyn Backend,
    scenes: &[Scene],
) -> Result<Vec<Prompt>, WorkflowError> {
    let prompts = backend
        .generate_prompts(scenes)
        .await
        .map_err(|e| WorkflowError::api(Stage::GeneratePrompts, e))?;

    if prompts.len() != scenes.len() {
        return Err(WorkflowError::api(
            Stage::GeneratePrompts,
            ApiError::Malformed(format!(
                "expected {} prompts, got {}",
                scenes.len(),
                prompts.len()
            )),
        ));
    }
    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Image;
    use crate::core::state::{Progress, Step};
    use crate::core::view::{GalleryItem, OutputView};
    use crate::ui::testing::{Event, RecordingRenderer};
    use crate::services::backend::testing::MockBackend;
    use crate::ui::NoticeLevel;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    const SCRIPT: &str = "Intro.\n\nMain point.\n\nConclusion.";

    fn controller(backend: &MockBackend) -> (WorkflowController, RecordingRenderer) {
        let renderer = RecordingRenderer::default();
        let controller =
            WorkflowController::new(Box::new(backend.clone()), Box::new(renderer.clone()));
        (controller, renderer)
    }

    fn loading_is_balanced(events: &[Event]) -> bool {
        let mut depth = 0i32;
        for e in events {
            match e {
                Event::Loading(true) => depth += 1,
                Event::Loading(false) => depth -= 1,
                _ => {}
            }
            if depth < 0 || depth > 1 {
                return false;
            }
        }
        depth == 0
    }

    #[tokio::test]
    async fn test_new_controller_shows_first_step() {
        let backend = MockBackend::default();
        let (ctl, renderer) = controller(&backend);

        assert_eq!(ctl.state().current_step(), Step::Script);
        let events = renderer.events();
        assert_eq!(events[0], Event::Step(Step::Script));
        assert_eq!(events[1], Event::Progress(Progress::for_step(1)));
        assert!(events.contains(&Event::Action(Stage::SplitScript, true)));
        assert!(events.contains(&Event::Action(Stage::GeneratePrompts, false)));
        assert!(events.contains(&Event::Action(Stage::GenerateImages, false)));
    }

    #[tokio::test]
    async fn test_split_script_chains_prompt_generation() {
        let backend = MockBackend::default();
        let (mut ctl, renderer) = controller(&backend);

        ctl.split_script(SCRIPT).await.unwrap();

        assert_eq!(backend.calls(), vec!["split-script", "generate-prompts"]);
        assert_eq!(ctl.state().scenes.len(), 3);
        assert_eq!(ctl.state().prompts.len(), ctl.state().scenes.len());
        assert_eq!(ctl.state().current_step(), Step::Prompts);
        assert_eq!(ctl.available_actions(), vec![Stage::GenerateImages]);

        let events = renderer.events();
        assert!(loading_is_balanced(&events));
        // One loading scope covers both calls.
        assert_eq!(events.iter().filter(|e| **e == Event::Loading(true)).count(), 1);
        assert!(events.contains(&Event::Progress(Progress {
            step: 2,
            percentage: 40,
            label: "Prompts generated",
        })));
        assert!(events.iter().any(|e| matches!(e, Event::Prompts(cards) if cards.len() == 3)));
    }

    #[tokio::test]
    async fn test_blank_script_is_rejected_without_a_request() {
        let backend = MockBackend::default();
        let (mut ctl, renderer) = controller(&backend);

        let err = ctl.split_script("   \n\t ").await.unwrap_err();

        assert!(err.is_validation());
        assert!(backend.calls().is_empty());
        assert_eq!(renderer.alerts(), vec!["Please enter a teaching script first."]);
        assert!(!renderer.events().contains(&Event::Loading(true)));
    }

    #[tokio::test]
    async fn test_generate_images_without_prompts_blocks_locally() {
        let backend = MockBackend::default();
        let (mut ctl, renderer) = controller(&backend);

        let err = ctl.generate_images().await.unwrap_err();

        assert!(err.is_validation());
        assert!(backend.calls().is_empty());
        assert_eq!(ctl.state().current_step(), Step::Script);
        assert_eq!(
            renderer.alerts(),
            vec!["No prompts available. Please generate prompts first."]
        );
    }

    #[tokio::test]
    async fn test_split_failure_keeps_state_unchanged() {
        let backend = MockBackend {
            fail_endpoint: Some("split-script"),
            ..Default::default()
        };
        let (mut ctl, renderer) = controller(&backend);

        let err = ctl.split_script(SCRIPT).await.unwrap_err();

        assert!(matches!(err, WorkflowError::Api { stage: Stage::SplitScript, .. }));
        assert!(ctl.state().scenes.is_empty());
        assert!(ctl.state().script.is_none());
        assert_eq!(ctl.state().current_step(), Step::Script);
        assert_eq!(renderer.alerts(), vec!["Error splitting script: split-script is down"]);
        assert!(loading_is_balanced(&renderer.events()));
    }

    #[tokio::test]
    async fn test_prompt_failure_stays_on_step_one_and_can_be_retried() {
        let backend = MockBackend {
            fail_endpoint: Some("generate-prompts"),
            ..Default::default()
        };
        let (mut ctl, renderer) = controller(&backend);

        ctl.split_script(SCRIPT).await.unwrap_err();
        assert_eq!(ctl.state().current_step(), Step::Script);
        assert_eq!(ctl.state().scenes.len(), 3);
        assert_eq!(
            renderer.alerts(),
            vec!["Error generating prompts: generate-prompts is down"]
        );
        assert_eq!(
            ctl.available_actions(),
            vec![Stage::SplitScript, Stage::GeneratePrompts]
        );

        let last_prompt_action = renderer.events().into_iter().rev().find_map(|e| match e {
            Event::Action(Stage::GeneratePrompts, enabled) => Some(enabled),
            _ => None,
        });
        assert_eq!(last_prompt_action, Some(true));

        // Same scenes, backend recovered.
        let mut recovered = WorkflowController::new(
            Box::new(MockBackend::default()),
            Box::new(RecordingRenderer::default()),
        );
        recovered.state.scenes = ctl.state().scenes.clone();
        recovered.generate_prompts().await.unwrap();
        assert_eq!(recovered.state().current_step(), Step::Prompts);
    }

    #[tokio::test]
    async fn test_prompt_count_mismatch_is_malformed() {
        struct ShortBackend(MockBackend);
        #[async_trait]
        impl Backend for ShortBackend {
            async fn get_status(&self) -> Result<EnhancementStatus, ApiError> {
                self.0.get_status().await
            }
            async fn toggle_enhancement(&self, use_groq: bool) -> Result<String, ApiError> {
                self.0.toggle_enhancement(use_groq).await
            }
            async fn split_script(&self, script: &str) -> Result<Vec<Scene>, ApiError> {
                self.0.split_script(script).await
            }
            async fn generate_prompts(&self, scenes: &[Scene]) -> Result<Vec<Prompt>, ApiError> {
                let mut prompts = self.0.generate_prompts(scenes).await?;
                prompts.pop();
                Ok(prompts)
            }
            async fn generate_images(&self, prompts: &[Prompt]) -> Result<Vec<Image>, ApiError> {
                self.0.generate_images(prompts).await
            }
            async fn generate_audio(&self, script: &str) -> Result<String, ApiError> {
                self.0.generate_audio(script).await
            }
            async fn create_video(&self, files: &[String], audio: &str) -> Result<String, ApiError> {
                self.0.create_video(files, audio).await
            }
            async fn download(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
                self.0.download(filename).await
            }
            fn asset_links(&self) -> AssetLinks {
                self.0.asset_links()
            }
        }

        let renderer = RecordingRenderer::default();
        let mut short = WorkflowController::new(
            Box::new(ShortBackend(MockBackend::default())),
            Box::new(renderer.clone()),
        );
        let err = short.split_script(SCRIPT).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Api { stage: Stage::GeneratePrompts, source: ApiError::Malformed(_) }
        ));
        assert_eq!(short.state().current_step(), Step::Script);
        assert!(short.state().prompts.is_empty());
    }

    #[tokio::test]
    async fn test_partial_image_failure_is_a_valid_outcome() {
        let backend = MockBackend {
            failed_scenes: vec![2],
            ..Default::default()
        };
        let (mut ctl, renderer) = controller(&backend);

        ctl.split_script(SCRIPT).await.unwrap();
        ctl.generate_images().await.unwrap();

        assert_eq!(ctl.state().current_step(), Step::Images);
        assert_eq!(ctl.state().images.len(), ctl.state().prompts.len());

        let gallery = renderer
            .events()
            .into_iter()
            .find_map(|e| match e {
                Event::Gallery(g) => Some(g),
                _ => None,
            })
            .unwrap();
        assert_eq!(gallery.summary.success_count, 2);
        assert_eq!(gallery.summary.total_count, 3);
        assert_eq!(
            gallery.summary.fallback_note().as_deref(),
            Some("1 images used fallback generation")
        );
        assert!(matches!(
            &gallery.items[1],
            GalleryItem::Failed { error, .. } if error == "NVIDIA API timeout"
        ));
    }

    #[tokio::test]
    async fn test_image_count_mismatch_is_malformed() {
        let backend = MockBackend {
            drop_one_image: true,
            ..Default::default()
        };
        let (mut ctl, _renderer) = controller(&backend);

        ctl.split_script(SCRIPT).await.unwrap();
        let err = ctl.generate_images().await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Api { stage: Stage::GenerateImages, source: ApiError::Malformed(_) }
        ));
        assert!(ctl.state().images.is_empty());
        assert_eq!(ctl.state().current_step(), Step::Prompts);
    }

    #[tokio::test]
    async fn test_create_video_sends_only_generated_images() {
        let backend = MockBackend {
            failed_scenes: vec![2],
            ..Default::default()
        };
        let (mut ctl, _renderer) = controller(&backend);

        ctl.split_script(SCRIPT).await.unwrap();
        ctl.generate_images().await.unwrap();
        ctl.generate_audio(SCRIPT).await.unwrap();
        ctl.create_video().await.unwrap();

        let (files, audio) = backend.video_request.lock().unwrap().clone().unwrap();
        assert_eq!(files, vec!["scene_1.png".to_string(), "scene_3.png".to_string()]);
        assert_eq!(audio, "narration.mp3");
    }

    #[tokio::test]
    async fn test_create_video_with_no_usable_images_blocks_locally() {
        let backend = MockBackend {
            failed_scenes: vec![1, 2, 3],
            ..Default::default()
        };
        let (mut ctl, renderer) = controller(&backend);

        ctl.split_script(SCRIPT).await.unwrap();
        ctl.generate_images().await.unwrap();
        ctl.generate_audio(SCRIPT).await.unwrap();
        let err = ctl.create_video().await.unwrap_err();

        assert!(err.is_validation());
        assert!(!backend.calls().contains(&"create-video".to_string()));
        assert_eq!(ctl.state().current_step(), Step::Audio);
        assert_eq!(
            renderer.alerts(),
            vec!["No valid images available for video creation."]
        );
    }

    #[tokio::test]
    async fn test_create_video_requires_audio() {
        let backend = MockBackend::default();
        let (mut ctl, renderer) = controller(&backend);

        ctl.split_script(SCRIPT).await.unwrap();
        ctl.generate_images().await.unwrap();
        let err = ctl.create_video().await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(
            renderer.alerts(),
            vec!["Audio and images are required to create video."]
        );
    }

    #[tokio::test]
    async fn test_stage_out_of_order_is_rejected() {
        let backend = MockBackend::default();
        let (mut ctl, renderer) = controller(&backend);

        let err = ctl.generate_audio(SCRIPT).await.unwrap_err();
        assert!(err.is_validation());
        assert!(backend.calls().is_empty());
        assert_eq!(renderer.alerts(), vec!["Generate audio is not available at this step."]);

        // Re-splitting after the workflow moved on would regress the step.
        ctl.split_script(SCRIPT).await.unwrap();
        ctl.split_script(SCRIPT).await.unwrap_err();
        assert_eq!(ctl.state().current_step(), Step::Prompts);
    }

    #[tokio::test]
    async fn test_audio_failure_changes_nothing() {
        let backend = MockBackend {
            fail_endpoint: Some("generate-audio"),
            ..Default::default()
        };
        let (mut ctl, renderer) = controller(&backend);

        ctl.split_script(SCRIPT).await.unwrap();
        ctl.generate_images().await.unwrap();
        ctl.generate_audio(SCRIPT).await.unwrap_err();

        assert!(ctl.state().audio.is_none());
        assert_eq!(ctl.state().current_step(), Step::Images);
        assert_eq!(ctl.available_actions(), vec![Stage::GenerateAudio]);
        assert!(loading_is_balanced(&renderer.events()));
    }

    #[tokio::test]
    async fn test_end_to_end_run() {
        let backend = MockBackend::default();
        let (mut ctl, renderer) = controller(&backend);

        ctl.run_all(SCRIPT).await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                "split-script",
                "generate-prompts",
                "generate-images",
                "generate-audio",
                "create-video"
            ]
        );
        assert!(ctl.state().is_complete());
        assert_eq!(ctl.state().images.len(), 3);
        assert_eq!(ctl.state().audio.as_ref().unwrap().filename, "narration.mp3");
        assert!(ctl.available_actions().is_empty());

        let events = renderer.events();
        assert!(loading_is_balanced(&events));
        let output: OutputView = events
            .iter()
            .find_map(|e| match e {
                Event::Output(o) => Some(o.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(output.downloads.len(), 5);
        let image_links = output
            .downloads
            .iter()
            .filter(|d| d.filename.ends_with(".png"))
            .count();
        assert_eq!(image_links, 3);
        assert_eq!(output.downloads[0].label, "Download Video (MP4)");
        assert_eq!(output.downloads[1].label, "Download Audio (MP3)");
        assert_eq!(
            events.iter().filter(|e| matches!(e, Event::Step(_))).last(),
            Some(&Event::Step(Step::Video))
        );
        assert_eq!(
            events.iter().filter(|e| matches!(e, Event::Progress(_))).last(),
            Some(&Event::Progress(Progress::for_step(5)))
        );
    }

    #[tokio::test]
    async fn test_run_all_stops_at_first_failure() {
        let backend = MockBackend {
            fail_endpoint: Some("generate-images"),
            ..Default::default()
        };
        let (mut ctl, _renderer) = controller(&backend);

        let err = ctl.run_all(SCRIPT).await.unwrap_err();

        assert!(matches!(err, WorkflowError::Api { stage: Stage::GenerateImages, .. }));
        assert!(!backend.calls().contains(&"generate-audio".to_string()));
        assert_eq!(ctl.state().current_step(), Step::Prompts);
    }

    #[tokio::test]
    async fn test_slideshow_fallback_output() {
        let backend = MockBackend {
            video_filename: Some("teaching_slideshow.html"),
            ..Default::default()
        };
        let (mut ctl, renderer) = controller(&backend);

        ctl.run_all(SCRIPT).await.unwrap();

        let output = renderer
            .events()
            .into_iter()
            .find_map(|e| match e {
                Event::Output(o) => Some(o),
                _ => None,
            })
            .unwrap();
        assert_eq!(output.downloads[0].label, "Download Slideshow (HTML)");
        assert_eq!(
            output.video_url,
            "http://127.0.0.1:5000/view/teaching_slideshow.html"
        );
    }

    #[tokio::test]
    async fn test_toggle_enhancement_updates_level_and_notifies() {
        let backend = MockBackend::default();
        let (mut ctl, renderer) = controller(&backend);

        let first = ctl.toggle_enhancement(true).await.unwrap();
        let second = ctl.toggle_enhancement(true).await.unwrap();
        assert_eq!(first, second);

        ctl.load_status().await;
        assert_eq!(ctl.enhancement().unwrap().level, first);
        assert!(ctl.enhancement().unwrap().enabled);

        let notices = renderer.notices();
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[0].message, "Switched to Level 2 (Groq Enhanced)");
        assert!(renderer.events().contains(&Event::Enhancement(EnhancementView::new(
            true,
            "Level 2 (Groq Enhanced)"
        ))));
    }

    #[tokio::test]
    async fn test_toggle_failure_keeps_last_confirmed_level() {
        let backend = MockBackend {
            level: Arc::new(Mutex::new((false, "Level 1 (Template)".to_string()))),
            ..Default::default()
        };
        let (mut ctl, renderer) = controller(&backend);
        ctl.load_status().await;

        let failing = MockBackend {
            fail_endpoint: Some("toggle-enhancement"),
            ..backend.clone()
        };
        ctl.backend = Box::new(failing);
        ctl.toggle_enhancement(true).await.unwrap_err();

        assert_eq!(ctl.enhancement().unwrap().level, "Level 1 (Template)");
        assert!(!ctl.enhancement().unwrap().enabled);
        assert_eq!(renderer.notices(), vec![Notice::error("Failed to switch levels")]);
        assert!(renderer.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_load_status_failure_is_silent() {
        let backend = MockBackend {
            fail_endpoint: Some("get-status"),
            ..Default::default()
        };
        let (mut ctl, renderer) = controller(&backend);

        ctl.load_status().await;

        assert!(ctl.enhancement().is_none());
        assert!(renderer.alerts().is_empty());
        assert!(renderer.notices().is_empty());
    }
}
