use crate::core::io::Storage;
use crate::core::model::{usable_image_files, AudioArtifact, VideoArtifact};
use crate::core::state::WorkflowState;
use crate::core::view::{output_view, AssetLinks};
use crate::services::backend::Backend;
use crate::ui::html;
use anyhow::{anyhow, Context, Result};
use futures_util::StreamExt;
#[cfg(not(target_arch = "wasm32"))]
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::Path;

pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Written paths, video first, then audio, then images in scene order.
    pub files: Vec<String>,
    pub index: String,
}

/// Downloads the finished lesson into `output_folder` and writes an
/// `index.html` that links to the local copies.
pub async fn export_artifacts(
    backend: &dyn Backend,
    storage: &dyn Storage,
    state: &WorkflowState,
    output_folder: &str,
    concurrency: usize,
) -> Result<ExportSummary> {
    let (Some(video), Some(audio)) = (&state.video, &state.audio) else {
        return Err(anyhow!("Nothing to export: the video has not been created yet."));
    };
    let image_files = usable_image_files(&state.images);

    let mut filenames = vec![video.filename.clone(), audio.filename.clone()];
    filenames.extend(image_files.iter().cloned());

    #[cfg(not(target_arch = "wasm32"))]
    let pb = ProgressBar::new(filenames.len() as u64);
    #[cfg(not(target_arch = "wasm32"))]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let results: Vec<Result<(usize, String)>> =
        futures_util::stream::iter(filenames.iter().enumerate())
            .map(|(i, filename)| {
                #[cfg(not(target_arch = "wasm32"))]
                let pb = pb.clone();
                async move {
                    let target = local_path(output_folder, filename)?;
                    let bytes = backend
                        .download(filename)
                        .await
                        .with_context(|| format!("Failed to download {}", filename))?;
                    storage.write(&target, &bytes).await?;
                    #[cfg(not(target_arch = "wasm32"))]
                    pb.inc(1);
                    Ok((i, target))
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    #[cfg(not(target_arch = "wasm32"))]
    pb.finish_with_message("Download complete");

    let mut files = vec![String::new(); filenames.len()];
    for res in results {
        let (i, path) = res?;
        files[i] = path;
    }

    // The page links to the saved copies, which keep only the final path component.
    let local_video = VideoArtifact { filename: local_name(&video.filename)? };
    let local_audio = AudioArtifact { filename: local_name(&audio.filename)? };
    let local_images = image_files
        .iter()
        .map(|f| local_name(f))
        .collect::<Result<Vec<_>>>()?;
    let view = output_view(&local_video, &local_audio, &local_images, &AssetLinks::Local);
    let page = html::page("Teaching Video", &html::output(&view));
    let index = local_path(output_folder, INDEX_FILE)?;
    storage.write(&index, page.as_bytes()).await?;
    info!("Exported {} files to {}", files.len(), output_folder);

    Ok(ExportSummary { files, index })
}

/// Keeps only the final path component so a backend filename cannot escape
/// the output folder.
fn local_name(filename: &str) -> Result<String> {
    let name = Path::new(filename)
        .file_name()
        .ok_or_else(|| anyhow!("Invalid artifact filename: {}", filename))?;
    Ok(name.to_string_lossy().into_owned())
}

fn local_path(output_folder: &str, filename: &str) -> Result<String> {
    let name = local_name(filename)?;
    Ok(Path::new(output_folder).join(name).to_string_lossy().into_owned())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::core::io::NativeStorage;
    use crate::core::model::Image;
    use crate::services::backend::testing::MockBackend;

    fn finished_state() -> WorkflowState {
        let mut state = WorkflowState::default();
        state.images = vec![
            Image::generated(1, "scene_1.png"),
            Image::failed(2, "timeout"),
            Image::generated(3, "scene_3.png"),
        ];
        state.audio = Some(AudioArtifact { filename: "narration.mp3".to_string() });
        state.video = Some(VideoArtifact { filename: "lesson.mp4".to_string() });
        state
    }

    #[tokio::test]
    async fn test_export_downloads_every_usable_artifact() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().to_str().unwrap();
        let backend = MockBackend::default();

        let summary =
            export_artifacts(&backend, &NativeStorage::new(), &finished_state(), out, 2).await?;

        let names: Vec<String> = summary
            .files
            .iter()
            .map(|p| Path::new(p).file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["lesson.mp4", "narration.mp3", "scene_1.png", "scene_3.png"]);
        assert_eq!(std::fs::read(dir.path().join("scene_3.png"))?, b"scene_3.png");

        let mut requested = backend.calls();
        requested.sort();
        assert_eq!(
            requested,
            vec![
                "download lesson.mp4",
                "download narration.mp3",
                "download scene_1.png",
                "download scene_3.png"
            ]
        );

        let index = std::fs::read_to_string(&summary.index)?;
        assert!(index.contains(r#"<source src="lesson.mp4" type="video/mp4">"#));
        assert!(index.contains(r#"<a href="scene_3.png" class="download-link" download>"#));
        Ok(())
    }

    #[tokio::test]
    async fn test_export_requires_a_video() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = finished_state();
        state.video = None;
        let err = export_artifacts(
            &MockBackend::default(),
            &NativeStorage::new(),
            &state,
            dir.path().to_str().unwrap(),
            4,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Nothing to export"));
    }

    #[tokio::test]
    async fn test_export_fails_on_missing_download() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend {
            missing_downloads: vec!["scene_1.png"],
            ..Default::default()
        };
        let err = export_artifacts(
            &backend,
            &NativeStorage::new(),
            &finished_state(),
            dir.path().to_str().unwrap(),
            4,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed to download scene_1.png"));
        assert!(!dir.path().join(INDEX_FILE).exists());
    }

    #[tokio::test]
    async fn test_index_links_match_saved_names() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut state = finished_state();
        state.video = Some(VideoArtifact { filename: "videos/lesson.mp4".to_string() });
        state.images[0] = Image::generated(1, "images/scene_1.png");

        let summary = export_artifacts(
            &MockBackend::default(),
            &NativeStorage::new(),
            &state,
            dir.path().to_str().unwrap(),
            4,
        )
        .await?;

        assert!(dir.path().join("lesson.mp4").exists());
        assert!(dir.path().join("scene_1.png").exists());
        let index = std::fs::read_to_string(&summary.index)?;
        assert!(index.contains(r#"<source src="lesson.mp4" type="video/mp4">"#));
        assert!(index.contains(r#"<a href="scene_1.png" class="download-link" download>"#));
        assert!(!index.contains("images/"));
        assert!(!index.contains("videos/"));
        Ok(())
    }

    #[test]
    fn test_local_path_strips_directories() {
        let path = local_path("output", "../../etc/passwd").unwrap();
        assert_eq!(Path::new(&path), Path::new("output").join("passwd"));
        assert!(local_path("output", "..").is_err());
    }
}
