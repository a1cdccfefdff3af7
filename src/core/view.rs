//! View models for the step panels.
//!
//! Everything here is plain data built from the workflow artifacts; the
//! renderers in `crate::ui` turn it into terminal output or HTML.

use crate::core::model::{AudioArtifact, Image, ImageOutcome, Prompt, VideoArtifact, VideoKind};
use anyhow::{Context, Result};
use url::Url;

pub const ADVANCED_DESCRIPTION: &str = "Advanced AI analysis for better educational prompts";
pub const TEMPLATE_DESCRIPTION: &str = "Template-based approach for consistent results";

/// Builds `/view/<file>` and `/download/<file>` links against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLinks {
    Remote(Url),
    /// Bare filenames, for a page stored next to the downloaded files.
    Local,
}

impl AssetLinks {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).context(format!("Invalid backend url: {}", base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("Backend url cannot carry paths: {}", base_url);
        }
        Ok(Self::Remote(base))
    }

    pub fn view_url(&self, filename: &str) -> String {
        self.asset_url("view", filename)
    }

    pub fn download_url(&self, filename: &str) -> String {
        self.asset_url("download", filename)
    }

    fn asset_url(&self, route: &str, filename: &str) -> String {
        match self {
            Self::Local => filename.to_string(),
            Self::Remote(base) => {
                let mut url = base.clone();
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().push(route).push(filename);
                }
                url.to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancementView {
    pub enabled: bool,
    pub level: String,
    pub description: &'static str,
}

impl EnhancementView {
    pub fn new(enabled: bool, level: impl Into<String>) -> Self {
        Self {
            enabled,
            level: level.into(),
            description: if enabled {
                ADVANCED_DESCRIPTION
            } else {
                TEMPLATE_DESCRIPTION
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCard {
    pub heading: String,
    pub scene_text: String,
    pub prompt: String,
}

pub fn prompt_cards(prompts: &[Prompt]) -> Vec<PromptCard> {
    prompts
        .iter()
        .map(|p| PromptCard {
            heading: format!("Scene {}", p.scene_number),
            scene_text: p.scene_text.clone(),
            prompt: p.prompt.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryItem {
    Generated {
        caption: String,
        filename: String,
        view_url: String,
        download_url: String,
    },
    Failed {
        caption: String,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GallerySummary {
    pub success_count: usize,
    pub total_count: usize,
}

impl GallerySummary {
    pub fn of(images: &[Image]) -> Self {
        Self {
            success_count: images.iter().filter(|img| img.error().is_none()).count(),
            total_count: images.len(),
        }
    }

    pub fn fallback_count(&self) -> usize {
        self.total_count - self.success_count
    }

    pub fn headline(&self) -> String {
        format!(
            "Successfully generated {} out of {} images",
            self.success_count, self.total_count
        )
    }

    pub fn fallback_note(&self) -> Option<String> {
        match self.fallback_count() {
            0 => None,
            n => Some(format!("{} images used fallback generation", n)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryView {
    pub items: Vec<GalleryItem>,
    pub summary: GallerySummary,
}

pub fn gallery_view(images: &[Image], links: &AssetLinks) -> GalleryView {
    let items = images
        .iter()
        .map(|img| {
            let caption = format!("Scene {}", img.scene_number);
            match &img.outcome {
                ImageOutcome::Generated { filename } => GalleryItem::Generated {
                    caption,
                    filename: filename.clone(),
                    view_url: links.view_url(filename),
                    download_url: links.download_url(filename),
                },
                ImageOutcome::Failed { error } => GalleryItem::Failed {
                    caption,
                    error: error.clone(),
                },
            }
        })
        .collect();

    GalleryView {
        items,
        summary: GallerySummary::of(images),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioView {
    pub filename: String,
    pub url: String,
}

pub fn audio_view(audio: &AudioArtifact, links: &AssetLinks) -> AudioView {
    AudioView {
        filename: audio.filename.clone(),
        url: links.view_url(&audio.filename),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputImage {
    pub caption: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub label: String,
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputView {
    pub video_kind: VideoKind,
    pub video_url: String,
    pub audio_url: String,
    pub gallery: Vec<OutputImage>,
    /// Video first, then audio, then every image in scene order.
    pub downloads: Vec<DownloadLink>,
}

pub fn video_download_label(kind: VideoKind) -> &'static str {
    match kind {
        VideoKind::Slideshow => "Download Slideshow (HTML)",
        VideoKind::Video => "Download Video (MP4)",
    }
}

pub fn output_view(
    video: &VideoArtifact,
    audio: &AudioArtifact,
    image_files: &[String],
    links: &AssetLinks,
) -> OutputView {
    let kind = video.kind();

    // Captions follow the filtered list, so a failed scene shifts the numbering.
    let gallery = image_files
        .iter()
        .enumerate()
        .map(|(index, filename)| OutputImage {
            caption: format!("Scene {}", index + 1),
            url: links.view_url(filename),
        })
        .collect();

    let mut downloads = vec![
        DownloadLink {
            label: video_download_label(kind).to_string(),
            filename: video.filename.clone(),
            url: links.download_url(&video.filename),
        },
        DownloadLink {
            label: "Download Audio (MP3)".to_string(),
            filename: audio.filename.clone(),
            url: links.download_url(&audio.filename),
        },
    ];
    downloads.extend(image_files.iter().map(|filename| DownloadLink {
        label: filename.clone(),
        filename: filename.clone(),
        url: links.download_url(filename),
    }));

    OutputView {
        video_kind: kind,
        video_url: links.view_url(&video.filename),
        audio_url: links.view_url(&audio.filename),
        gallery,
        downloads,
    }
}
