use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Scene {
    pub scene_number: u32,
    pub scene_text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub scene_number: u32,
    pub scene_text: String,
    pub prompt: String,
}

/// One entry of the image batch. A failed entry keeps its place in the
/// sequence so that images stay aligned with prompts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(try_from = "ImageRecord", into = "ImageRecord")]
pub struct Image {
    pub scene_number: u32,
    pub outcome: ImageOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageOutcome {
    Generated { filename: String },
    Failed { error: String },
}

/// Wire shape: `{scene_number, filename?, error?}`.
#[derive(Serialize, Deserialize)]
struct ImageRecord {
    scene_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TryFrom<ImageRecord> for Image {
    type Error = String;

    fn try_from(record: ImageRecord) -> Result<Self, Self::Error> {
        // An error marks the entry degraded even if a filename came along.
        let error = record.error.filter(|e| !e.is_empty());
        let outcome = match (error, record.filename) {
            (Some(error), _) => ImageOutcome::Failed { error },
            (None, Some(filename)) if !filename.is_empty() => ImageOutcome::Generated { filename },
            (None, _) => {
                return Err(format!(
                    "image for scene {} has neither a filename nor an error",
                    record.scene_number
                ))
            }
        };
        Ok(Image {
            scene_number: record.scene_number,
            outcome,
        })
    }
}

impl From<Image> for ImageRecord {
    fn from(image: Image) -> Self {
        let (filename, error) = match image.outcome {
            ImageOutcome::Generated { filename } => (Some(filename), None),
            ImageOutcome::Failed { error } => (None, Some(error)),
        };
        ImageRecord {
            scene_number: image.scene_number,
            filename,
            error,
        }
    }
}

impl Image {
    pub fn generated(scene_number: u32, filename: impl Into<String>) -> Self {
        Self {
            scene_number,
            outcome: ImageOutcome::Generated {
                filename: filename.into(),
            },
        }
    }

    pub fn failed(scene_number: u32, error: impl Into<String>) -> Self {
        Self {
            scene_number,
            outcome: ImageOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match &self.outcome {
            ImageOutcome::Generated { filename } => Some(filename),
            ImageOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ImageOutcome::Failed { error } => Some(error),
            ImageOutcome::Generated { .. } => None,
        }
    }
}

/// Filenames that can go into video assembly, in scene order.
pub fn usable_image_files(images: &[Image]) -> Vec<String> {
    images
        .iter()
        .filter_map(|img| img.filename().map(str::to_string))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioArtifact {
    pub filename: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoArtifact {
    pub filename: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoKind {
    /// Playable `.mp4` (or any non-HTML file).
    Video,
    /// HTML slideshow rendered when video assembly falls back.
    Slideshow,
}

impl VideoArtifact {
    pub fn kind(&self) -> VideoKind {
        if self.filename.ends_with(".html") {
            VideoKind::Slideshow
        } else {
            VideoKind::Video
        }
    }
}
