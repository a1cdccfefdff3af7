use crate::core::config::BackendConfig;
use crate::core::error::ApiError;
use crate::core::model::{Image, Prompt, Scene};
use crate::core::pipeline::Stage;
use crate::core::view::AssetLinks;
use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

const STATUS_FALLBACK: &str = "Failed to load system status";
const TOGGLE_FALLBACK: &str = "Failed to toggle enhancement";

#[cfg(target_arch = "wasm32")]
pub trait BackendBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> BackendBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait BackendBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> BackendBounds for T {}

/// Enhancement level as reported by `GET /get-status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnhancementStatus {
    #[serde(rename = "groq_enabled")]
    pub enabled: bool,
    pub level: String,
}

/// The generator service. One method per endpoint; each either yields the
/// payload of a `success: true` envelope or an [`ApiError`].
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Backend: BackendBounds {
    async fn get_status(&self) -> Result<EnhancementStatus, ApiError>;
    /// Returns the level label the backend switched to.
    async fn toggle_enhancement(&self, use_groq: bool) -> Result<String, ApiError>;
    async fn split_script(&self, script: &str) -> Result<Vec<Scene>, ApiError>;
    async fn generate_prompts(&self, scenes: &[Scene]) -> Result<Vec<Prompt>, ApiError>;
    async fn generate_images(&self, prompts: &[Prompt]) -> Result<Vec<Image>, ApiError>;
    /// Returns the narration filename.
    async fn generate_audio(&self, script: &str) -> Result<String, ApiError>;
    /// Returns the video (or slideshow) filename.
    async fn create_video(&self, image_files: &[String], audio_file: &str)
        -> Result<String, ApiError>;
    async fn download(&self, filename: &str) -> Result<Vec<u8>, ApiError>;

    fn asset_links(&self) -> AssetLinks;
}

// --- Wire format ---

#[derive(Serialize)]
struct ScriptRequest<'a> {
    script: &'a str,
}

#[derive(Serialize)]
struct ToggleRequest {
    use_groq: bool,
}

#[derive(Serialize)]
struct ScenesRequest<'a> {
    scenes: &'a [Scene],
}

#[derive(Serialize)]
struct PromptsRequest<'a> {
    prompts: &'a [Prompt],
}

#[derive(Serialize)]
struct VideoRequest<'a> {
    image_files: &'a [String],
    audio_file: &'a str,
}

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    level: String,
}

#[derive(Debug, Deserialize)]
struct SplitResponse {
    scenes: Vec<Scene>,
}

#[derive(Debug, Deserialize)]
struct PromptsResponse {
    prompts: Vec<Prompt>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct AudioResponse {
    audio_filename: String,
}

#[derive(Debug, Deserialize)]
struct VideoResponse {
    video_filename: String,
}

/// Decodes the `{success, error?, ...}` envelope every endpoint answers with.
pub fn decode_envelope<T: DeserializeOwned>(body: &str, fallback: &str) -> Result<T, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Malformed(format!("invalid JSON: {}", e)))?;

    match value.get("success").and_then(Value::as_bool) {
        Some(true) => serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string())),
        Some(false) => {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .filter(|e| !e.is_empty())
                .unwrap_or(fallback);
            Err(ApiError::Backend(message.to_string()))
        }
        None => Err(ApiError::Malformed("missing `success` flag".to_string())),
    }
}

// --- HTTP ---

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    links: AssetLinks,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .context(format!("Invalid backend url: {}", config.base_url))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            links: AssetLinks::new(base_url.as_str())?,
            base_url,
            // No timeout: video assembly can take minutes.
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Transport(format!("bad endpoint {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        let resp = self.client.get(url).send().await.map_err(transport)?;
        Self::read_envelope(resp, fallback).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        Self::read_envelope(resp, fallback).await
    }

    async fn read_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;

        // Error pages from a proxy or the dev server are not the backend talking.
        match decode_envelope(&body, fallback) {
            Err(ApiError::Malformed(_)) if !status.is_success() => {
                Err(ApiError::Transport(format!("HTTP {}", status)))
            }
            other => other,
        }
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Backend for HttpBackend {
    async fn get_status(&self) -> Result<EnhancementStatus, ApiError> {
        self.get_json("get-status", STATUS_FALLBACK).await
    }

    async fn toggle_enhancement(&self, use_groq: bool) -> Result<String, ApiError> {
        let resp: ToggleResponse = self
            .post_json("toggle-enhancement", &ToggleRequest { use_groq }, TOGGLE_FALLBACK)
            .await?;
        Ok(resp.level)
    }

    async fn split_script(&self, script: &str) -> Result<Vec<Scene>, ApiError> {
        let resp: SplitResponse = self
            .post_json(
                "split-script",
                &ScriptRequest { script },
                Stage::SplitScript.fallback_error(),
            )
            .await?;
        Ok(resp.scenes)
    }

    async fn generate_prompts(&self, scenes: &[Scene]) -> Result<Vec<Prompt>, ApiError> {
        let resp: PromptsResponse = self
            .post_json(
                "generate-prompts",
                &ScenesRequest { scenes },
                Stage::GeneratePrompts.fallback_error(),
            )
            .await?;
        Ok(resp.prompts)
    }

    async fn generate_images(&self, prompts: &[Prompt]) -> Result<Vec<Image>, ApiError> {
        let resp: ImagesResponse = self
            .post_json(
                "generate-images",
                &PromptsRequest { prompts },
                Stage::GenerateImages.fallback_error(),
            )
            .await?;
        Ok(resp.images)
    }

    async fn generate_audio(&self, script: &str) -> Result<String, ApiError> {
        let resp: AudioResponse = self
            .post_json(
                "generate-audio",
                &ScriptRequest { script },
                Stage::GenerateAudio.fallback_error(),
            )
            .await?;
        Ok(resp.audio_filename)
    }

    async fn create_video(&self, image_files: &[String], audio_file: &str) -> Result<String, ApiError> {
        let resp: VideoResponse = self
            .post_json(
                "create-video",
                &VideoRequest {
                    image_files,
                    audio_file,
                },
                Stage::CreateVideo.fallback_error(),
            )
            .await?;
        Ok(resp.video_filename)
    }

    async fn download(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.links.download_url(filename);
        debug!("GET {}", url);
        let resp = self.client.get(&url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Transport(format!("HTTP {} for {}", status, filename)));
        }
        let bytes = resp.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }

    fn asset_links(&self) -> AssetLinks {
        self.links.clone()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success_payload() {
        let body = r#"{"success": true, "scenes": [{"scene_number": 1, "scene_text": "Intro."}]}"#;
        let resp: SplitResponse = decode_envelope(body, "fallback").unwrap();
        assert_eq!(resp.scenes.len(), 1);
        assert_eq!(resp.scenes[0].scene_text, "Intro.");
    }

    #[test]
    fn test_decode_backend_error_is_verbatim() {
        let body = r#"{"success": false, "error": "Script too long (max 5000 chars)"}"#;
        let err = decode_envelope::<SplitResponse>(body, "fallback").unwrap_err();
        assert_eq!(err, ApiError::Backend("Script too long (max 5000 chars)".to_string()));
    }

    #[test]
    fn test_decode_backend_error_without_message_uses_fallback() {
        let err = decode_envelope::<SplitResponse>(r#"{"success": false}"#, "Failed to split script")
            .unwrap_err();
        assert_eq!(err, ApiError::Backend("Failed to split script".to_string()));
    }

    #[test]
    fn test_decode_missing_field_is_malformed() {
        let err = decode_envelope::<AudioResponse>(r#"{"success": true}"#, "f").unwrap_err();
        assert!(matches!(err, ApiError::Malformed(msg) if msg.contains("audio_filename")));
    }

    #[test]
    fn test_decode_missing_success_flag_is_malformed() {
        let err = decode_envelope::<AudioResponse>(r#"{"audio_filename": "a.mp3"}"#, "f").unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[test]
    fn test_decode_non_json_is_malformed() {
        let err = decode_envelope::<AudioResponse>("<html>500</html>", "f").unwrap_err();
        assert!(matches!(err, ApiError::Malformed(msg) if msg.starts_with("invalid JSON")));
    }

    #[test]
    fn test_status_response_field_names() {
        let status: EnhancementStatus = decode_envelope(
            r#"{"success": true, "groq_enabled": true, "level": "Level 2 (Groq Enhanced)"}"#,
            STATUS_FALLBACK,
        )
        .unwrap();
        assert!(status.enabled);
        assert_eq!(status.level, "Level 2 (Groq Enhanced)");
    }

    #[test]
    fn test_video_request_shape() {
        let files = vec!["a.png".to_string()];
        let body = serde_json::to_value(VideoRequest {
            image_files: &files,
            audio_file: "narration.mp3",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"image_files": ["a.png"], "audio_file": "narration.mp3"})
        );
    }
}
