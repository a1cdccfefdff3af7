//! HTML fragments for each panel. All text coming from the backend is
//! escaped before it lands in markup.

use crate::core::model::VideoKind;
use crate::core::view::{
    AudioView, EnhancementView, GalleryItem, GalleryView, OutputView, PromptCard,
};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn enhancement(view: &EnhancementView) -> String {
    format!(
        r#"<div class="enhancement-status"><span class="level">{}</span><p class="level-description">{}</p></div>"#,
        escape(&view.level),
        escape(view.description)
    )
}

pub fn prompts(cards: &[PromptCard]) -> String {
    cards
        .iter()
        .map(|card| {
            format!(
                concat!(
                    r#"<div class="prompt-item">"#,
                    r#"<div class="prompt-header"><span class="scene-number">{}</span></div>"#,
                    r#"<div class="scene-text"><strong>Original Text:</strong><br>{}</div>"#,
                    r#"<div class="prompt-text"><strong>Generated Prompt:</strong><br>{}</div>"#,
                    "</div>"
                ),
                escape(&card.heading),
                escape(&card.scene_text),
                escape(&card.prompt)
            )
        })
        .collect()
}

pub fn gallery(view: &GalleryView) -> String {
    let mut out = String::from(r#"<div class="image-grid">"#);
    for item in &view.items {
        match item {
            GalleryItem::Generated { caption, filename, view_url, download_url } => {
                out.push_str(&format!(
                    concat!(
                        r#"<div class="image-item">"#,
                        r#"<img src="{url}" alt="{caption}" title="{filename}">"#,
                        r#"<div class="image-info"><h4>{caption}</h4><p>Generated successfully</p>"#,
                        r#"<a href="{url}" target="_blank">View Full Size</a> "#,
                        r#"<a href="{download}" download>Download</a></div>"#,
                        "</div>"
                    ),
                    url = escape(view_url),
                    caption = escape(caption),
                    filename = escape(filename),
                    download = escape(download_url),
                ));
            }
            GalleryItem::Failed { caption, error } => {
                out.push_str(&format!(
                    concat!(
                        r#"<div class="image-item image-error">"#,
                        "<h4>{}</h4><p>Error: {}</p>",
                        r#"<p class="hint">Using fallback image generation...</p>"#,
                        "</div>"
                    ),
                    escape(caption),
                    escape(error)
                ));
            }
        }
    }
    out.push_str("</div>");

    out.push_str(r#"<div class="image-summary"><h4>Image Generation Complete</h4>"#);
    out.push_str(&format!("<p>{}</p>", escape(&view.summary.headline())));
    if let Some(note) = view.summary.fallback_note() {
        out.push_str(&format!(r#"<p class="fallback-note">{}</p>"#, escape(&note)));
    }
    out.push_str("</div>");
    out
}

fn audio_player(url: &str) -> String {
    format!(
        r#"<audio controls><source src="{}" type="audio/mpeg">Your browser does not support the audio element.</audio>"#,
        escape(url)
    )
}

pub fn audio(view: &AudioView) -> String {
    format!(
        concat!(
            r#"<div class="audio-result"><h4>Narration Audio Generated</h4>"#,
            r#"<div class="audio-player">{}</div>"#,
            "<p><strong>Audio file:</strong> {}</p>",
            "</div>"
        ),
        audio_player(&view.url),
        escape(&view.filename)
    )
}

pub fn output(view: &OutputView) -> String {
    let video = match view.video_kind {
        VideoKind::Slideshow => format!(
            r#"<h5>Interactive Slideshow</h5><iframe src="{}" width="100%" height="600" frameborder="0"></iframe>"#,
            escape(&view.video_url)
        ),
        VideoKind::Video => format!(
            r#"<h5>Teaching Video</h5><video controls><source src="{}" type="video/mp4">Your browser does not support the video element.</video>"#,
            escape(&view.video_url)
        ),
    };

    let images: String = view
        .gallery
        .iter()
        .map(|img| {
            format!(
                r#"<div class="gallery-item"><img src="{url}" alt="{caption}"><p>{caption}</p></div>"#,
                url = escape(&img.url),
                caption = escape(&img.caption),
            )
        })
        .collect();

    let links: String = view
        .downloads
        .iter()
        .map(|link| {
            format!(
                r#"<a href="{}" class="download-link" download>{}</a>"#,
                escape(&link.url),
                escape(&link.label)
            )
        })
        .collect();

    format!(
        concat!(
            r#"<div class="download-section"><h4>Your Teaching Content is Ready!</h4>"#,
            r#"<div class="video-display">{}</div>"#,
            r#"<div class="audio-display"><h5>Narration Audio</h5>{}</div>"#,
            r#"<div class="images-gallery"><h5>Generated Images</h5><div class="gallery-grid">{}</div></div>"#,
            r#"<div class="download-links-section"><h5>Download Files</h5><div class="download-links">{}</div></div>"#,
            "</div>"
        ),
        video,
        audio_player(&view.audio_url),
        images,
        links
    )
}

/// Standalone page for an exported lesson.
pub fn page(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n",
            "<body>\n{}\n</body>\n</html>\n"
        ),
        escape(title),
        body
    )
}
