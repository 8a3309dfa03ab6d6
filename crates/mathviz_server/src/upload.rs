//! Multipart form parsing for the upload endpoints.

use axum::extract::Multipart;
use mathviz_core::{ImageSource, VisualizationRequest};

use crate::error::{ServerError, ServerResult};

pub const QUESTION_FIELD: &str = "question";
pub const IMAGE_FIELD: &str = "image_file";

/// Read `question` and an optional `image_file` from a multipart form.
///
/// Unknown fields are ignored. A file part with no bytes counts as absent.
pub async fn read_form(mut multipart: Multipart) -> ServerResult<VisualizationRequest> {
    let mut question = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some(QUESTION_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;
                question = Some(text);
            }
            Some(IMAGE_FIELD) => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let declared = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;

                if !data.is_empty() {
                    let media_type = declared
                        .filter(|t| t.starts_with("image/"))
                        .unwrap_or_else(|| media_type_for(&file_name).to_string());
                    image = Some(ImageSource::Upload {
                        file_name,
                        media_type,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let question =
        question.ok_or_else(|| ServerError::BadRequest("Missing 'question' field".to_string()))?;
    let mut request = VisualizationRequest::new(question);
    request.image = image;
    Ok(request)
}

/// Image media type guessed from a file extension.
pub fn media_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/png",
    }
}

/// Content type of a rendered video, by extension.
pub fn video_content_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
