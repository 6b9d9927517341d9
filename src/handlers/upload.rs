use crate::config::UploadsConfig;
use crate::error::AppError;
use crate::models::UploadResponse;
use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;
use std::path::Path;

#[derive(Debug, MultipartForm)]
pub struct UploadForm {
    #[multipart(limit = "10MB")]
    pub image: TempFile,
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Image stored, URL returned", body = UploadResponse),
        (status = 400, description = "Missing or non-image file")
    )
)]
pub async fn upload_image(
    uploads: web::Data<UploadsConfig>,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> Result<HttpResponse> {
    let is_image = form
        .image
        .content_type
        .as_ref()
        .map(|ct| ct.to_string().starts_with("image/"))
        .unwrap_or(false);

    if !is_image {
        return Ok(
            AppError::ValidationError("Only image uploads are allowed".to_string())
                .error_response(),
        );
    }

    let file_name = stored_file_name(form.image.file_name.as_deref());

    // Copy rather than persist: the temp file usually lives on another
    // filesystem than the uploads directory.
    let source = form.image.file.path().to_path_buf();
    let dest = Path::new(&uploads.dir).join(&file_name);
    let copied = web::block(move || std::fs::copy(&source, &dest)).await;

    match copied {
        Ok(Ok(_)) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": UploadResponse {
                url: format!("/uploads/{file_name}"),
            }
        }))),
        Ok(Err(e)) => {
            Ok(AppError::InternalError(format!("Failed to store upload: {e}")).error_response())
        }
        Err(e) => {
            Ok(AppError::InternalError(format!("Failed to store upload: {e}")).error_response())
        }
    }
}

/// Generated name plus the sanitized extension of the client file name.
fn stored_file_name(original: Option<&str>) -> String {
    let ext = original
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    let stem = uuid::Uuid::new_v4().simple().to_string();
    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

pub fn upload_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/upload", web::post().to(upload_image));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_file_name_keeps_extension() {
        let name = stored_file_name(Some("photo.JPG"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_stored_file_name_drops_suspicious_extension() {
        assert!(!stored_file_name(Some("a.b/../c")).contains('/'));
        assert!(!stored_file_name(None).contains('.'));
    }
}
