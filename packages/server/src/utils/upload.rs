use std::path::Path;

use tokio::fs;

use crate::error::AppError;

/// Maximum accepted photo size (8 MB).
pub const MAX_PHOTO_SIZE: usize = 8 * 1024 * 1024;

/// Extract a safe lowercase image extension from an uploaded filename.
///
/// Returns `None` when the filename has no extension or the extension does
/// not map to an `image/*` MIME type. The extension is the only part of the
/// client-supplied filename that survives into the stored name, so path
/// separators and traversal in the original name are irrelevant.
pub fn image_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let mime = mime_guess::from_ext(ext).first()?;
    if mime.type_() == mime_guess::mime::IMAGE {
        Some(ext.to_ascii_lowercase())
    } else {
        None
    }
}

/// Write an uploaded photo to the uploads directory and return its public URL.
///
/// Stored as `{unix_millis}-{uuid}.{ext}`, written to a temp file first and
/// renamed into place so a crashed request never leaves a partial photo
/// visible under `/uploads`.
pub async fn store_photo(
    uploads_dir: &Path,
    original_filename: &str,
    data: &[u8],
) -> Result<String, AppError> {
    if data.is_empty() {
        return Err(AppError::Validation("Photo file is empty".into()));
    }
    if data.len() > MAX_PHOTO_SIZE {
        return Err(AppError::Validation("Photo exceeds the 8MB size limit".into()));
    }

    let ext = image_extension(original_filename)
        .ok_or_else(|| AppError::Validation("Photo must be an image file".into()))?;

    let filename = format!(
        "{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4(),
        ext
    );

    fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create uploads dir: {e}")))?;

    let final_path = uploads_dir.join(&filename);
    let temp_path = uploads_dir.join(format!(".tmp-{}", uuid::Uuid::new_v4()));

    if let Err(e) = fs::write(&temp_path, data).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(AppError::Internal(format!("Failed to write photo: {e}")));
    }
    if let Err(e) = fs::rename(&temp_path, &final_path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(AppError::Internal(format!("Failed to store photo: {e}")));
    }

    Ok(format!("/uploads/{filename}"))
}
