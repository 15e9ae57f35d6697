// src/utils/input.rs

//! Loading of user-supplied import material from disk.
//!
//! - File mode: one text file read as UTF-8
//! - Scan mode: one or more page images encoded as data-URLs

use std::path::{Path, PathBuf};

use futures::future::try_join_all;

use crate::error::{AppError, Result};
use crate::models::InputConfig;
use crate::utils::data_url::{DEFAULT_IMAGE_MIME, encode_data_url};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Guess an image MIME type from a file extension.
pub fn image_mime_for(path: &Path) -> &'static str {
    match extension_of(path).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        _ => DEFAULT_IMAGE_MIME,
    }
}

/// Decode bytes as UTF-8, skipping a leading byte-order mark.
pub fn decode_text(bytes: Vec<u8>) -> std::result::Result<String, std::string::FromUtf8Error> {
    if bytes.starts_with(&UTF8_BOM) {
        String::from_utf8(bytes[UTF8_BOM.len()..].to_vec())
    } else {
        String::from_utf8(bytes)
    }
}

/// Read a text file for file-mode import.
pub async fn read_text_file(path: &Path, config: &InputConfig) -> Result<String> {
    match extension_of(path) {
        Some(ext) if config.warn_extensions.contains(&ext) => {
            log::warn!(
                "{}: convert to .txt for best results",
                path.display()
            );
        }
        Some(ext) if config.text_extensions.contains(&ext) => {}
        _ => log::debug!("Reading {} as plain text", path.display()),
    }

    let bytes = tokio::fs::read(path).await?;
    decode_text(bytes).map_err(|e| {
        AppError::validation(format!("{} is not valid UTF-8 text: {}", path.display(), e))
    })
}

async fn read_image(path: PathBuf) -> Result<String> {
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        AppError::validation(format!("Unable to read image {}: {}", path.display(), e))
    })?;
    Ok(encode_data_url(image_mime_for(&path), &bytes))
}

/// Read page images for scan-mode import, preserving the given order.
///
/// Fails as a whole if any image cannot be read.
pub async fn read_image_files(paths: &[PathBuf], config: &InputConfig) -> Result<Vec<String>> {
    if paths.len() > config.max_images {
        return Err(AppError::validation(format!(
            "At most {} images can be analyzed at once ({} given).",
            config.max_images,
            paths.len()
        )));
    }

    let urls = try_join_all(paths.iter().cloned().map(read_image)).await?;
    log::debug!("Encoded {} page images", urls.len());
    Ok(urls)
}
