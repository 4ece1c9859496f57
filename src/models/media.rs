use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MediaItem {
    pub id: i64,
    /// Name on disk inside the uploads directory.
    pub filename: String,
    pub original_name: String,
    pub mime: String,
    pub size: u64,
    #[serde(default)]
    pub alt: String,
    pub uploaded_at: NaiveDateTime,
}

impl Record for MediaItem {
    fn id(&self) -> i64 {
        self.id
    }
}

impl MediaItem {
    pub fn url(&self) -> String {
        format!("/uploads/{}", self.filename)
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

pub fn mime_for_ext(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "txt" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

/// Extension check against the comma separated `media_allowed_types` setting.
pub fn is_allowed_ext(ext: &str, allowed: &str) -> bool {
    !ext.is_empty()
        && allowed
            .split(',')
            .map(str::trim)
            .any(|a| a.eq_ignore_ascii_case(ext))
}
