//! Media service for image uploads.

use image::ImageFormat;
use plaza_common::{generate_storage_key, AppError, AppResult, StorageBackend, UploadedFile};
use std::sync::Arc;

/// What an upload is for. Each kind has its own size ceiling and
/// storage prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Profile avatar, 2 MiB.
    Avatar,
    /// Profile cover image, 5 MiB.
    Cover,
    /// Post image, 8 MiB.
    Post,
    /// Group post image, 8 MiB.
    GroupPost,
}

impl UploadKind {
    /// Maximum accepted size in bytes.
    #[must_use]
    pub const fn max_bytes(self) -> usize {
        match self {
            Self::Avatar => 2 * 1024 * 1024,
            Self::Cover => 5 * 1024 * 1024,
            Self::Post | Self::GroupPost => 8 * 1024 * 1024,
        }
    }

    /// Storage key prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Avatar => "avatars",
            Self::Cover => "covers",
            Self::Post => "posts",
            Self::GroupPost => "groups",
        }
    }
}

/// An upload that passed format sniffing and the size check.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedImage {
    /// Detected format.
    pub format: ImageFormat,
    /// MIME type for the detected format.
    pub content_type: &'static str,
}

/// Media service validating and storing image uploads.
#[derive(Clone)]
pub struct MediaService {
    storage: Arc<dyn StorageBackend>,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Validate an upload by content sniffing.
    ///
    /// Only JPEG and PNG are accepted. The decision is made from the
    /// bytes, never from the file extension.
    pub fn validate(kind: UploadKind, data: &[u8]) -> AppResult<ValidatedImage> {
        if data.is_empty() {
            return Err(AppError::Validation("Empty upload".to_string()));
        }
        if data.len() > kind.max_bytes() {
            return Err(AppError::Validation(format!(
                "File too large. Maximum size is {} bytes",
                kind.max_bytes()
            )));
        }

        match image::guess_format(data) {
            Ok(ImageFormat::Jpeg) => Ok(ValidatedImage {
                format: ImageFormat::Jpeg,
                content_type: "image/jpeg",
            }),
            Ok(ImageFormat::Png) => Ok(ValidatedImage {
                format: ImageFormat::Png,
                content_type: "image/png",
            }),
            _ => Err(AppError::Validation(
                "Only JPEG and PNG images are accepted".to_string(),
            )),
        }
    }

    /// Validate and store an upload, returning the stored file.
    ///
    /// Nothing is written when validation fails.
    pub async fn store(
        &self,
        kind: UploadKind,
        user_id: &str,
        original_name: &str,
        data: &[u8],
    ) -> AppResult<UploadedFile> {
        let validated = Self::validate(kind, data)?;
        let key = generate_storage_key(kind.prefix(), user_id, original_name);
        let stored = self.storage.upload(&key, data, validated.content_type).await?;

        tracing::debug!(key = %stored.key, size = stored.size, content_type = %stored.content_type, "Stored upload");

        Ok(stored)
    }
}
