use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

/// Errors that can occur while storing or removing uploaded images.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    #[error("image URL does not point into the uploads directory: {0}")]
    OutsideUploads(String),
}

/// Which entity an uploaded image belongs to. Decides the subdirectory
/// and filename prefix, matching the public URL layout.
#[derive(Clone, Copy, Debug)]
pub enum ImageKind {
    Ingredient,
    Recipe,
}

impl ImageKind {
    fn dir(self) -> &'static str {
        match self {
            ImageKind::Ingredient => "ingredients",
            ImageKind::Recipe => "recipes",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ImageKind::Ingredient => "ingredient",
            ImageKind::Recipe => "recipe",
        }
    }
}

/// Filesystem store for uploaded entity images.
///
/// Images live under `{public_dir}/uploads/{ingredients,recipes}/` and are
/// addressed by their public URL path (`/uploads/...`), which is what gets
/// persisted in the database.
pub struct ImageStore {
    public_dir: PathBuf,
    max_size: u64,
}

impl ImageStore {
    pub async fn new(public_dir: PathBuf, max_size: u64) -> Result<Self, ImageError> {
        fs::create_dir_all(public_dir.join("uploads").join("ingredients")).await?;
        fs::create_dir_all(public_dir.join("uploads").join("recipes")).await?;
        fs::create_dir_all(public_dir.join("uploads").join(".tmp")).await?;
        Ok(Self {
            public_dir,
            max_size,
        })
    }

    /// Write an uploaded image and return its public URL path.
    ///
    /// The stored name is `{prefix}-{unix millis}-{random}{.ext}`; the
    /// extension is taken from the client filename only when it maps to an
    /// `image/*` MIME type, so client-controlled names cannot smuggle in
    /// odd suffixes.
    pub async fn save(
        &self,
        kind: ImageKind,
        original_name: Option<&str>,
        data: &[u8],
    ) -> Result<String, ImageError> {
        if data.len() as u64 > self.max_size {
            return Err(ImageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let ext = original_name.and_then(safe_image_extension);
        let file_name = format!(
            "{}-{}-{}{}",
            kind.prefix(),
            chrono::Utc::now().timestamp_millis(),
            &uuid::Uuid::new_v4().simple().to_string()[..8],
            ext.map(|e| format!(".{e}")).unwrap_or_default(),
        );

        let final_path = self
            .public_dir
            .join("uploads")
            .join(kind.dir())
            .join(&file_name);

        // Write through a temp file so a crash never leaves a partial image
        // at a URL the database might already reference.
        let temp_path = self
            .public_dir
            .join("uploads")
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string());
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(format!("/uploads/{}/{}", kind.dir(), file_name))
    }

    /// Delete the file behind a public URL. Returns whether a file was
    /// removed. URLs outside the uploads tree are rejected.
    pub async fn remove(&self, url: &str) -> Result<bool, ImageError> {
        let rel = url.strip_prefix('/').unwrap_or(url);
        if !rel.starts_with("uploads/") || contains_path_traversal(rel) || rel.contains('\\') {
            return Err(ImageError::OutsideUploads(url.to_string()));
        }

        match fs::remove_file(self.public_dir.join(rel)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the file behind a public URL currently exists.
    pub async fn exists(&self, url: &str) -> bool {
        let rel = url.strip_prefix('/').unwrap_or(url);
        fs::try_exists(self.public_dir.join(rel))
            .await
            .unwrap_or(false)
    }
}

/// Best-effort image cleanup used around entity updates and deletes.
/// Skips absent and placeholder URLs; failures are logged, never propagated.
pub async fn discard_image(store: &ImageStore, url: Option<&str>, placeholder: &str) {
    let Some(url) = url else { return };
    if url == placeholder {
        return;
    }
    if let Err(e) = store.remove(url).await {
        tracing::warn!("Failed to delete image {url}: {e}");
    }
}

/// Extension of `name`, lowercased, when it maps to an `image/*` MIME type.
fn safe_image_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    let mime = mime_guess::from_ext(&ext).first()?;
    (mime.type_() == mime_guess::mime::IMAGE).then_some(ext)
}

/// Checks if a path string contains path traversal patterns.
fn contains_path_traversal(path: &str) -> bool {
    path == ".."
        || path.starts_with("../")
        || path.contains("/../")
        || path.ends_with("/..")
}
