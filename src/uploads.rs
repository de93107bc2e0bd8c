use std::path::Path;

use tokio::fs;

use crate::models::DEFAULT_PRODUCT_IMAGE;

/// What happened to an image file a deleted or edited record pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleanup {
    Removed,
    /// Nothing on disk under that name.
    Missing,
    /// Shared placeholder or an empty reference; left alone.
    Skipped,
    Failed(String),
}

/// Delete an uploaded image. Never fails the caller; a failure is logged
/// and reported in the returned [`Cleanup`].
pub async fn remove_image(upload_dir: &Path, image: &str) -> Cleanup {
    // Records may store "uploads/<name>"; only the last component is ours.
    let Some(file_name) = Path::new(image).file_name() else {
        return Cleanup::Skipped;
    };
    if file_name == DEFAULT_PRODUCT_IMAGE {
        return Cleanup::Skipped;
    }

    let path = upload_dir.join(file_name);
    match fs::remove_file(&path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed image");
            Cleanup::Removed
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Cleanup::Missing,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "image cleanup failed");
            Cleanup::Failed(err.to_string())
        }
    }
}
