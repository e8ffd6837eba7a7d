//! Recipe images on disk.
//!
//! Images live under `<root>/images/recipes/` and are referenced by their path
//! relative to `root`, which is the directory served at `/static`. Every save
//! gets its own file, named from a content digest plus a random suffix, so a
//! reference is owned by exactly one recipe and removing it never takes an
//! image another recipe still shows.

use std::io;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

const RECIPE_DIR: &str = "images/recipes";

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes the image and returns its reference.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        let digest = format!("{:x}", Sha256::digest(bytes));
        let suffix = Uuid::new_v4().simple().to_string();
        let reference = format!(
            "{RECIPE_DIR}/{}-{}_{}",
            &digest[..16],
            &suffix[..8],
            sanitize_file_name(original_name)
        );

        fs::create_dir_all(self.root.join(RECIPE_DIR)).await?;
        fs::write(self.root.join(&reference), bytes).await?;
        debug!(%reference, size = bytes.len(), "Stored recipe image");
        Ok(reference)
    }

    /// Deletes the image behind `reference`. A missing file is not an error.
    pub async fn remove(&self, reference: &str) -> io::Result<()> {
        let path = self.resolve(reference)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%reference, "Removed recipe image");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn resolve(&self, reference: &str) -> io::Result<PathBuf> {
        let relative = Path::new(reference);
        let inside = relative.starts_with(RECIPE_DIR)
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !inside {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a recipe image: {reference}"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

/// Keeps the last path segment and replaces anything outside `[A-Za-z0-9._-]`.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> ImageStore {
        ImageStore::new(std::env::temp_dir().join(format!("recipe-images-{}", Uuid::new_v4())))
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Mac & Cheese.jpg"), "Mac___Cheese.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\soup.png"), "soup.png");
        assert_eq!(sanitize_file_name(".."), "image");
        assert_eq!(sanitize_file_name(""), "image");
    }

    #[tokio::test]
    async fn test_save_then_remove() {
        let store = temp_store();
        let reference = store.save("soup.png", b"png bytes").await.expect("save");
        assert!(reference.starts_with("images/recipes/"));
        assert!(reference.ends_with("_soup.png"));
        assert_eq!(
            fs::read(store.root.join(&reference)).await.expect("read"),
            b"png bytes"
        );

        store.remove(&reference).await.expect("remove");
        assert!(!store.root.join(&reference).exists());
        // Second removal of the same reference is a no-op
        store.remove(&reference).await.expect("remove again");

        let _ = fs::remove_dir_all(&store.root).await;
    }

    #[tokio::test]
    async fn test_same_name_different_content_does_not_collide() {
        let store = temp_store();
        let first = store.save("photo.jpg", b"one").await.expect("save");
        let second = store.save("photo.jpg", b"two").await.expect("save");
        assert_ne!(first, second);
        let _ = fs::remove_dir_all(&store.root).await;
    }

    #[tokio::test]
    async fn test_identical_uploads_get_separate_files() {
        let store = temp_store();
        let first = store.save("pie.png", b"same bytes").await.expect("save");
        let second = store.save("pie.png", b"same bytes").await.expect("save");
        assert_ne!(first, second);

        store.remove(&first).await.expect("remove");
        assert!(!store.root.join(&first).exists());
        assert_eq!(
            fs::read(store.root.join(&second)).await.expect("read"),
            b"same bytes"
        );
        let _ = fs::remove_dir_all(&store.root).await;
    }

    #[tokio::test]
    async fn test_remove_rejects_paths_outside_recipe_dir() {
        let store = temp_store();
        for reference in ["../secret.txt", "images/recipes/../../secret.txt", "style.css"] {
            let err = store.remove(reference).await.expect_err("rejected");
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
    }
}
