// SPDX-License-Identifier: GPL-3.0-only

//! Storage for composites
//!
//! The downloadable result always lands as `photobooth.png` in the output
//! directory; saving again overwrites the previous composite the way a
//! repeated browser download would shadow it.

use crate::config::Config;
use crate::constants::{DEFAULT_SAVE_FOLDER, OUTPUT_FILENAME};
use crate::errors::BoothResult;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Default directory for saved composites
pub fn default_output_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_SAVE_FOLDER)
}

/// The output directory, honoring the config override
pub fn resolve_output_dir(config: &Config) -> PathBuf {
    config
        .output_dir
        .clone()
        .unwrap_or_else(default_output_dir)
}

/// Write the encoded composite to `dir/photobooth.png`
pub async fn save_composite(png: Arc<[u8]>, dir: PathBuf) -> BoothResult<PathBuf> {
    let filepath = dir.join(OUTPUT_FILENAME);

    info!(path = %filepath.display(), "Saving composite");

    let filepath_clone = filepath.clone();
    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(filepath_clone.parent().unwrap_or(&filepath_clone))?;
        std::fs::write(&filepath_clone, &png)?;
        Ok::<_, std::io::Error>(())
    })
    .await
    .map_err(|e| crate::errors::BoothError::Storage(format!("Save task error: {}", e)))??;

    info!(path = %filepath.display(), "Composite saved");
    Ok(filepath)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dir_uses_save_folder() {
        assert!(default_output_dir().ends_with(DEFAULT_SAVE_FOLDER));
    }

    #[test]
    fn test_config_override_wins() {
        let mut config = Config::default();
        config.output_dir = Some(PathBuf::from("/tmp/booth-out"));

        assert_eq!(resolve_output_dir(&config), PathBuf::from("/tmp/booth-out"));
    }

    #[tokio::test]
    async fn test_save_writes_and_overwrites() {
        let dir = std::env::temp_dir().join(format!("photobooth-save-{}", std::process::id()));

        let first: Arc<[u8]> = Arc::from(vec![1u8, 2, 3].into_boxed_slice());
        let path = save_composite(Arc::clone(&first), dir.clone()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        assert!(path.ends_with(OUTPUT_FILENAME));

        let second: Arc<[u8]> = Arc::from(vec![9u8].into_boxed_slice());
        let path = save_composite(second, dir.clone()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![9]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
