//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::cache;
use crate::SpaceTraveling;

/// Clean the public directory and the generation cache
pub fn run(app: &SpaceTraveling) -> Result<()> {
    if app.public_dir.exists() {
        fs::remove_dir_all(&app.public_dir)?;
        tracing::info!("Deleted: {:?}", app.public_dir);
    }

    cache::clear(&app.base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_output_and_cache() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("public/post/x")).unwrap();
        cache::CacheDb::new().save(dir.path()).unwrap();

        let app = SpaceTraveling::new(dir.path()).unwrap();
        run(&app).unwrap();

        assert!(!dir.path().join("public").exists());
        assert!(!dir.path().join(cache::CACHE_DIR).exists());
        // cleaning twice is fine
        run(&app).unwrap();
    }
}
