//! Cache module for incremental generation
//!
//! Tracks a content hash per generated post page so a regeneration only
//! rewrites pages whose content or neighbors changed.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Cache directory, relative to the site root
pub const CACHE_DIR: &str = ".spacetraveling-cache";
const CACHE_FILE: &str = "db.json";

/// A generated post page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Hash of everything the page shows
    pub content_hash: u64,
    /// Output path relative to the public dir
    pub output_path: String,
}

/// Cache database for tracking content changes
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// Hash of the site config and generator version (changes trigger full rebuild)
    pub config_hash: u64,
    /// Entries keyed by post uid
    pub posts: HashMap<String, CacheEntry>,
    /// Hash of the post list shown on the index page
    pub index_hash: u64,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_DIR).join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            match serde_json::from_str::<CacheDb>(&content) {
                Ok(cache) if cache.version == Self::VERSION => return cache,
                Ok(_) => tracing::info!("Cache version mismatch, rebuilding cache"),
                Err(e) => tracing::warn!("Ignoring unreadable cache {:?}: {}", cache_path, e),
            }
        }
        Self::default()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_dir = base_dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_dir.join(CACHE_FILE), content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Whether nothing was generated yet
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.index_hash == 0
    }
}

/// Remove the cache directory
pub fn clear(base_dir: &Path) -> Result<()> {
    let cache_dir = base_dir.join(CACHE_DIR);
    if cache_dir.exists() {
        fs::remove_dir_all(&cache_dir)?;
        tracing::info!("Deleted: {:?}", cache_dir);
    }
    Ok(())
}

/// Change detection result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Posts that need regeneration (uid)
    pub changed_posts: Vec<String>,
    /// Posts that disappeared from the CMS (uid)
    pub deleted_posts: Vec<String>,
    /// Whether the index page needs regeneration
    pub rebuild_index: bool,
    /// Whether to regenerate everything
    pub full_rebuild: bool,
}

impl ChangeSet {
    /// Create a changeset indicating full rebuild is needed
    pub fn full_rebuild() -> Self {
        Self {
            rebuild_index: true,
            full_rebuild: true,
            ..Default::default()
        }
    }

    /// Create an empty changeset (no changes)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if any changes were detected
    pub fn has_changes(&self) -> bool {
        self.full_rebuild
            || self.rebuild_index
            || !self.changed_posts.is_empty()
            || !self.deleted_posts.is_empty()
    }

    /// Whether the page of `uid` must be written
    pub fn needs_post(&self, uid: &str) -> bool {
        self.full_rebuild || self.changed_posts.iter().any(|u| u == uid)
    }

    /// Get summary of changes for logging
    pub fn summary(&self) -> String {
        if self.full_rebuild {
            return "full rebuild required".to_string();
        }

        let mut parts = Vec::new();
        if !self.changed_posts.is_empty() {
            parts.push(format!("{} posts changed", self.changed_posts.len()));
        }
        if !self.deleted_posts.is_empty() {
            parts.push(format!("{} posts deleted", self.deleted_posts.len()));
        }
        if self.rebuild_index {
            parts.push("index page".to_string());
        }

        if parts.is_empty() {
            "no changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Calculate a hash for any hashable value
pub fn hash_value<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Calculate a hash for text content
pub fn hash_content(content: &str) -> u64 {
    hash_value(content)
}

/// Hash of the config file combined with the generator version.
/// A missing file hashes like an empty one.
pub fn hash_config(config_path: &Path) -> u64 {
    let content = fs::read_to_string(config_path).unwrap_or_default();
    hash_value(&(env!("CARGO_PKG_VERSION"), content))
}

/// Detect changes between the current posts `(uid, hash)` and the cache
pub fn detect_changes(
    cache: &CacheDb,
    config_hash: u64,
    current_posts: &[(String, u64)],
    index_hash: u64,
) -> ChangeSet {
    if cache.config_hash != config_hash {
        tracing::info!("Config changed, full rebuild required");
        return ChangeSet::full_rebuild();
    }

    let mut changeset = ChangeSet::empty();

    for (uid, hash) in current_posts {
        match cache.posts.get(uid) {
            Some(cached) if cached.content_hash == *hash => {}
            Some(_) => {
                tracing::debug!("Post changed: {}", uid);
                changeset.changed_posts.push(uid.clone());
            }
            None => {
                tracing::debug!("New post: {}", uid);
                changeset.changed_posts.push(uid.clone());
                changeset.rebuild_index = true;
            }
        }
    }

    let current: HashSet<&str> = current_posts.iter().map(|(uid, _)| uid.as_str()).collect();
    let mut deleted: Vec<String> = cache
        .posts
        .keys()
        .filter(|uid| !current.contains(uid.as_str()))
        .cloned()
        .collect();
    deleted.sort();
    for uid in &deleted {
        tracing::debug!("Deleted post: {}", uid);
    }
    if !deleted.is_empty() {
        changeset.rebuild_index = true;
    }
    changeset.deleted_posts = deleted;

    if index_hash != cache.index_hash {
        changeset.rebuild_index = true;
    }

    changeset
}

/// Replace the cache content with the current state
pub fn update_cache(
    cache: &mut CacheDb,
    config_hash: u64,
    posts: &[(String, u64, String)], // (uid, hash, output_path)
    index_hash: u64,
) {
    cache.version = CacheDb::VERSION;
    cache.config_hash = config_hash;
    cache.index_hash = index_hash;
    cache.posts = posts
        .iter()
        .map(|(uid, hash, output_path)| {
            (
                uid.clone(),
                CacheEntry {
                    content_hash: *hash,
                    output_path: output_path.clone(),
                },
            )
        })
        .collect();
}
