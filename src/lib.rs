//! spacetraveling: a static blog generator fed by a headless CMS
//!
//! Posts are fetched through a [`cms::ContentClient`], rendered with the
//! built-in Tera templates and written to the public directory. The dev
//! server adds preview mode and on-demand generation of missing posts.

pub mod cache;
pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod navigation;
pub mod pagination;
pub mod richtext;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Config file names, in lookup order
pub const CONFIG_FILES: [&str; 2] = ["_config.yml", "_config.toml"];

/// The main application
#[derive(Clone)]
pub struct SpaceTraveling {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Config file (may not exist)
    pub config_path: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets copied verbatim into the output
    pub static_dir: PathBuf,
    /// Language overrides
    pub i18n_dir: PathBuf,
}

impl SpaceTraveling {
    /// Create a new instance from a site directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = CONFIG_FILES
            .iter()
            .map(|name| base_dir.join(name))
            .find(|path| path.exists())
            .unwrap_or_else(|| base_dir.join(CONFIG_FILES[0]));

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            let mut config = config::SiteConfig::default();
            config.apply_env();
            config
        };

        Ok(Self::with_config(base_dir, config_path, config))
    }

    /// Create an instance from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config_path: PathBuf, config: config::SiteConfig) -> Self {
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);
        let i18n_dir = base_dir.join(&config.i18n_dir);

        Self {
            config,
            base_dir,
            config_path,
            public_dir,
            static_dir,
            i18n_dir,
        }
    }

    /// Reload the configuration from disk
    pub fn reload(&self) -> Result<Self> {
        Self::new(&self.base_dir)
    }

    /// Connect to the configured content service
    pub fn client(&self) -> Result<std::sync::Arc<dyn cms::ContentClient>> {
        cms::connect(&self.config.cms, &self.base_dir)
    }

    /// Language tables with the site's overrides applied
    pub fn i18n(&self) -> Result<i18n::I18n> {
        let mut i18n = i18n::I18n::new(&self.config.language);
        i18n.load_languages(&self.i18n_dir)?;
        Ok(i18n)
    }

    /// Generate the static site
    pub async fn generate(&self, force: bool) -> Result<cache::ChangeSet> {
        commands::generate::run(self, force).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
