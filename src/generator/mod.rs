//! Generator module - renders CMS content to static HTML with the built-in templates

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tera::Context;
use walkdir::WalkDir;

use crate::cache::{self, CacheDb, ChangeSet};
use crate::cms::ContentClient;
use crate::content::{edition_label, PostDetail, PostSummary};
use crate::helpers::{
    full_url_for, is_valid_uid, meta_generator, open_graph, post_url, url_for, DateFormatter,
};
use crate::i18n::I18n;
use crate::navigation::{resolve_neighbors, Neighbors};
use crate::pagination::PostListState;
use crate::richtext::{CodeHighlighter, HtmlSerializer, RichTextRenderer};
use crate::templates::{
    IndexView, NavLink, PostCardView, PostView, SectionView, SiteView, TemplateRenderer,
};
use crate::SpaceTraveling;

/// Seconds between reloads of the "generating" placeholder
const PLACEHOLDER_REFRESH_SECS: u32 = 2;

const STYLESHEET_PATH: &str = "css/style.css";
const DEFAULT_STYLESHEET: &str = include_str!("style.css");
const DEFAULT_LOGO: &str = include_str!("logo.svg");

/// Result of a generation run
#[derive(Debug)]
pub struct Generation {
    /// What was written or removed
    pub changes: ChangeSet,
    /// Cache describing the output now on disk
    pub cache: CacheDb,
    /// Number of posts found in the CMS
    pub post_count: usize,
}

/// Static site generator
pub struct Generator {
    app: SpaceTraveling,
    client: Arc<dyn ContentClient>,
    renderer: TemplateRenderer,
    rich_text: Box<dyn RichTextRenderer>,
    dates: DateFormatter,
    i18n: I18n,
    site: SiteView,
    strings: serde_json::Value,
}

impl Generator {
    /// Create a new generator
    pub fn new(app: &SpaceTraveling, client: Arc<dyn ContentClient>) -> Result<Self> {
        let config = &app.config;
        let renderer = TemplateRenderer::new()?;
        let i18n = app.i18n()?;

        let rich_text: Box<dyn RichTextRenderer> = if config.highlight.enable {
            Box::new(HtmlSerializer::with_highlighter(CodeHighlighter::new(
                &config.highlight.theme,
                config.highlight.line_number,
            )))
        } else {
            Box::new(HtmlSerializer::new())
        };

        let site = SiteView {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            logo: url_for(config, &config.logo),
            root: url_for(config, ""),
            home: url_for(config, ""),
            stylesheet: url_for(config, STYLESHEET_PATH),
            exit_preview: url_for(config, "api/exit-preview"),
            generator: meta_generator(),
        };

        Ok(Self {
            app: app.clone(),
            client,
            renderer,
            rich_text,
            dates: DateFormatter::from_config(config),
            strings: i18n.template_strings(),
            i18n,
            site,
        })
    }

    /// Replace the rich text renderer
    pub fn with_rich_text(mut self, rich_text: Box<dyn RichTextRenderer>) -> Self {
        self.rich_text = rich_text;
        self
    }

    pub fn client(&self) -> &Arc<dyn ContentClient> {
        &self.client
    }

    fn doc_type(&self) -> &str {
        &self.app.config.cms.document_type
    }

    /// Generate the site, rewriting only what differs from `previous`
    /// unless `force` is set
    pub async fn generate(&self, previous: &CacheDb, force: bool) -> Result<Generation> {
        fs::create_dir_all(&self.app.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.app.public_dir))?;

        self.copy_static_assets()?;
        self.write_default_assets()?;

        let client = self.client.as_ref();
        let reference = self.content_ref(None).await?;
        let first_page = PostListState::fetch_first(
            client,
            self.doc_type(),
            self.app.config.cms.page_size,
            Some(&reference),
        )
        .await
        .context("Failed to fetch the post list")?;

        let mut all = first_page.clone();
        all.collect_all(client)
            .await
            .context("Failed to walk the post list")?;
        tracing::info!("Found {} posts", all.items.len());

        let mut pages: Vec<(String, String)> = Vec::new();
        for summary in &all.items {
            if !is_valid_uid(&summary.uid) {
                tracing::warn!("Skipping post with unusable uid {:?}", summary.uid);
                continue;
            }
            match self
                .render_post_page(&summary.uid, Some(&reference), false)
                .await?
            {
                Some(html) => pages.push((summary.uid.clone(), html)),
                None => tracing::warn!("Post {} not found, skipping", summary.uid),
            }
        }
        let index_html = self.render_index(&first_page, false)?;

        let config_hash = cache::hash_config(&self.app.config_path);
        let index_hash = cache::hash_content(&index_html);
        let current: Vec<(String, u64)> = pages
            .iter()
            .map(|(uid, html)| (uid.clone(), cache::hash_content(html)))
            .collect();

        let mut changes = if force || previous.is_empty() {
            ChangeSet::full_rebuild()
        } else {
            cache::detect_changes(previous, config_hash, &current, index_hash)
        };
        if changes.full_rebuild {
            let live: HashSet<&str> = current.iter().map(|(uid, _)| uid.as_str()).collect();
            changes.deleted_posts = previous
                .posts
                .keys()
                .filter(|uid| !live.contains(uid.as_str()))
                .cloned()
                .collect();
        }
        tracing::info!("Changes: {}", changes.summary());

        for uid in &changes.deleted_posts {
            self.remove_post(uid)?;
        }

        let mut written = 0;
        for (uid, html) in &pages {
            let path = post_output_path(uid);
            if changes.needs_post(uid) || !self.app.public_dir.join(&path).exists() {
                self.write_page(&path, html)?;
                written += 1;
            }
        }
        if changes.rebuild_index || !self.app.public_dir.join("index.html").exists() {
            self.write_page("index.html", &index_html)?;
        }
        tracing::info!("Wrote {} of {} post pages", written, pages.len());

        let entries: Vec<(String, u64, String)> = current
            .into_iter()
            .map(|(uid, hash)| {
                let path = post_output_path(&uid);
                (uid, hash, path)
            })
            .collect();
        let mut cache = CacheDb::new();
        cache::update_cache(&mut cache, config_hash, &entries, index_hash);

        Ok(Generation {
            changes,
            cache,
            post_count: all.items.len(),
        })
    }

    /// Build and write a single post page. Returns `false` when the CMS
    /// has no post with this uid.
    pub async fn generate_post(&self, uid: &str) -> Result<bool> {
        if !is_valid_uid(uid) {
            return Ok(false);
        }
        match self.render_post_page(uid, None, false).await? {
            Some(html) => {
                self.write_page(&post_output_path(uid), &html)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fetch a post with its neighbors and render it
    pub async fn render_post_page(
        &self,
        uid: &str,
        reference: Option<&str>,
        preview: bool,
    ) -> Result<Option<String>> {
        let reference = self.content_ref(reference).await?;
        let reference = Some(reference.as_str());
        let client = self.client.as_ref();
        let Some(doc) = client
            .get_by_uid(self.doc_type(), uid, reference)
            .await
            .with_context(|| format!("Failed to fetch post {}", uid))?
        else {
            return Ok(None);
        };

        let post = PostDetail::from_document(&doc);
        let neighbors = resolve_neighbors(client, self.doc_type(), &post.id, reference)
            .await
            .with_context(|| format!("Failed to resolve neighbors of {}", uid))?;

        let view = self.post_view(&post, &neighbors);
        self.render_post(&view, preview).map(Some)
    }

    /// Fetch the first page of posts and render the index
    pub async fn render_index_page(&self, reference: Option<&str>, preview: bool) -> Result<String> {
        let reference = self.content_ref(reference).await?;
        let list = PostListState::fetch_first(
            self.client.as_ref(),
            self.doc_type(),
            self.app.config.cms.page_size,
            Some(&reference),
        )
        .await
        .context("Failed to fetch the post list")?;
        self.render_index(&list, preview)
    }

    /// The given ref, or the published one. Every query of a page or a
    /// build runs against this single snapshot.
    async fn content_ref(&self, reference: Option<&str>) -> Result<String> {
        match reference {
            Some(reference) => Ok(reference.to_string()),
            None => self
                .client
                .master_ref()
                .await
                .context("Failed to resolve the master ref"),
        }
    }

    /// Map a post to everything its page shows
    pub fn post_view(&self, post: &PostDetail, neighbors: &Neighbors) -> PostView {
        let minutes = post.reading_time(self.app.config.reading.words_per_minute);

        PostView {
            uid: post.uid.clone(),
            path: post_url(&self.app.config, &post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: post.first_publication_date.as_ref().map(|d| self.dates.date(d)),
            edited: edition_label(post, &self.dates, &self.i18n),
            reading_time: self
                .i18n
                .format("post.reading_time", &[("minutes", &minutes.to_string())]),
            banner_url: post.banner_url.clone(),
            sections: post
                .content
                .iter()
                .map(|section| SectionView {
                    heading: section.heading.clone(),
                    anchor: slug::slugify(&section.heading),
                    html: self.rich_text.render(&section.body),
                })
                .collect(),
            previous: neighbors.previous.as_ref().map(|p| self.nav_link(p)),
            next: neighbors.next.as_ref().map(|p| self.nav_link(p)),
        }
    }

    fn nav_link(&self, post: &PostSummary) -> NavLink {
        NavLink {
            title: post.title.clone(),
            path: post_url(&self.app.config, &post.uid),
        }
    }

    fn card(&self, post: &PostSummary) -> PostCardView {
        PostCardView {
            uid: post.uid.clone(),
            path: post_url(&self.app.config, &post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: post.first_publication_date.as_ref().map(|d| self.dates.date(d)),
        }
    }

    /// Create a base context with common variables
    fn base_context(&self, preview: bool) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("t", &self.strings);
        context.insert("preview", &preview);
        context.insert("doc_type", self.doc_type());
        context.insert("page_title", &Option::<String>::None);
        context.insert("open_graph", &Option::<String>::None);
        context.insert("refresh_secs", &Option::<u32>::None);
        context
    }

    pub fn render_post(&self, view: &PostView, preview: bool) -> Result<String> {
        let mut context = self.base_context(preview);
        context.insert("page_title", &Some(&view.title));
        context.insert(
            "open_graph",
            &Some(open_graph(
                &view.title,
                &view.subtitle,
                &full_url_for(&self.app.config, &view.path),
                view.banner_url.as_deref(),
                &self.app.config.title,
            )),
        );
        context.insert("post", view);
        self.renderer.render("post.html", &context)
    }

    pub fn render_index(&self, list: &PostListState, preview: bool) -> Result<String> {
        let view = IndexView {
            posts: list.items.iter().map(|p| self.card(p)).collect(),
            next_page: list.next_page.clone(),
        };
        let mut context = self.base_context(preview);
        context.insert("posts", &view.posts);
        context.insert("next_page", &view.next_page);
        self.renderer.render("index.html", &context)
    }

    /// The placeholder shown while a post is generated on demand
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.base_context(false);
        context.insert("page_title", &Some(self.i18n.get("post.loading")));
        context.insert("refresh_secs", &Some(PLACEHOLDER_REFRESH_SECS));
        self.renderer.render("loading.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        let mut context = self.base_context(false);
        context.insert("page_title", &Some(self.i18n.get("post.not_found")));
        self.renderer.render("not_found.html", &context)
    }

    /// Write a page below the public directory
    fn write_page(&self, rel_path: &str, html: &str) -> Result<()> {
        let output_path = self.app.public_dir.join(rel_path);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
        }
        fs::write(&output_path, html)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    fn remove_post(&self, uid: &str) -> Result<()> {
        if !is_valid_uid(uid) {
            return Ok(());
        }
        let dir = self.app.public_dir.join("post").join(uid);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .map_err(|e| anyhow::anyhow!("Failed to remove {:?}: {}", dir, e))?;
            tracing::debug!("Removed: {:?}", dir);
        }
        Ok(())
    }

    /// Copy the static directory into the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.app.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || is_hidden(path, static_dir) {
                continue;
            }
            let Ok(relative) = path.strip_prefix(static_dir) else {
                continue;
            };
            let dest = self.app.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .map_err(|e| anyhow::anyhow!("Failed to copy {:?}: {}", path, e))?;
            tracing::debug!("Copied asset: {:?}", relative);
        }

        Ok(())
    }

    /// Write the built-in stylesheet and logo unless the site ships its own
    fn write_default_assets(&self) -> Result<()> {
        let logo = self.app.config.logo.trim_start_matches('/');
        let defaults = [(STYLESHEET_PATH, DEFAULT_STYLESHEET), (logo, DEFAULT_LOGO)];
        for (rel_path, content) in defaults {
            if rel_path.is_empty() || self.app.static_dir.join(rel_path).exists() {
                continue;
            }
            self.write_page(rel_path, content)?;
        }
        Ok(())
    }
}

/// Output path of a post page relative to the public dir
pub fn post_output_path(uid: &str) -> String {
    format!("post/{}/index.html", uid)
}

/// Dotfiles and anything under a dot directory
fn is_hidden(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        })
        .unwrap_or(false)
}
