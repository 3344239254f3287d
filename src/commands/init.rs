//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: America/Sao_Paulo
logo: /spacetraveling.svg

# URL
url: http://localhost:4000
root: /

# Directory
public_dir: public
static_dir: static
i18n_dir: languages

# Date / Time format (Moment.js style)
date_format: DD MMM YYYY
time_format: HH:mm

# Content service
cms:
  endpoint: https://your-repository.cdn.prismic.io/api/v2
  # The token is read from this environment variable first
  access_token_env: PRISMIC_ACCESS_TOKEN
  document_type: posts
  page_size: 2
  timeout_secs: 30
  # Serve content from a local file; remove to use the endpoint
  fixtures: content/fixtures.json

reading:
  words_per_minute: 200

highlight:
  enable: true
  theme: base16-ocean.dark
  line_number: false

server:
  # Required by POST /api/revalidate when set
  revalidate_secret:
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("static"))?;
    fs::create_dir_all(target_dir.join("languages"))?;
    fs::create_dir_all(target_dir.join("content"))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, CONFIG_TEMPLATE)?;

    let fixtures = serde_json::json!({
        "master_ref": "master",
        "documents": [
            sample_post(
                "YFz1", "hello-world", "2021-03-25T19:25:28+0000",
                "Hello world", "Your first post",
                "Edit content/fixtures.json or point cms.endpoint at your repository."
            ),
            sample_post(
                "YFz0", "como-utilizar-hooks", "2021-03-15T19:25:28+0000",
                "Como utilizar Hooks", "Pensando em sincronização em vez de ciclos de vida",
                "Hooks let function components hold state and side effects."
            ),
        ],
        "previews": {}
    });
    fs::write(
        target_dir.join("content/fixtures.json"),
        serde_json::to_string_pretty(&fixtures)?,
    )?;

    Ok(())
}

fn sample_post(
    id: &str,
    uid: &str,
    date: &str,
    title: &str,
    subtitle: &str,
    text: &str,
) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "uid": uid,
        "type": "posts",
        "first_publication_date": date,
        "last_publication_date": date,
        "data": {
            "title": title,
            "subtitle": subtitle,
            "author": "spacetraveling",
            "banner": { "url": null },
            "content": [{
                "heading": title,
                "body": [{ "type": "paragraph", "text": text, "spans": [] }]
            }]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpaceTraveling;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_loadable_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        let app = SpaceTraveling::new(dir.path()).unwrap();
        assert_eq!(app.config.cms.page_size, 2);
        assert_eq!(
            app.config.cms.fixtures.as_deref(),
            Some("content/fixtures.json")
        );
        assert!(app.config.server.revalidate_secret.is_none());
        assert!(app.client().is_ok());
        assert!(dir.path().join("static").is_dir());
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();
        assert!(init_site(dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_sample_site_generates() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();
        let app = SpaceTraveling::new(dir.path()).unwrap();
        app.generate(false).await.unwrap();
        assert!(dir.path().join("public/post/hello-world/index.html").exists());
    }
}
