//! List site content

use anyhow::{Context, Result};

use crate::content::PostSummary;
use crate::helpers::{date_xml, post_url};
use crate::pagination::PostListState;
use crate::SpaceTraveling;

/// Fetch every post summary, newest first
pub async fn fetch_posts(app: &SpaceTraveling) -> Result<Vec<PostSummary>> {
    let client = app.client()?;
    let reference = client
        .master_ref()
        .await
        .context("Failed to resolve the master ref")?;
    let mut list = PostListState::fetch_first(
        client.as_ref(),
        &app.config.cms.document_type,
        app.config.cms.page_size,
        Some(&reference),
    )
    .await
    .context("Failed to fetch the post list")?;
    list.collect_all(client.as_ref())
        .await
        .context("Failed to walk the post list")?;
    Ok(list.items)
}

/// List site content by type
pub async fn run(app: &SpaceTraveling, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let posts = fetch_posts(app).await?;
            println!("Posts ({}):", posts.len());
            for post in posts {
                let date = post
                    .first_publication_date
                    .as_ref()
                    .map(date_xml)
                    .unwrap_or_else(|| "unpublished".to_string());
                println!("  {} - {} [{}]", date, post.title, post.uid);
            }
        }
        "route" | "routes" => {
            let posts = fetch_posts(app).await?;
            println!("Routes ({}):", posts.len() + 1);
            println!("  {}", crate::helpers::url_for(&app.config, ""));
            for post in posts {
                println!("  {}", post_url(&app.config, &post.uid));
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, route",
                content_type
            );
        }
    }

    Ok(())
}
