#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Aggregates sticky-note board posts per author and section.
//!
//! Boards, sections and posts come back as one JSON:API document per board;
//! posts are classified by color (marker color = pinned, no color = ordinary
//! post, any other color = neither) and pivoted into two columns per
//! section.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Base URL of the board API.
const API_BASE: &str = "https://api.padlet.dev";

/// A board post tagged with its resolved section and board titles.
#[derive(Debug, Clone)]
pub struct PadletPost {
    /// Post id.
    pub id:            String,
    /// Section id the post belongs to.
    pub section_id:    String,
    /// Resolved section title.
    pub section_title: String,
    /// Board id the post belongs to.
    pub board_id:      String,
    /// Resolved board title.
    pub board_title:   String,
    /// Author's username.
    pub username:      String,
    /// Post body HTML.
    pub content:       String,
    /// Post color; `None` marks an ordinary (unpinned) post.
    pub color:         Option<String>,
}

/// JSON:API document wrapper: everything interesting arrives in `included`.
#[derive(Debug, Deserialize)]
struct ApiDocument {
    /// Included resources of mixed type.
    #[serde(default)]
    included: Vec<Included>,
}

/// One resource from a JSON:API `included` array.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Included {
    /// A board owned by the authenticated identity.
    Board {
        /// Board id.
        id:         String,
        /// Board attributes.
        attributes: TitleAttributes,
    },
    /// A section within a board.
    Section {
        /// Section id.
        id:         String,
        /// Section attributes.
        attributes: TitleAttributes,
    },
    /// A post within a board.
    Post {
        /// Post id.
        id:            String,
        /// Post attributes.
        attributes:    PostAttributes,
        /// Post relationships.
        relationships: PostRelationships,
    },
    /// Anything else in the included array.
    #[serde(other)]
    Other,
}

/// Attributes carrying just a title.
#[derive(Debug, Deserialize)]
struct TitleAttributes {
    /// Resource title.
    title: String,
}

/// The post attributes this tool reads.
#[derive(Debug, Deserialize)]
struct PostAttributes {
    /// Pin color, absent for ordinary posts.
    #[serde(default)]
    color:   Option<String>,
    /// Post author.
    author:  PostAuthor,
    /// Post content.
    content: PostContent,
}

/// Post author stub.
#[derive(Debug, Deserialize)]
struct PostAuthor {
    /// Author's username.
    username: String,
}

/// Post content stub.
#[derive(Debug, Deserialize)]
struct PostContent {
    /// Body HTML.
    #[serde(rename = "bodyHtml", default)]
    body_html: String,
}

/// Relationships linking a post to its section and board.
#[derive(Debug, Deserialize)]
struct PostRelationships {
    /// Owning section, when the board uses sections.
    #[serde(default)]
    section: Option<Relationship>,
    /// Owning board.
    board:   Relationship,
}

/// A JSON:API to-one relationship.
#[derive(Debug, Deserialize)]
struct Relationship {
    /// Relationship target.
    data: RelationshipData,
}

/// A JSON:API resource identifier.
#[derive(Debug, Deserialize)]
struct RelationshipData {
    /// Target resource id.
    id: String,
}

/// Per-(author, section) pinned and ordinary post counts.
pub type Counts = BTreeMap<(String, String), (u64, u64)>;

/// Classifies and aggregates posts by (author, section).
///
/// A post counts as pinned when its color equals `marker`, as an ordinary
/// post when it has no color, and toward neither when it carries any other
/// color.
pub fn aggregate_posts(posts: &[PadletPost], marker: &str) -> Counts {
    let mut counts = Counts::new();
    for post in posts {
        let entry = counts
            .entry((post.username.clone(), post.section_title.clone()))
            .or_insert((0, 0));
        match post.color.as_deref() {
            Some(color) if color == marker => entry.0 += 1,
            None => entry.1 += 1,
            Some(_) => {}
        }
    }
    counts
}

/// Pivots aggregated counts into one row per author with two columns per
/// section. Missing (author, section) combinations fill as zero.
pub fn pivot_counts(counts: &Counts) -> (Vec<String>, Vec<Vec<String>>) {
    let sections: BTreeSet<&String> = counts.keys().map(|(_, section)| section).collect();
    let authors: BTreeSet<&String> = counts.keys().map(|(author, _)| author).collect();

    let mut header = vec!["username".to_string()];
    header.extend(sections.iter().map(|s| format!("{s}_pinned_count")));
    header.extend(sections.iter().map(|s| format!("{s}_post_count")));

    let mut rows = Vec::new();
    for author in authors {
        let mut row = vec![author.clone()];
        for section in &sections {
            let (pinned, _) = counts
                .get(&((*author).clone(), (*section).clone()))
                .copied()
                .unwrap_or((0, 0));
            row.push(pinned.to_string());
        }
        for section in &sections {
            let (_, posts) = counts
                .get(&((*author).clone(), (*section).clone()))
                .copied()
                .unwrap_or((0, 0));
            row.push(posts.to_string());
        }
        rows.push(row);
    }
    (header, rows)
}

/// Fetches one JSON:API document with the board API key attached.
async fn get_document(client: &reqwest::Client, api_key: &str, url: &str) -> Result<ApiDocument> {
    let resp = client
        .get(url)
        .header("accept", "application/vnd.api+json")
        .header("x-api-key", api_key)
        .send()
        .await
        .with_context(|| format!("Could not reach {url}"))?
        .error_for_status()
        .with_context(|| format!("Board API rejected {url}"))?;
    resp.json().await.context("Unexpected board API response shape")
}

/// Fetches every board's posts, tagged with section and board titles.
pub async fn fetch_posts(client: &reqwest::Client, api_key: &str) -> Result<Vec<PadletPost>> {
    let me = get_document(client, api_key, &format!("{API_BASE}/v1/me?include=boards")).await?;
    let mut boards = BTreeMap::new();
    for resource in &me.included {
        if let Included::Board { id, attributes } = resource {
            boards.insert(id.clone(), attributes.title.clone());
        }
    }

    let mut posts = Vec::new();
    for (board_id, board_title) in &boards {
        tracing::info!("Fetching board `{board_title}`");
        let document = get_document(
            client,
            api_key,
            &format!("{API_BASE}/v1/boards/{board_id}?include=posts%2Csections"),
        )
        .await?;

        let mut sections = BTreeMap::new();
        for resource in &document.included {
            if let Included::Section { id, attributes } = resource {
                sections.insert(id.clone(), attributes.title.clone());
            }
        }

        for resource in &document.included {
            let Included::Post {
                id,
                attributes,
                relationships,
            } = resource
            else {
                continue;
            };
            let section_id = relationships
                .section
                .as_ref()
                .map(|r| r.data.id.clone())
                .unwrap_or_default();
            posts.push(PadletPost {
                id:            id.clone(),
                section_title: sections.get(&section_id).cloned().unwrap_or_default(),
                section_id,
                board_id:      relationships.board.data.id.clone(),
                board_title:   boards.get(&relationships.board.data.id).cloned().unwrap_or_default(),
                username:      attributes.author.username.clone(),
                content:       attributes.content.body_html.clone(),
                color:         attributes.color.clone(),
            });
        }
    }
    Ok(posts)
}

/// Exports the pivoted per-author post counts to `output` as CSV.
pub async fn export_padlet(
    client: &reqwest::Client,
    api_key: &str,
    marker_color: &str,
    output: &Path,
) -> Result<()> {
    let posts = fetch_posts(client, api_key).await?;
    let (header, rows) = pivot_counts(&aggregate_posts(&posts, marker_color));

    tracing::info!("Writing {} authors to {}", rows.len(), output.display());
    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Could not create {}", output.display()))?;
    writer.write_record(&header)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush().context("Could not flush padlet CSV")?;
    Ok(())
}
