#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Walks discussion topics and their reply trees, flattening them into a
//! list of timestamped contributions for CSV export.

use std::path::Path;

use anyhow::{Context, Result};
use htmd::HtmlToMarkdown;
use serde::Serialize;

use crate::lms::{LmsClient, models::TopicEntry};

/// Whether a contribution is a top-level post or a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A top-level entry in a topic.
    Post,
    /// A reply to a top-level entry.
    Reply,
}

/// One flattened contribution row.
#[derive(Debug, Clone, Serialize)]
pub struct Contribution {
    /// Entry id.
    pub id:         i64,
    /// Author's user id.
    pub user_id:    i64,
    /// Post or reply.
    pub kind:       EntryKind,
    /// Message body, converted to markdown.
    pub message:    String,
    /// Creation timestamp, as returned by the API.
    pub created_at: String,
    /// Last-update timestamp, as returned by the API.
    pub updated_at: Option<String>,
}

/// Flattens entries and their replies in API order: each post is followed
/// immediately by its replies, with no re-sorting by time or kind.
pub fn flatten_entries(
    entries: &[(TopicEntry, Vec<TopicEntry>)],
    convert: impl Fn(&str) -> Result<String>,
) -> Result<Vec<Contribution>> {
    let mut contributions = Vec::new();
    for (post, replies) in entries {
        contributions.push(contribution(post, EntryKind::Post, &convert)?);
        for reply in replies {
            contributions.push(contribution(reply, EntryKind::Reply, &convert)?);
        }
    }
    Ok(contributions)
}

/// Projects one remote entry onto a contribution row.
fn contribution(
    entry: &TopicEntry,
    kind: EntryKind,
    convert: &impl Fn(&str) -> Result<String>,
) -> Result<Contribution> {
    Ok(Contribution {
        id: entry.id,
        user_id: entry.user_id,
        kind,
        message: convert(&entry.message)?,
        created_at: entry.created_at.clone(),
        updated_at: entry.updated_at.clone(),
    })
}

/// Fetches one topic's contributions: top-level entries, each with its
/// replies.
async fn get_contributions(client: &LmsClient, topic_id: i64) -> Result<Vec<Contribution>> {
    let posts = client.list_topic_entries(topic_id).await?;
    let mut entries = Vec::with_capacity(posts.len());
    for post in posts {
        let replies = client.list_entry_replies(topic_id, post.id).await?;
        entries.push((post, replies));
    }

    let converter = HtmlToMarkdown::builder().build();
    flatten_entries(&entries, |html| {
        converter
            .convert(html)
            .context("Could not convert message body to markdown")
    })
}

/// Downloads discussion contributions and writes them to `path` as CSV.
///
/// Topic id 0 means every topic in the course; any other id scopes the
/// export to that one topic.
pub async fn download_discussions(client: &LmsClient, topic: i64, path: &Path) -> Result<()> {
    let contributions = if topic == 0 {
        let topics = client.list_discussion_topics().await?;
        let mut all = Vec::new();
        for topic in topics {
            tracing::info!("Exporting topic `{}`", topic.title);
            all.extend(get_contributions(client, topic.id).await?);
        }
        all
    } else {
        get_contributions(client, topic).await?
    };

    tracing::info!("Writing {} contributions to {}", contributions.len(), path.display());
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Could not create {}", path.display()))?;
    for contribution in &contributions {
        writer.serialize(contribution)?;
    }
    writer.flush().context("Could not flush discussions CSV")?;
    Ok(())
}
