#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Publishes a declarative course description to the LMS.
//!
//! Every source document goes through the same pipeline: heading escape,
//! front-matter parse, template substitution with merged metadata, markdown
//! rendering, asset-link rewriting. Reconciliation against live course
//! objects is by exact title/name match, with the title→id maps built once
//! per publish run. Matched objects are edited in place; everything else is
//! created. Rubrics are the exception: a matching title is deleted and the
//! rubric recreated. Module membership is additive-only.

pub mod markdown;

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde_yaml::{Mapping, Value};

use crate::{
    config::{self, AssignmentGroupSpec, ModuleSpec},
    lms::{
        LmsClient,
        models::{AssignmentRequest, DiscussionRequest, ModuleRequest, Page, PageRequest},
    },
    templates,
};

use self::markdown::{
    AssetKind, escape_headings, find_asset_refs, markdown_to_html, merge_metadata,
    split_front_matter,
};

/// Looks up a metadata key.
fn meta_get<'a>(metadata: &'a Mapping, key: &str) -> Option<&'a Value> {
    metadata.get(Value::String(key.to_string()))
}

/// Returns a required string metadata field, failing the document otherwise.
fn require_str(metadata: &Mapping, key: &str, document: &Path) -> Result<String> {
    meta_get(metadata, key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .with_context(|| format!("{} is missing required metadata `{key}`", document.display()))
}

/// Returns a required boolean metadata field, failing the document
/// otherwise.
fn require_bool(metadata: &Mapping, key: &str, document: &Path) -> Result<bool> {
    meta_get(metadata, key)
        .and_then(Value::as_bool)
        .with_context(|| format!("{} is missing required metadata `{key}`", document.display()))
}

/// Returns an optional string metadata field.
fn optional_str(metadata: &Mapping, key: &str) -> Option<String> {
    meta_get(metadata, key).and_then(Value::as_str).map(str::to_string)
}

/// Reads a metadata field that may be a single string or a list of strings.
fn string_list(metadata: &Mapping, key: &str, default: &str) -> Vec<String> {
    match meta_get(metadata, key) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => vec![default.to_string()],
    }
}

/// Title→id maps over the live course, built once per publish run so
/// reconciliation does not need a remote lookup per item.
struct PublishState {
    /// Page title → page URL slug.
    pages:             HashMap<String, String>,
    /// Module name → module id.
    modules:           HashMap<String, i64>,
    /// Discussion title → topic id.
    discussions:       HashMap<String, i64>,
    /// Announcement title → topic id.
    announcements:     HashMap<String, i64>,
    /// Assignment group name → id.
    assignment_groups: HashMap<String, i64>,
    /// Assignment name → id.
    assignments:       HashMap<String, i64>,
    /// Rubric title → id.
    rubrics:           HashMap<String, i64>,
}

impl PublishState {
    /// Snapshots the live course's reconciliation keys.
    async fn load(client: &LmsClient) -> Result<Self> {
        Ok(Self {
            pages:             client
                .list_pages()
                .await?
                .into_iter()
                .map(|p| (p.title, p.url))
                .collect(),
            modules:           client
                .list_modules()
                .await?
                .into_iter()
                .map(|m| (m.name, m.id))
                .collect(),
            discussions:       client
                .list_discussion_topics()
                .await?
                .into_iter()
                .map(|d| (d.title, d.id))
                .collect(),
            announcements:     client
                .list_announcements()
                .await?
                .into_iter()
                .map(|a| (a.title, a.id))
                .collect(),
            assignment_groups: client
                .list_assignment_groups()
                .await?
                .into_iter()
                .map(|g| (g.name, g.id))
                .collect(),
            assignments:       client
                .list_assignments()
                .await?
                .into_iter()
                .map(|a| (a.name, a.id))
                .collect(),
            rubrics:           client
                .list_rubrics()
                .await?
                .into_iter()
                .map(|r| (r.title, r.id))
                .collect(),
        })
    }
}

/// One publish run over a course workspace.
struct Publisher<'a> {
    /// LMS client scoped to the target course.
    client:  &'a LmsClient,
    /// The lms directory holding sources and the course description.
    lms_dir: PathBuf,
    /// Global metadata from the course description.
    global:  Mapping,
    /// Week-1 anchor for template date helpers.
    week_1:  Option<NaiveDate>,
    /// Live-course reconciliation maps.
    state:   PublishState,
}

impl Publisher<'_> {
    /// Loads a source document: escape, parse, substitute, render, rewrite.
    ///
    /// Returns the document's effective metadata and its final HTML body.
    async fn load_document(&self, path: &Path) -> Result<(Mapping, String)> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let escaped = escape_headings(&text);

        let (front, _) = split_front_matter(&escaped)
            .with_context(|| format!("Bad front-matter in {}", path.display()))?;
        let merged = merge_metadata(&self.global, &front);

        let context = templates::context_from_mapping(&merged)?;
        let rendered = templates::render_str(&escaped, &context, self.week_1)
            .with_context(|| format!("Could not render {}", path.display()))?;

        // Metadata values may themselves be template expressions, so the
        // front-matter is re-parsed from the rendered text.
        let (metadata, content) = split_front_matter(&rendered)
            .with_context(|| format!("Bad rendered front-matter in {}", path.display()))?;
        let html = markdown_to_html(&content);
        let html = self.rewrite_asset_links(html).await?;
        Ok((metadata, html))
    }

    /// Rewrites relative asset links: build artifacts that exist are
    /// uploaded and linked by file id, everything else points at the course
    /// home.
    async fn rewrite_asset_links(&self, mut html: String) -> Result<String> {
        let course_id = self.client.course_id();
        for asset in find_asset_refs(&html) {
            let local = match asset.kind {
                AssetKind::Link => self
                    .lms_dir
                    .parent()
                    .unwrap_or(Path::new("."))
                    .join("build")
                    .join(&asset.target),
                AssetKind::Image => self.lms_dir.join(&asset.target),
            };

            let link = if local.exists() {
                let file_id = self.client.upload_file(&local).await?;
                match asset.kind {
                    AssetKind::Link => format!("/courses/{course_id}/files/{file_id}"),
                    AssetKind::Image => format!("/courses/{course_id}/files/{file_id}/preview"),
                }
            } else {
                tracing::warn!("Missing asset `{}`, linking course home", asset.target);
                format!("/courses/{course_id}/")
            };
            html = html.replace(&asset.target, &link);
        }
        Ok(html)
    }

    /// Publishes the front page.
    async fn publish_front_page(&self, source: &str) -> Result<()> {
        let path = self.lms_dir.join(source);
        let (metadata, body) = self.load_document(&path).await?;
        let request = PageRequest {
            title: require_str(&metadata, "title", &path)?,
            published: require_bool(&metadata, "published", &path)?,
            body,
        };
        tracing::info!("Publishing front page `{}`", request.title);
        self.client.update_front_page(&request).await?;
        Ok(())
    }

    /// Publishes one page, editing in place when the title already exists.
    async fn publish_page(&mut self, source: &str) -> Result<Page> {
        let path = self.lms_dir.join(source);
        let (metadata, body) = self.load_document(&path).await?;
        let request = PageRequest {
            title: require_str(&metadata, "title", &path)?,
            published: require_bool(&metadata, "published", &path)?,
            body,
        };

        let page = match self.state.pages.get(&request.title).cloned() {
            Some(url) => self.client.update_page(&url, &request).await?,
            None => {
                let page = self.client.create_page(&request).await?;
                self.state.pages.insert(page.title.clone(), page.url.clone());
                page
            }
        };
        Ok(page)
    }

    /// Publishes one module: its pages first, then the module itself, then
    /// additive membership.
    async fn publish_module(&mut self, spec: &ModuleSpec) -> Result<()> {
        tracing::info!("Publishing module `{}`", spec.title);
        let mut pages = Vec::with_capacity(spec.pages.len());
        for source in &spec.pages {
            pages.push(self.publish_page(source).await?);
        }

        let request = ModuleRequest {
            name:      spec.title.clone(),
            published: spec.published,
            unlock_at: spec.unlock_at.clone(),
        };
        let module_id = match self.state.modules.get(&spec.title).copied() {
            Some(id) => {
                self.client.update_module(id, &request).await?;
                id
            }
            None => {
                let module = self.client.create_module(&request).await?;
                self.state.modules.insert(module.name.clone(), module.id);
                module.id
            }
        };

        // Additive membership: never re-add or remove items already present.
        let existing: HashSet<String> = self
            .client
            .list_module_items(module_id)
            .await?
            .into_iter()
            .map(|item| item.title)
            .collect();
        for page in &pages {
            if !existing.contains(&page.title) {
                self.client.create_module_page_item(module_id, &page.url).await?;
            }
        }
        Ok(())
    }

    /// Publishes one discussion, matching live topics first, then
    /// announcements, before falling back to creation.
    async fn publish_discussion(&mut self, source: &str) -> Result<()> {
        let path = self.lms_dir.join(source);
        let (metadata, body) = self.load_document(&path).await?;
        let title = require_str(&metadata, "title", &path)?;
        let request = DiscussionRequest {
            title:           title.clone(),
            message:         body,
            discussion_type: optional_str(&metadata, "discussion_type")
                .unwrap_or_else(|| "threaded".to_string()),
            published:       meta_get(&metadata, "published")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            delayed_post_at: optional_str(&metadata, "delayed_post_at"),
            is_announcement: meta_get(&metadata, "is_announcement")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        };

        tracing::info!("Publishing discussion `{title}`");
        if let Some(id) = self.state.discussions.get(&title).copied() {
            self.client.update_discussion(id, &request).await?;
        } else if let Some(id) = self.state.announcements.get(&title).copied() {
            self.client.update_discussion(id, &request).await?;
        } else {
            let topic = self.client.create_discussion(&request).await?;
            self.state.discussions.insert(topic.title, topic.id);
        }
        Ok(())
    }

    /// Publishes one assignment group and its assignments.
    async fn publish_assignment_group(&mut self, spec: &AssignmentGroupSpec) -> Result<()> {
        tracing::info!("Publishing assignment group `{}`", spec.title);
        let group_id = match self.state.assignment_groups.get(&spec.title).copied() {
            Some(id) => id,
            None => {
                let group = self.client.create_assignment_group(&spec.title).await?;
                self.state.assignment_groups.insert(group.name.clone(), group.id);
                group.id
            }
        };

        for source in &spec.assignments {
            self.publish_assignment(group_id, source).await?;
        }
        Ok(())
    }

    /// Publishes one assignment, then its rubric when the document carries
    /// one.
    async fn publish_assignment(&mut self, group_id: i64, source: &str) -> Result<()> {
        let path = self.lms_dir.join(source);
        let (metadata, body) = self.load_document(&path).await?;
        let name = require_str(&metadata, "name", &path)?;
        let request = AssignmentRequest {
            name:                name.clone(),
            published:           require_bool(&metadata, "published", &path)?,
            unlock_at:           optional_str(&metadata, "unlock_at"),
            position:            meta_get(&metadata, "position")
                .and_then(Value::as_i64)
                .unwrap_or(1),
            submission_types:    string_list(&metadata, "submission_types", "none"),
            grading_type:        optional_str(&metadata, "grading_type")
                .unwrap_or_else(|| "points".to_string()),
            points_possible:     meta_get(&metadata, "points_possible")
                .and_then(Value::as_f64)
                .unwrap_or(100.0),
            description:         body,
            due_at:              optional_str(&metadata, "due_at"),
            lock_at:             optional_str(&metadata, "lock_at"),
            assignment_group_id: group_id,
        };

        tracing::info!("Publishing assignment `{name}`");
        let assignment_id = match self.state.assignments.get(&name).copied() {
            Some(id) => {
                self.client.update_assignment(id, &request).await?;
                id
            }
            None => {
                let assignment = self.client.create_assignment(&request).await?;
                self.state.assignments.insert(assignment.name.clone(), assignment.id);
                assignment.id
            }
        };

        if let Some(rubric) = meta_get(&metadata, "rubric") {
            self.publish_rubric(rubric, &name, assignment_id, &path).await?;
        }
        Ok(())
    }

    /// Replaces an assignment's rubric: a live rubric with a matching title
    /// is deleted, then the rubric is created fresh and associated for
    /// grading. There is no incremental rubric diff.
    async fn publish_rubric(
        &mut self,
        rubric: &Value,
        assignment_name: &str,
        assignment_id: i64,
        document: &Path,
    ) -> Result<()> {
        let Value::Sequence(criteria) = rubric else {
            bail!("{} has a non-list `rubric` metadata entry", document.display());
        };

        if let Some(id) = self.state.rubrics.remove(assignment_name) {
            self.client.delete_rubric(id).await?;
        }

        let mut criteria_map = serde_json::Map::new();
        for (index, item) in criteria.iter().enumerate() {
            let description = item
                .get("description")
                .and_then(Value::as_str)
                .with_context(|| {
                    format!("{}: rubric criterion {index} has no description", document.display())
                })?;
            let max_points = item
                .get("max_points")
                .and_then(Value::as_f64)
                .with_context(|| {
                    format!("{}: rubric criterion {index} has no max_points", document.display())
                })?;
            criteria_map.insert(
                (index + 1).to_string(),
                serde_json::json!({
                    "description": description,
                    "ratings": {
                        "1": { "description": "Full Marks", "points": max_points },
                        "2": { "description": "No Marks", "points": 0.0 },
                    },
                }),
            );
        }

        let created = self
            .client
            .create_rubric(&serde_json::json!({
                "title": assignment_name,
                "criteria": criteria_map,
            }))
            .await?;
        self.state
            .rubrics
            .insert(created.rubric.title.clone(), created.rubric.id);

        self.client
            .create_rubric_association(&serde_json::json!({
                "rubric_id": created.rubric.id,
                "association_type": "Assignment",
                "association_id": assignment_id,
                "use_for_grading": true,
                "purpose": "grading",
            }))
            .await?;
        Ok(())
    }
}

/// Publishes the course workspace at `lms_dir` to the live course.
pub async fn publish(client: &LmsClient, lms_dir: &Path) -> Result<()> {
    let description = config::load_course_description(lms_dir)?;
    let week_1 = description
        .config
        .week_1
        .as_deref()
        .map(templates::parse_week_1)
        .transpose()?;

    let state = PublishState::load(client).await?;
    let mut publisher = Publisher {
        client,
        lms_dir: lms_dir.to_path_buf(),
        global: description.raw.clone(),
        week_1,
        state,
    };

    let frontpage = description
        .config
        .frontpage
        .as_deref()
        .context("Course description has no `frontpage` entry")?;
    publisher.publish_front_page(frontpage).await?;

    for spec in description.config.modules.values() {
        publisher.publish_module(spec).await?;
    }
    for source in &description.config.discussions {
        publisher.publish_discussion(source).await?;
    }
    for spec in description.config.assignments.values() {
        publisher.publish_assignment_group(spec).await?;
    }

    tracing::info!("Publish complete");
    Ok(())
}
