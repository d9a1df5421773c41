#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Replaces an assignment's due-date overrides from a CSV of extensions, or
//! exports a template CSV of current students and dates.
//!
//! Override replacement is an explicit two-phase operation: read and delete
//! every existing override, then create the new set. Deletion is
//! unconditional and not transactional — a failure mid-way leaves some
//! overrides deleted and none replaced.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{
    lms::{LmsClient, models::OverrideRequest},
    roster::get_students,
};

/// One row of the extensions input CSV.
///
/// The canonical schema uses a `group` column (group-scoped overrides) or an
/// `id` column (student-scoped overrides), never both, plus the three date
/// columns. Which column is present decides the code path.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRow {
    /// Group name, for group-scoped rows.
    #[serde(default)]
    pub group:     Option<String>,
    /// Student id, for student-scoped rows.
    #[serde(default)]
    pub id:        Option<i64>,
    /// Replacement due date.
    pub due_at:    Option<String>,
    /// Replacement lock date.
    pub lock_at:   Option<String>,
    /// Replacement unlock date.
    pub unlock_at: Option<String>,
}

/// One row of the exported extension template.
#[derive(Debug, Clone, Serialize)]
struct ExtensionTemplateRow {
    /// Student id.
    id:        i64,
    /// Institutional student id.
    sid:       Option<String>,
    /// Display name.
    name:      String,
    /// Login handle.
    unikey:    Option<String>,
    /// Email address.
    email:     Option<String>,
    /// Derived section.
    section:   Option<String>,
    /// Derived group.
    group:     Option<String>,
    /// The assignment's current due date.
    due_at:    Option<String>,
    /// The assignment's current lock date.
    lock_at:   Option<String>,
    /// The assignment's current unlock date.
    unlock_at: Option<String>,
}

/// Builds one group-scoped override request per input row.
///
/// An unknown group name is a hard failure: no overrides are produced and the
/// caller aborts before issuing any creation.
pub fn group_overrides(
    rows: &[OverrideRow],
    group_ids: &HashMap<String, i64>,
) -> Result<Vec<OverrideRequest>> {
    rows.iter()
        .map(|row| {
            let name = row
                .group
                .as_deref()
                .context("Row in group-scoped extensions CSV has an empty group")?;
            let group_id = *group_ids
                .get(name)
                .with_context(|| format!("Unknown group name `{name}`"))?;
            Ok(OverrideRequest {
                group_id:    Some(group_id),
                student_ids: None,
                title:       None,
                due_at:      row.due_at.clone(),
                lock_at:     row.lock_at.clone(),
                unlock_at:   row.unlock_at.clone(),
            })
        })
        .collect()
}

/// Merges student rows sharing an identical `(due_at, lock_at, unlock_at)`
/// triple into one override carrying the union of their ids.
///
/// Titles are synthesized as `extension-<n>` where `n` is the 0-based index
/// of the triple in first-appearance order. Every input row's id lands in
/// exactly one override.
pub fn student_overrides(rows: &[OverrideRow]) -> Result<Vec<OverrideRequest>> {
    let mut grouped: Vec<OverrideRequest> = Vec::new();

    for row in rows {
        let id = row
            .id
            .context("Row in student-scoped extensions CSV has an empty id")?;
        let existing = grouped.iter_mut().find(|o| {
            o.due_at == row.due_at && o.lock_at == row.lock_at && o.unlock_at == row.unlock_at
        });
        match existing {
            Some(override_request) => {
                override_request
                    .student_ids
                    .as_mut()
                    .expect("student overrides always carry ids")
                    .push(id);
            }
            None => grouped.push(OverrideRequest {
                group_id:    None,
                student_ids: Some(vec![id]),
                title:       Some(format!("extension-{}", grouped.len())),
                due_at:      row.due_at.clone(),
                lock_at:     row.lock_at.clone(),
                unlock_at:   row.unlock_at.clone(),
            }),
        }
    }

    Ok(grouped)
}

/// Replaces an assignment's overrides from the extensions CSV at `input`, or
/// exports the extension template to `output` when no input is given.
pub async fn update_due_dates(
    client: &LmsClient,
    assignment_id: i64,
    input: Option<&Path>,
    output: &Path,
) -> Result<()> {
    let Some(input) = input else {
        return export_extension_template(client, assignment_id, output).await;
    };

    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Could not read {}", input.display()))?;
    let headers = reader.headers().context("Extensions CSV has no header row")?.clone();
    let rows: Vec<OverrideRow> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .context("Malformed extensions CSV")?;

    // Full replace: drop every existing override before creating the new set.
    let existing = client.list_overrides(assignment_id).await?;
    tracing::info!("Deleting {} existing overrides", existing.len());
    for override_stub in &existing {
        client.delete_override(assignment_id, override_stub.id).await?;
    }

    let requests = if headers.iter().any(|h| h == "group") {
        let groups = client.list_groups(false).await?;
        let group_ids: HashMap<String, i64> =
            groups.into_iter().map(|g| (g.name, g.id)).collect();
        group_overrides(&rows, &group_ids)?
    } else if headers.iter().any(|h| h == "id") {
        student_overrides(&rows)?
    } else {
        bail!("Extensions CSV must have a `group` or `id` column");
    };

    tracing::info!("Creating {} overrides", requests.len());
    for request in &requests {
        client.create_override(assignment_id, request).await?;
    }
    Ok(())
}

/// Exports one row per current student carrying identity fields plus the
/// assignment's current dates, as a template for later edits.
async fn export_extension_template(
    client: &LmsClient,
    assignment_id: i64,
    output: &Path,
) -> Result<()> {
    let assignment = client.get_assignment(assignment_id).await?;
    let students = get_students(client).await?;
    tracing::info!(
        "Exporting extension template for `{}` to {}",
        assignment.name,
        output.display()
    );

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Could not create {}", output.display()))?;
    for student in students {
        writer.serialize(ExtensionTemplateRow {
            id:        student.id,
            sid:       student.sid,
            name:      student.name,
            unikey:    student.unikey,
            email:     student.email,
            section:   student.section,
            group:     student.group,
            due_at:    assignment.due_at.clone(),
            lock_at:   assignment.lock_at.clone(),
            unlock_at: assignment.unlock_at.clone(),
        })?;
    }
    writer.flush().context("Could not flush extension template CSV")?;
    Ok(())
}
