#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Builds the normalized student roster from course enrollment and group
//! membership, and exports it as CSV.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::lms::{
    LmsClient,
    models::{Enrollment, Group, User},
};

/// A student row in the normalized roster.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// LMS-internal user id.
    pub id:      i64,
    /// Institutional student id.
    pub sid:     Option<String>,
    /// Display name.
    pub name:    String,
    /// Login handle.
    pub unikey:  Option<String>,
    /// Email address.
    pub email:   Option<String>,
    /// Derived section code, when one could be derived.
    pub section: Option<String>,
    /// Derived group name, when the student belongs to a group.
    pub group:   Option<String>,
}

/// Derives a student's section code from enrollment SIS metadata.
///
/// The SIS section id carries the SIS course id as a prefix; after stripping
/// it, synthetic `_all` sections and purely numeric codes are rejected. The
/// first enrollment with a surviving code wins.
pub fn derive_section(enrollments: &[Enrollment]) -> Option<String> {
    for enrollment in enrollments {
        let Some(section_id) = enrollment.sis_section_id.as_deref() else {
            continue;
        };
        let code = match enrollment.sis_course_id.as_deref() {
            Some(course_id) => section_id.replacen(&format!("{course_id}-"), "", 1),
            None => section_id.to_string(),
        };
        if !code.ends_with("_all") && !code.chars().all(|c| c.is_ascii_digit()) {
            return Some(code);
        }
    }
    None
}

/// Reverse-looks-up the first course group containing the given user.
pub fn find_group(user_id: i64, groups: &[Group]) -> Option<String> {
    groups
        .iter()
        .find(|group| group.users.iter().any(|member| member.id == user_id))
        .map(|group| group.name.clone())
}

/// Projects a course user onto a roster row.
pub fn student_from_user(user: &User, groups: &[Group]) -> Student {
    Student {
        id:      user.id,
        sid:     user.sis_user_id.clone(),
        name:    user.name.clone(),
        unikey:  user.login_id.clone(),
        email:   user.email.clone(),
        section: derive_section(&user.enrollments),
        group:   find_group(user.id, groups),
    }
}

/// Fetches enrollment and group membership and derives the full roster.
pub async fn get_students(client: &LmsClient) -> Result<Vec<Student>> {
    let users = client.list_students().await?;
    let groups = client.list_groups(true).await?;

    Ok(users
        .iter()
        .map(|user| student_from_user(user, &groups))
        .collect())
}

/// Downloads the roster and writes it to `path` as CSV.
pub async fn download_roster(client: &LmsClient, path: &Path) -> Result<()> {
    let students = get_students(client).await?;
    tracing::info!("Writing {} students to {}", students.len(), path.display());

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Could not create {}", path.display()))?;
    for student in &students {
        writer.serialize(student)?;
    }
    writer.flush().context("Could not flush roster CSV")?;
    Ok(())
}
