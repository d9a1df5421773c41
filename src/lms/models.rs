//! Serde models for the subset of the LMS REST API this tool touches.
//!
//! These are projections, not a faithful mirror of the remote schema: only
//! the fields the orchestration layer reads are declared, everything else is
//! ignored on deserialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A course user as returned by the enrollment listing.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// LMS-internal user id.
    pub id:          i64,
    /// Display name.
    pub name:        String,
    /// Institutional student id, when the token may see it.
    pub sis_user_id: Option<String>,
    /// Login handle (unikey).
    pub login_id:    Option<String>,
    /// Email address, when requested via `include[]=email`.
    pub email:       Option<String>,
    /// Enrollments, when requested via `include[]=enrollments`.
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

/// Enrollment metadata used to derive a student's section.
#[derive(Debug, Clone, Deserialize)]
pub struct Enrollment {
    /// SIS course identifier, e.g. `2026-INFS1000-S1C-ND-CC`.
    pub sis_course_id:  Option<String>,
    /// SIS section identifier, prefixed with the SIS course id.
    pub sis_section_id: Option<String>,
}

/// A course group with (optionally) its members.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    /// Group id.
    pub id:    i64,
    /// Group display name.
    pub name:  String,
    /// Member stubs, when requested via `include[]=users`.
    #[serde(default)]
    pub users: Vec<GroupUser>,
}

/// Minimal member record inside a group listing.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupUser {
    /// LMS-internal user id of the member.
    pub id: i64,
}

/// An assignment, including its rubric when one is attached.
#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    /// Assignment id.
    pub id:        i64,
    /// Assignment name.
    pub name:      String,
    /// Current due date, ISO-8601.
    pub due_at:    Option<String>,
    /// Current lock date, ISO-8601.
    pub lock_at:   Option<String>,
    /// Current unlock date, ISO-8601.
    pub unlock_at: Option<String>,
    /// Rubric criteria, in rubric order.
    #[serde(default)]
    pub rubric:    Vec<RubricCriterion>,
}

/// One criterion of an assignment's rubric.
#[derive(Debug, Clone, Deserialize)]
pub struct RubricCriterion {
    /// Criterion id, referenced by rubric assessments.
    pub id:          String,
    /// Human-readable criterion description.
    pub description: String,
    /// Maximum points for this criterion.
    #[serde(default)]
    pub points:      f64,
}

/// An existing assignment override, as listed by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentOverride {
    /// Override id, needed for deletion.
    pub id:    i64,
    /// Override title, if any.
    pub title: Option<String>,
}

/// Request body for creating an assignment override.
///
/// Exactly one of `group_id` or `student_ids` is set, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideRequest {
    /// Group scope: the group this override applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id:    Option<i64>,
    /// Student scope: the students this override applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_ids: Option<Vec<i64>>,
    /// Title shown in the LMS UI; required for student-scoped overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title:       Option<String>,
    /// Replacement due date.
    pub due_at:      Option<String>,
    /// Replacement lock date.
    pub lock_at:     Option<String>,
    /// Replacement unlock date.
    pub unlock_at:   Option<String>,
}

/// Per-criterion allocation inside a rubric assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionAssessment {
    /// Selected rating id, if a rating was picked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_id: Option<String>,
    /// Grader comment for this criterion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments:  Option<String>,
    /// Points awarded for this criterion.
    pub points:    Option<f64>,
}

/// A rubric assessment: criterion id to allocation.
///
/// `BTreeMap` keeps serialization order stable so equality comparison against
/// the fetched assessment is meaningful.
pub type RubricAssessment = BTreeMap<String, CriterionAssessment>;

/// A submission with its rubric assessment, when one exists.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    /// The submitting student's user id.
    pub user_id:           i64,
    /// Total score, if graded.
    pub score:             Option<f64>,
    /// Attached rubric assessment, when requested and present.
    pub rubric_assessment: Option<RubricAssessment>,
}

/// A discussion topic (announcements share this shape).
#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionTopic {
    /// Topic id.
    pub id:    i64,
    /// Topic title.
    pub title: String,
}

/// A top-level discussion entry or a reply, as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicEntry {
    /// Entry id.
    pub id:         i64,
    /// Author's user id.
    pub user_id:    i64,
    /// Rich-markup message body.
    #[serde(default)]
    pub message:    String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last-update timestamp.
    pub updated_at: Option<String>,
}

/// A wiki page stub from the course page listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    /// Page title, the reconciliation key.
    pub title: String,
    /// URL slug used to address the page.
    pub url:   String,
}

/// Request body for creating or editing a wiki page.
#[derive(Debug, Clone, Serialize)]
pub struct PageRequest {
    /// Page title.
    pub title:     String,
    /// Whether the page is visible to students.
    pub published: bool,
    /// Rendered HTML body.
    pub body:      String,
}

/// A course module stub.
#[derive(Debug, Clone, Deserialize)]
pub struct Module {
    /// Module id.
    pub id:   i64,
    /// Module name, the reconciliation key.
    pub name: String,
}

/// Request body for creating or editing a module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleRequest {
    /// Module name.
    pub name:      String,
    /// Whether the module is visible to students.
    pub published: bool,
    /// Unlock date, if the module is timed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<String>,
}

/// An item inside a module.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleItem {
    /// Item title, matched against page titles for additive membership.
    pub title: String,
}

/// Request body for creating or updating a discussion topic.
#[derive(Debug, Clone, Serialize)]
pub struct DiscussionRequest {
    /// Topic title.
    pub title:           String,
    /// Rendered HTML message body.
    pub message:         String,
    /// Threading mode; defaults to `threaded` upstream of this struct.
    pub discussion_type: String,
    /// Whether the topic is visible to students.
    pub published:       bool,
    /// Delayed posting timestamp, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delayed_post_at: Option<String>,
    /// Whether the topic is an announcement.
    pub is_announcement: bool,
}

/// An assignment group stub.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentGroup {
    /// Assignment group id.
    pub id:   i64,
    /// Assignment group name, the reconciliation key.
    pub name: String,
}

/// Request body for creating or editing an assignment.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentRequest {
    /// Assignment name.
    pub name:                String,
    /// Whether the assignment is visible to students.
    pub published:           bool,
    /// Unlock date.
    pub unlock_at:           Option<String>,
    /// Position within the assignment group.
    pub position:            i64,
    /// Submission types accepted by the LMS.
    pub submission_types:    Vec<String>,
    /// Grading scheme.
    pub grading_type:        String,
    /// Maximum points.
    pub points_possible:     f64,
    /// Rendered HTML description.
    pub description:         String,
    /// Due date.
    pub due_at:              Option<String>,
    /// Lock date.
    pub lock_at:             Option<String>,
    /// Owning assignment group.
    pub assignment_group_id: i64,
}

/// A rubric stub from the course rubric listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Rubric {
    /// Rubric id.
    pub id:    i64,
    /// Rubric title, the reconciliation key.
    pub title: String,
}

/// Response wrapper returned by rubric creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedRubric {
    /// The created rubric.
    pub rubric: Rubric,
}

/// First-step response of the two-step file upload protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTarget {
    /// URL the file contents must be posted to.
    pub upload_url:    String,
    /// Opaque parameters that must accompany the upload.
    #[serde(default)]
    pub upload_params: serde_json::Map<String, serde_json::Value>,
}

/// Final response of a completed file upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    /// Id of the stored file, used to build file links.
    pub id: i64,
}
