#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Rubric-based grade moderation: overlays per-criterion scores from a CSV
//! onto each submission's rubric assessment, or exports the current
//! assessments for moderation review.
//!
//! Writes follow a read-compare-write pattern: the new assessment is
//! computed locally and only written when it differs from the fetched one,
//! so re-running the same adjustment CSV produces zero writes.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result, bail};

use crate::{
    lms::{
        LmsClient, LmsError,
        models::{CriterionAssessment, RubricAssessment, RubricCriterion},
    },
    roster::{Student, get_students},
};

/// Synthesizes a zero-filled assessment keyed by every rubric criterion id.
///
/// Used when a submission has no rubric assessment yet, so an overlay always
/// has a complete base to land on.
pub fn zero_assessment(rubric: &[RubricCriterion]) -> RubricAssessment {
    rubric
        .iter()
        .map(|criterion| {
            (criterion.id.clone(), CriterionAssessment {
                rating_id: None,
                comments:  None,
                points:    Some(0.0),
            })
        })
        .collect()
}

/// Overlays absolute per-criterion scores onto an assessment.
///
/// Criteria absent from the assessment are inserted; entries not named in
/// `scores` are left untouched.
pub fn overlay_scores(assessment: &mut RubricAssessment, scores: &[(String, f64)]) {
    for (criterion_id, points) in scores {
        assessment.entry(criterion_id.clone()).or_default().points = Some(*points);
    }
}

/// Adjusts marks from the moderation CSV at `input`, or exports the current
/// assessments to `output` when no input is given.
pub async fn adjust_marks(
    client: &LmsClient,
    assignment_id: i64,
    input: Option<&Path>,
    output: &Path,
) -> Result<()> {
    let Some(input) = input else {
        return export_moderation(client, assignment_id, output).await;
    };

    let assignment = client.get_assignment(assignment_id).await?;
    if assignment.rubric.is_empty() {
        bail!("Assignment `{}` has no rubric to moderate against", assignment.name);
    }
    let criterion_by_description: HashMap<&str, &str> = assignment
        .rubric
        .iter()
        .map(|c| (c.description.as_str(), c.id.as_str()))
        .collect();

    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Could not read {}", input.display()))?;
    let headers = reader.headers().context("Moderation CSV has no header row")?.clone();

    let id_column = headers
        .iter()
        .position(|h| h == "id")
        .context("Moderation CSV must have an `id` column")?;
    // Columns whose header matches a criterion description verbatim; all
    // other columns (identity fields, totals) are ignored.
    let score_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter_map(|(index, header)| {
            criterion_by_description
                .get(header)
                .map(|id| (index, (*id).to_string()))
        })
        .collect();

    let mut writes = 0usize;
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.context("Malformed moderation CSV")?;
        let user_id: i64 = record
            .get(id_column)
            .unwrap_or_default()
            .trim()
            .parse()
            .with_context(|| format!("Bad id in row {:?}", record.position().map(|p| p.line())))?;

        let submission = match client.get_submission(assignment_id, user_id).await {
            Ok(submission) => submission,
            // Grading-period lookups can legitimately miss; skip and continue.
            Err(LmsError::NotFound(what)) => {
                tracing::warn!("Skipping user {user_id}: {what}");
                skipped += 1;
                continue;
            }
            Err(other) => return Err(other.into()),
        };

        let original = submission
            .rubric_assessment
            .unwrap_or_else(|| zero_assessment(&assignment.rubric));

        let mut scores = Vec::new();
        for (index, criterion_id) in &score_columns {
            let cell = record.get(*index).unwrap_or_default().trim();
            if cell.is_empty() {
                continue;
            }
            let points: f64 = cell
                .parse()
                .with_context(|| format!("Bad score `{cell}` for user {user_id}"))?;
            scores.push((criterion_id.clone(), points));
        }

        let mut updated = original.clone();
        overlay_scores(&mut updated, &scores);

        if updated != original {
            client
                .update_rubric_assessment(assignment_id, user_id, &updated)
                .await?;
            writes += 1;
        }
    }

    tracing::info!("Moderation complete: {writes} assessments written, {skipped} rows skipped");
    Ok(())
}

/// Exports every submission's total score and per-criterion points, joined
/// with student identity fields, in a fixed column layout for moderation
/// review.
async fn export_moderation(client: &LmsClient, assignment_id: i64, output: &Path) -> Result<()> {
    let assignment = client.get_assignment(assignment_id).await?;
    let submissions = client.list_submissions(assignment_id).await?;
    let students: HashMap<i64, Student> = get_students(client)
        .await?
        .into_iter()
        .map(|student| (student.id, student))
        .collect();

    tracing::info!(
        "Exporting {} submissions for `{}` to {}",
        submissions.len(),
        assignment.name,
        output.display()
    );

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Could not create {}", output.display()))?;

    let mut header = vec![
        "id".to_string(),
        "sid".to_string(),
        "name".to_string(),
        "unikey".to_string(),
        "email".to_string(),
        "section".to_string(),
        "group".to_string(),
        "score".to_string(),
    ];
    header.extend(assignment.rubric.iter().map(|c| c.description.clone()));
    writer.write_record(&header)?;

    for submission in &submissions {
        let student = students.get(&submission.user_id);
        let mut record = vec![
            submission.user_id.to_string(),
            student.and_then(|s| s.sid.clone()).unwrap_or_default(),
            student.map(|s| s.name.clone()).unwrap_or_default(),
            student.and_then(|s| s.unikey.clone()).unwrap_or_default(),
            student.and_then(|s| s.email.clone()).unwrap_or_default(),
            student.and_then(|s| s.section.clone()).unwrap_or_default(),
            student.and_then(|s| s.group.clone()).unwrap_or_default(),
            submission.score.map(|s| s.to_string()).unwrap_or_default(),
        ];
        for criterion in &assignment.rubric {
            let points = submission
                .rubric_assessment
                .as_ref()
                .and_then(|assessment| assessment.get(&criterion.id))
                .and_then(|entry| entry.points);
            record.push(points.map(|p| p.to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    writer.flush().context("Could not flush moderation CSV")?;
    Ok(())
}
