#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Generates the case-study presentation schedule: groups are shuffled and
//! laid out on a weeks × questions grid.

use colored::Colorize;
use itertools::Itertools;
use rand::seq::SliceRandom;
use tabled::{builder::Builder, settings::Style};

/// A laid-out schedule grid plus any groups that did not fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// `rows[question][week]`, empty string for unfilled cells.
    pub rows:        Vec<Vec<String>>,
    /// Groups left over when there are more groups than slots.
    pub unscheduled: Vec<String>,
}

/// Fills a weeks × questions grid row-major from `groups`.
///
/// With fewer groups than slots the remaining cells stay empty; with more,
/// the excess groups are reported back as unscheduled.
pub fn layout_schedule(groups: &[String], weeks: usize, questions: usize) -> Schedule {
    let slots = weeks * questions;
    let mut rows = vec![vec![String::new(); weeks]; questions];

    for (index, group) in groups.iter().take(slots).enumerate() {
        rows[index / weeks][index % weeks] = group.clone();
    }

    Schedule {
        rows,
        unscheduled: groups.iter().skip(slots).cloned().collect(),
    }
}

/// Renders a schedule grid as a markdown table.
pub fn render_schedule(schedule: &Schedule) -> String {
    let weeks = schedule.rows.first().map_or(0, Vec::len);

    let mut builder = Builder::default();
    let mut header = vec![String::new()];
    header.extend((1..=weeks).map(|week| format!("Week {week}")));
    builder.push_record(header);

    for (index, row) in schedule.rows.iter().enumerate() {
        let mut record = vec![format!("Question {}", index + 1)];
        record.extend(row.iter().cloned());
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::markdown());
    table.to_string()
}

/// Shuffles `groups` and prints the schedule table, warning when not every
/// group could be scheduled.
pub fn generate_schedule(mut groups: Vec<String>, weeks: usize, questions: usize) -> String {
    groups.shuffle(&mut rand::rng());
    let schedule = layout_schedule(&groups, weeks, questions);

    if !schedule.unscheduled.is_empty() {
        eprintln!(
            "{}",
            format!(
                "Warning: {} groups did not fit the schedule: {}",
                schedule.unscheduled.len(),
                schedule.unscheduled.iter().join(", ")
            )
            .yellow()
        );
    }

    render_schedule(&schedule)
}
