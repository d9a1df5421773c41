#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! One-shot template rendering with course-calendar helpers.
//!
//! Documents and the course description are Tera templates. Templates see
//! every metadata key as a variable plus, when the course defines `week_1`,
//! a `weeks_after(weeks, days?)` function that returns the ISO date that far
//! into the teaching calendar.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use tera::{Tera, Value};

/// Parses the course's `week_1` value into a date.
pub fn parse_week_1(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("week_1 `{value}` is not an ISO date (YYYY-MM-DD)"))
}

/// Builds a template context from a YAML mapping.
pub fn context_from_mapping(mapping: &serde_yaml::Mapping) -> Result<tera::Context> {
    let json = serde_json::to_value(mapping).context("Course metadata is not JSON-compatible")?;
    tera::Context::from_value(json).context("Course metadata cannot form a template context")
}

/// Renders `text` as a one-shot template against `context`.
///
/// When `week_1` is given, the `weeks_after` helper is available to the
/// template.
pub fn render_str(
    text: &str,
    context: &tera::Context,
    week_1: Option<NaiveDate>,
) -> Result<String> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    if let Some(week_1) = week_1 {
        tera.register_function("weeks_after", weeks_after(week_1));
    }
    tera.add_raw_template("document", text)
        .context("Could not parse document template")?;
    tera.render("document", context)
        .context("Could not render document template")
}

/// Returns the `weeks_after(weeks, days?)` template function anchored at
/// week 1.
fn weeks_after(week_1: NaiveDate) -> impl tera::Function {
    move |args: &std::collections::HashMap<String, Value>| -> tera::Result<Value> {
        let weeks = args
            .get("weeks")
            .and_then(Value::as_i64)
            .ok_or_else(|| tera::Error::msg("weeks_after requires a `weeks` argument"))?;
        let days = args.get("days").and_then(Value::as_i64).unwrap_or(0);
        let date = week_1 + Duration::weeks(weeks) + Duration::days(days);
        Ok(Value::String(date.format("%Y-%m-%d").to_string()))
    }
}
