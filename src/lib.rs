//! # lectern
//!
//! A course administration tool that automates LMS workflows from the
//! command line: roster export, due-date overrides, rubric moderation,
//! discussion export, declarative publishing, board-post aggregation and
//! containerized builds of course materials.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// For building static course artifacts via containerized converters
pub mod build;
/// Environment credentials and the course description
pub mod config;
/// For exporting discussion contributions
pub mod discussions;
/// A thin client for the LMS REST API
pub mod lms;
/// For rubric-based grade moderation
pub mod moderate;
/// For replacing assignment due-date overrides
pub mod overrides;
/// For aggregating sticky-note board posts
pub mod padlet;
/// Runners for external processes
pub mod process;
/// For publishing the declarative course description
pub mod publish;
/// For building the normalized student roster
pub mod roster;
/// For generating presentation schedules
pub mod schedule;
/// One-shot template rendering with calendar helpers
pub mod templates;
/// Utility functions for convenience
pub mod util;
