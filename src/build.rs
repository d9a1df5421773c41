#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Builds static course artifacts: assessments and lecture slides are
//! rendered by external containerized converters, extras are copied as-is.
//!
//! Containers run one at a time, synchronously; any conversion failure is
//! fatal and carries the container's stderr.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    config,
    process::{run_collect, run_interactive},
    templates,
    util::{copy_dir_recursive, copy_files, docker_path, mkdocs_path},
};

/// Container image that renders assessment documents.
pub const ASSESSMENT_IMAGE: &str = "ghcr.io/re3-work/pandoc-assessments:latest";

/// Container image that renders lecture slide decks.
pub const LECTURE_IMAGE: &str = "ghcr.io/re3-work/marp-usbs:latest";

/// Loads the week-1 anchor from the course description, when the working
/// directory is a course workspace.
pub fn load_week_1() -> Result<Option<NaiveDate>> {
    if !Path::new(config::COURSE_FILE).exists() {
        return Ok(None);
    }
    let description = config::load_course_description(Path::new("lms"))?;
    description
        .config
        .week_1
        .as_deref()
        .map(templates::parse_week_1)
        .transpose()
}

/// Renders one assessment source through the template pass with the
/// week-1 date context.
pub fn render_assessment_file(path: &Path, week_1: NaiveDate) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let mut context = tera::Context::new();
    context.insert("week_1", &week_1.format("%Y-%m-%d").to_string());
    templates::render_str(&text, &context, Some(week_1))
        .with_context(|| format!("Could not render {}", path.display()))
}

/// Stages sources into `dest`, rendering `.md`/`.yml` files through the
/// template pass when a week-1 anchor is available and copying everything
/// else verbatim.
fn stage_sources(in_dir: &Path, dest: &Path, week_1: Option<NaiveDate>) -> Result<()> {
    for entry in std::fs::read_dir(in_dir)
        .with_context(|| format!("Could not read {}", in_dir.display()))?
    {
        let entry = entry?;
        let src = entry.path();
        let target = dest.join(entry.file_name());

        if src.is_dir() {
            copy_dir_recursive(&src, &target)?;
            continue;
        }

        let is_template = src
            .extension()
            .is_some_and(|ext| ext == "md" || ext == "yml");
        match (is_template, week_1) {
            (true, Some(week_1)) => {
                std::fs::write(&target, render_assessment_file(&src, week_1)?)
                    .with_context(|| format!("Could not write {}", target.display()))?;
            }
            _ => {
                std::fs::copy(&src, &target).with_context(|| {
                    format!("Could not copy {} to {}", src.display(), target.display())
                })?;
            }
        }
    }
    Ok(())
}

/// Renders every assessment source and collects the produced documents into
/// `<build>/assessments/`.
pub async fn build_assessments(in_dir: &Path, build_dir: &Path) -> Result<()> {
    let docker = docker_path()?;
    let week_1 = load_week_1()?;

    let temp = std::env::temp_dir().join(format!("lectern-assessments-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&temp)
        .with_context(|| format!("Could not create {}", temp.display()))?;

    stage_sources(in_dir, &temp, week_1)?;

    let mut sources: Vec<PathBuf> = std::fs::read_dir(&temp)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    sources.sort();

    for source in &sources {
        let name = source
            .file_name()
            .context("assessment source has no file name")?
            .to_string_lossy()
            .into_owned();
        let defaults = Path::new(&name).with_extension("yml");
        tracing::info!("Rendering assessment `{name}`");

        let args: Vec<OsString> = vec![
            "run".into(),
            "--rm".into(),
            "-v".into(),
            format!("{}:/data/", temp.display()).into(),
            ASSESSMENT_IMAGE.into(),
            name.clone().into(),
            "-d".into(),
            defaults.into_os_string(),
        ];
        run_collect(&docker, &args, None, &[])
            .await?
            .ensure_success(&format!("Assessment rendering for `{name}`"))?;
    }

    copy_files(&temp, "*.pdf", build_dir, true, Some("assessments"))?;
    copy_files(&temp, "*.csv", build_dir, false, Some("assessments"))?;
    let _ = std::fs::remove_dir_all(&temp);
    Ok(())
}

/// Renders the lecture slide decks to PDF and/or HTML and collects the
/// outputs and slide assets into the build directory.
pub async fn build_lectures(in_dir: &Path, html: bool, pdf: bool, build_dir: &Path) -> Result<()> {
    let docker = docker_path()?;
    let in_abs = in_dir
        .canonicalize()
        .with_context(|| format!("Lecture directory {} does not exist", in_dir.display()))?;

    // The container maps the invoking user when MARP_USER is set, so
    // rendered files are not owned by root.
    let env: Vec<(OsString, OsString)> = std::env::var_os("MARP_USER")
        .map(|user| vec![(OsString::from("MARP_USER"), user)])
        .unwrap_or_default();

    for (enabled, mode) in [(pdf, "--pdf"), (html, "--html")] {
        if !enabled {
            continue;
        }
        tracing::info!("Rendering lectures ({mode})");
        let mut args: Vec<OsString> = vec![
            "run".into(),
            "--rm".into(),
            "-v".into(),
            format!("{}:/home/marp/app/", in_abs.display()).into(),
        ];
        for (key, value) in &env {
            args.push("-e".into());
            let mut pair = key.clone();
            pair.push("=");
            pair.push(value);
            args.push(pair);
        }
        args.extend::<Vec<OsString>>(vec![
            LECTURE_IMAGE.into(),
            "--engine".into(),
            "/home/marp/core/engine.js".into(),
            "--theme".into(),
            "/home/marp/core/usbs.css".into(),
            "--allow-local-files".into(),
            "-I".into(),
            mode.into(),
            ".".into(),
        ]);
        run_collect(&docker, &args, None, &[])
            .await?
            .ensure_success(&format!("Lecture rendering ({mode})"))?;
    }

    if pdf {
        copy_files(in_dir, "**/*.pdf", build_dir, true, None)?;
    }
    if html {
        copy_files(in_dir, "**/*.html", build_dir, true, None)?;
        copy_files(in_dir, "assets/*.png", build_dir, false, None)?;
        copy_files(in_dir, "**/assets/*.png", build_dir, false, None)?;
        copy_files(in_dir, "assets/*.jpg", build_dir, false, None)?;
        copy_files(in_dir, "**/assets/*.jpg", build_dir, false, None)?;
    }
    Ok(())
}

/// Copies extra PDFs from the lms directory into the build tree.
pub fn copy_extras(extras_dir: &Path, build_dir: &Path) -> Result<()> {
    copy_files(&Path::new("lms").join(extras_dir), "*.pdf", build_dir, false, None)
}

/// Deletes the build directory.
pub fn clean(build_dir: &Path) {
    tracing::info!("Cleaning {}", build_dir.display());
    let _ = std::fs::remove_dir_all(build_dir);
}

/// Renders the templates in `input_dir` into `output_dir` without invoking
/// any containers, for CI environments without a container runtime.
pub fn preprocess(input_dir: &Path, output_dir: &Path) -> Result<()> {
    if !input_dir.exists() {
        bail!("Input directory {} does not exist", input_dir.display());
    }

    let week_1 = load_week_1()?;
    if week_1.is_none() {
        tracing::warn!("Could not load week_1 from {}, templates will not have date context",
            config::COURSE_FILE);
    }

    if output_dir.exists() {
        std::fs::remove_dir_all(output_dir)
            .with_context(|| format!("Could not clear {}", output_dir.display()))?;
    }
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Could not create {}", output_dir.display()))?;

    tracing::info!(
        "Preprocessing templates from {} to {}",
        input_dir.display(),
        output_dir.display()
    );
    stage_sources(input_dir, output_dir, week_1)
}

/// Serves the course site locally by delegating to the docs server.
pub async fn start(port: u16) -> Result<()> {
    let mkdocs = mkdocs_path()?;
    tracing::info!("Starting the course site at http://localhost:{port}");
    let args: Vec<OsString> = vec!["serve".into(), "-a".into(), format!("localhost:{port}").into()];
    let status = run_interactive(&mkdocs, &args, Some(Path::new("lms"))).await?;
    if !status.success() {
        bail!("mkdocs serve exited with {status}");
    }
    Ok(())
}
