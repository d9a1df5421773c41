#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # lectern
//!
//! A CLI to interact with an LMS course: export rosters and discussions,
//! replace due-date overrides, moderate rubric marks, publish a declarative
//! course description, aggregate board posts, and build course materials
//! with containerized converters.

use std::path::PathBuf;

use anyhow::Result;
use bpaf::*;
use dotenvy::dotenv;
use lectern::{build, config, discussions, moderate, overrides, padlet, publish, roster, schedule};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Options for the build command.
#[derive(Debug, Clone)]
struct BuildOpts {
    /// Whether to build lecture materials.
    lecture:         bool,
    /// Lecture input directory.
    lecture_dir:     PathBuf,
    /// Whether to build HTML lecture materials.
    html:            bool,
    /// Whether to build PDF lecture materials.
    pdf:             bool,
    /// Whether to build assessments.
    assessments:     bool,
    /// Assessments input directory.
    assessments_dir: PathBuf,
    /// Whether to copy extra files.
    extras:          bool,
    /// Extras input directory, relative to the lms directory.
    extras_dir:      PathBuf,
    /// Build output directory.
    output:          PathBuf,
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Download the student roster
    Roster(PathBuf),
    /// Download discussion contributions
    Discussions(i64, PathBuf),
    /// Replace or export assignment due-date overrides
    Due(i64, Option<PathBuf>, PathBuf),
    /// Moderate rubric marks or export assessments
    Moderate(i64, Option<PathBuf>, PathBuf),
    /// Publish the course description
    Publish(PathBuf),
    /// Build the learning materials
    Build(BuildOpts),
    /// Delete the build directory
    Clean(PathBuf),
    /// Render templates without invoking containers
    Preprocess(PathBuf, PathBuf),
    /// Serve the course site locally
    Start(u16),
    /// Generate a case-study presentation schedule
    Schedule(String, usize, usize),
    /// Aggregate board posts per author and section
    Padlet(String, PathBuf),
}

/// parses an output file path with a default
fn output(default: &'static str) -> impl Parser<PathBuf> {
    long("output")
        .short('o')
        .help("Specify the output file")
        .argument::<PathBuf>("PATH")
        .fallback(PathBuf::from(default))
}

/// parses an assignment id
fn assignment() -> impl Parser<i64> {
    long("assignment")
        .short('a')
        .help("Specify the assignment id")
        .argument::<i64>("ID")
}

/// parses an optional input CSV path
fn input() -> impl Parser<Option<PathBuf>> {
    long("input")
        .short('i')
        .help("Specify the input CSV file")
        .argument::<PathBuf>("PATH")
        .optional()
}

/// parses a default-on toggle disabled by its --no-<name> flag
fn toggle(name: &'static str, help: &'static str) -> impl Parser<bool> {
    long(name).help(help).switch().map(|off| !off)
}

/// parses a directory option with a default
fn dir(name: &'static str, default: &'static str, help: &'static str) -> impl Parser<PathBuf> {
    long(name)
        .help(help)
        .argument::<PathBuf>("DIR")
        .fallback(PathBuf::from(default))
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    let roster_out = output("roster.csv");
    let roster = construct!(Cmd::Roster(roster_out))
        .to_options()
        .command("roster")
        .help("Download the student roster of the course in csv format");

    let topic = long("topic")
        .help("Specify the discussion topic id (0 means all topics)")
        .argument::<i64>("ID")
        .fallback(0);
    let discussions_out = output("discussions.csv");
    let discussions = construct!(Cmd::Discussions(topic, discussions_out))
        .to_options()
        .command("discussions")
        .help("Download the discussions of the course in csv format");

    let due_out = output("extensions.csv");
    let due = construct!(Cmd::Due(assignment(), input(), due_out))
        .to_options()
        .command("due")
        .help("Update the due dates for an assignment, or export a template");

    let moderate_out = output("moderation.csv");
    let moderate = construct!(Cmd::Moderate(assignment(), input(), moderate_out))
        .to_options()
        .command("moderate")
        .help("Moderate rubric marks, or export assessments for review");

    let lms_dir = long("lms")
        .help("Specify the lms input directory")
        .argument::<PathBuf>("DIR")
        .fallback(PathBuf::from("./lms"));
    let publish = construct!(Cmd::Publish(lms_dir))
        .to_options()
        .command("publish")
        .help("Publish the course description to the LMS");

    let build_opts = {
        let lecture = toggle("no-lecture", "Skip building lecture materials");
        let lecture_dir = dir("lecture-dir", "lecture", "Specify the lecture input directory");
        let html = toggle("no-html", "Skip building HTML lecture materials");
        let pdf = toggle("no-pdf", "Skip building PDF lecture materials");
        let assessments = toggle("no-assessments", "Skip building assessments");
        let assessments_dir = dir(
            "assessments-dir",
            "assessments",
            "Specify the assessments input directory",
        );
        let extras = toggle("no-extras", "Skip copying extra files");
        let extras_dir = dir("extras-dir", "extra", "Specify the extra files input directory");
        let output = dir("output", "build", "Specify the build directory");
        construct!(BuildOpts {
            lecture,
            lecture_dir,
            html,
            pdf,
            assessments,
            assessments_dir,
            extras,
            extras_dir,
            output
        })
    };
    let build = construct!(Cmd::Build(build_opts))
        .to_options()
        .command("build")
        .help("Build the learning materials");

    let clean_dir = dir("output", "build", "Specify the build directory");
    let clean = construct!(Cmd::Clean(clean_dir))
        .to_options()
        .command("clean")
        .help("Clean the build");

    let pre_in = long("input")
        .short('i')
        .help("Specify the input directory containing templates")
        .argument::<PathBuf>("DIR")
        .fallback(PathBuf::from("assessments"));
    let pre_out = long("output")
        .short('o')
        .help("Specify the output directory for rendered files")
        .argument::<PathBuf>("DIR")
        .fallback(PathBuf::from("assessments-rendered"));
    let preprocess = construct!(Cmd::Preprocess(pre_in, pre_out))
        .to_options()
        .command("preprocess")
        .help("Render templates in assessment files without containers");

    let port = long("port")
        .help("Port to run the server on")
        .argument::<u16>("PORT")
        .fallback(8000);
    let start = construct!(Cmd::Start(port))
        .to_options()
        .command("start")
        .help("Start serving the course site locally");

    let groups = positional::<String>("GROUPS").help("Comma-separated list of group names");
    let weeks = long("weeks")
        .help("Number of weeks")
        .argument::<usize>("N")
        .fallback(7);
    let questions = long("questions")
        .help("Number of questions per week")
        .argument::<usize>("N")
        .fallback(2);
    let schedule = construct!(Cmd::Schedule(groups, weeks, questions))
        .to_options()
        .command("schedule")
        .help("Schedule the case study discussions");

    let color = long("color")
        .short('c')
        .help("Specify the post color to count as pinned")
        .argument::<String>("COLOR")
        .fallback("red".to_string());
    let padlet_out = output("padlet.csv");
    let padlet = construct!(Cmd::Padlet(color, padlet_out))
        .to_options()
        .command("padlet")
        .help("Download the board posts");

    let cmd = construct!([
        roster,
        discussions,
        due,
        moderate,
        publish,
        build,
        clean,
        preprocess,
        start,
        schedule,
        padlet
    ]);

    cmd.to_options()
        .descr("A CLI to interact with an LMS course")
        .run()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let cmd = options();

    match cmd {
        Cmd::Roster(output) => {
            let client = config::ensure_online()?.lms()?;
            roster::download_roster(&client, &output).await?;
        }
        Cmd::Discussions(topic, output) => {
            let client = config::ensure_online()?.lms()?;
            discussions::download_discussions(&client, topic, &output).await?;
        }
        Cmd::Due(assignment, input, output) => {
            let client = config::ensure_online()?.lms()?;
            overrides::update_due_dates(&client, assignment, input.as_deref(), &output).await?;
        }
        Cmd::Moderate(assignment, input, output) => {
            let client = config::ensure_online()?.lms()?;
            moderate::adjust_marks(&client, assignment, input.as_deref(), &output).await?;
        }
        Cmd::Publish(lms_dir) => {
            let client = config::ensure_online()?.lms()?;
            publish::publish(&client, &lms_dir).await?;
        }
        Cmd::Build(opts) => {
            tracing::info!("Building the learning materials");
            if opts.assessments {
                build::build_assessments(&opts.assessments_dir, &opts.output).await?;
            }
            if opts.lecture {
                build::build_lectures(&opts.lecture_dir, opts.html, opts.pdf, &opts.output).await?;
            }
            if opts.extras {
                build::copy_extras(&opts.extras_dir, &opts.output)?;
            }
        }
        Cmd::Clean(output) => build::clean(&output),
        Cmd::Preprocess(input, output) => build::preprocess(&input, &output)?,
        Cmd::Start(port) => build::start(port).await?,
        Cmd::Schedule(groups, weeks, questions) => {
            let groups: Vec<String> = groups.split(',').map(str::to_string).collect();
            println!("{}", schedule::generate_schedule(groups, weeks, questions));
        }
        Cmd::Padlet(color, output) => {
            let handle = config::ensure_online()?;
            let api_key = handle.padlet_key()?.to_string();
            padlet::export_padlet(&handle.http_client(), &api_key, &color, &output).await?;
        }
    };

    Ok(())
}
