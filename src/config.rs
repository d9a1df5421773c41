#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Global configuration: environment credentials, the course description
//! parsed from `lms/lms.yml`, and lazily constructed API clients.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock},
};

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;
use state::InitCell;

use crate::lms::LmsClient;

/// Environment variable carrying the LMS API token.
pub const LMS_API_KEY: &str = "LMS_API_KEY";

/// Environment variable carrying the board API token.
pub const PADLET_API_KEY: &str = "PADLET_API_KEY";

/// Default location of the course description relative to the course
/// workspace root.
pub const COURSE_FILE: &str = "lms/lms.yml";

/// One module definition inside the course description.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSpec {
    /// Module display name, the reconciliation key.
    pub title:     String,
    /// Whether the module is visible to students.
    pub published: bool,
    /// Unlock date for timed modules.
    #[serde(default)]
    pub unlock_at: Option<String>,
    /// Page sources, in module order, relative to the lms directory.
    pub pages:     Vec<String>,
}

/// One assignment group definition inside the course description.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentGroupSpec {
    /// Assignment group display name, the reconciliation key.
    pub title:       String,
    /// Assignment sources, in order, relative to the lms directory.
    pub assignments: Vec<String>,
}

/// The typed view of the course description.
///
/// Arbitrary extra keys are preserved in `extra` so they can flow into the
/// template context when documents are rendered.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseConfig {
    /// Base URL of the LMS instance.
    pub lms_url:     String,
    /// Course id on the LMS.
    pub course_id:   i64,
    /// Front page source, relative to the lms directory.
    #[serde(default)]
    pub frontpage:   Option<String>,
    /// ISO date of the Monday of week 1, used for date arithmetic in
    /// templates.
    #[serde(default)]
    pub week_1:      Option<String>,
    /// Module definitions, keyed by an internal name.
    #[serde(default)]
    pub modules:     BTreeMap<String, ModuleSpec>,
    /// Discussion sources, relative to the lms directory.
    #[serde(default)]
    pub discussions: Vec<String>,
    /// Assignment group definitions, keyed by an internal name.
    #[serde(default)]
    pub assignments: BTreeMap<String, AssignmentGroupSpec>,
    /// Everything else, preserved for template substitution.
    #[serde(flatten)]
    pub extra:       serde_yaml::Mapping,
}

/// A course description together with its raw YAML mapping.
///
/// The raw mapping is what gets merged with per-document front-matter; the
/// typed view drives the publisher.
#[derive(Debug, Clone)]
pub struct CourseDescription {
    /// Typed view.
    pub config: CourseConfig,
    /// Raw mapping, as parsed after the template pass.
    pub raw:    serde_yaml::Mapping,
}

/// Renders a course description file through the template engine and parses
/// it. The file is itself a template so dates and repeated values can be
/// computed instead of spelled out.
pub fn load_course_description(lms_dir: &Path) -> Result<CourseDescription> {
    let path = lms_dir.join("lms.yml");
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let rendered = tera::Tera::one_off(&text, &tera::Context::new(), false)
        .with_context(|| format!("Could not render {}", path.display()))?;

    let raw: serde_yaml::Mapping = serde_yaml::from_str(&rendered)
        .with_context(|| format!("Could not parse {}", path.display()))?;
    let config: CourseConfig = serde_yaml::from_str(&rendered)
        .with_context(|| format!("Unexpected course description shape in {}", path.display()))?;

    Ok(CourseDescription { config, raw })
}

/// Configuration shared across the crate.
pub struct ConfigState {
    /// LMS API token, if present in the environment.
    lms_token:   Option<String>,
    /// Board API token, if present in the environment.
    padlet_key:  Option<String>,
    /// Shared reqwest HTTP client reused across network helpers.
    http_client: Client,
    /// Course description, when the working directory is a course workspace.
    course:      Option<CourseDescription>,
    /// Lazily constructed LMS client.
    lms_client:  InitCell<LmsClient>,
}

impl ConfigState {
    /// Construct a new configuration instance by reading the environment and
    /// the course description, when present.
    fn new() -> Result<Self> {
        let lms_token = std::env::var(LMS_API_KEY)
            .ok()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        let padlet_key = std::env::var(PADLET_API_KEY)
            .ok()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());

        let http_client = Client::builder()
            // Avoid macOS dynamic store lookups that fail in sandboxed environments.
            .no_proxy()
            .build()
            .context("Failed to construct shared HTTP client")?;

        let course = if PathBuf::from(COURSE_FILE).exists() {
            Some(load_course_description(Path::new("lms"))?)
        } else {
            None
        };

        Ok(Self {
            lms_token,
            padlet_key,
            http_client,
            course,
            lms_client: InitCell::new(),
        })
    }

    /// Returns a clone of the shared reqwest HTTP client.
    pub fn http_client(&self) -> Client {
        self.http_client.clone()
    }

    /// Returns the course description, failing when the working directory is
    /// not a course workspace.
    pub fn course(&self) -> Result<&CourseDescription> {
        self.course.as_ref().with_context(|| {
            format!("Does not appear to be a course workspace ({COURSE_FILE} missing)")
        })
    }

    /// Returns the board API token, failing when it is absent.
    pub fn padlet_key(&self) -> Result<&str> {
        self.padlet_key
            .as_deref()
            .with_context(|| format!("{PADLET_API_KEY} environment variable not set"))
    }

    /// Returns the course-scoped LMS client, constructing it on first use.
    ///
    /// Both the API token and the course description must be present; their
    /// absence is a precondition failure, reported before any network call.
    pub fn lms(&self) -> Result<LmsClient> {
        if let Some(client) = self.lms_client.try_get() {
            return Ok(client.clone());
        }

        let Some(token) = self.lms_token.clone() else {
            bail!("{LMS_API_KEY} environment variable not set");
        };
        let course = self.course()?;
        let client = LmsClient::new(
            &course.config.lms_url,
            token,
            course.config.course_id,
            self.http_client(),
        );
        self.lms_client.set(client);
        Ok(self.lms_client.get().clone())
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Ensure the global configuration has been initialized and return a handle.
pub fn ensure_initialized() -> Result<ConfigHandle> {
    let slot = slot();
    let mut guard = slot.lock().expect("config slot poisoned");
    if let Some(cfg) = guard.as_ref() {
        return Ok(ConfigHandle(Arc::clone(cfg)));
    }

    let cfg = ConfigState::new().map(Arc::new)?;
    *guard = Some(Arc::clone(&cfg));
    Ok(ConfigHandle(cfg))
}

/// Validates the preconditions of an online command and returns the handle:
/// the API token and course description must both be present.
pub fn ensure_online() -> Result<ConfigHandle> {
    let handle = ensure_initialized()?;
    handle.lms()?;
    Ok(handle)
}
