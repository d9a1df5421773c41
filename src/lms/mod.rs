#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! A thin client for the LMS REST API.
//!
//! Only the endpoints the orchestration layer needs are wrapped. Listings
//! follow `Link: rel="next"` pagination to exhaustion, so callers always see
//! complete collections. "Not found" is a tagged error variant
//! ([`LmsError::NotFound`]) so the one code path that tolerates it can match
//! on it without also swallowing unrelated failures.

pub mod models;

use std::path::Path;

use reqwest::{Client, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use thiserror::Error;

use self::models::*;

/// Errors surfaced by the LMS client.
#[derive(Debug, Error)]
pub enum LmsError {
    /// The remote reported that the addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The remote rejected the request for any other reason.
    #[error("LMS API error ({status}): {body}")]
    Api {
        /// HTTP status returned by the API.
        status: StatusCode,
        /// Response body, as returned.
        body:   String,
    },
    /// Transport-level failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// Local filesystem failure while preparing a request.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias for client results.
pub type LmsResult<T> = Result<T, LmsError>;

/// Page size requested on every listing.
const PER_PAGE: &str = "100";

/// A course-scoped handle to the LMS API.
#[derive(Debug, Clone)]
pub struct LmsClient {
    /// Base URL of the LMS instance, without a trailing slash.
    base_url:  String,
    /// Bearer token used for every request.
    token:     String,
    /// The course all requests are scoped to.
    course_id: i64,
    /// Shared HTTP client.
    client:    Client,
}

impl LmsClient {
    /// Creates a client scoped to one course.
    pub fn new(base_url: &str, token: String, course_id: i64, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            course_id,
            client,
        }
    }

    /// Returns the course id this client is scoped to.
    pub fn course_id(&self) -> i64 {
        self.course_id
    }

    /// Builds an absolute URL under the course resource.
    fn course_url(&self, suffix: &str) -> String {
        format!("{}/api/v1/courses/{}{}", self.base_url, self.course_id, suffix)
    }

    /// Maps a response to `LmsError` unless it is a success, tagging 404 as
    /// `NotFound` with the supplied description.
    async fn check(resp: Response, what: &str) -> LmsResult<Response> {
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LmsError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LmsError::Api { status, body });
        }
        Ok(resp)
    }

    /// GETs one resource as JSON.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> LmsResult<T> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        Ok(Self::check(resp, what).await?.json().await?)
    }

    /// GETs a paginated collection, following `Link: rel="next"` headers
    /// until the listing is exhausted.
    async fn get_all<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> LmsResult<Vec<T>> {
        let mut out = Vec::new();
        let mut request = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .query(&[("per_page", PER_PAGE)]);

        loop {
            let resp = request.send().await?;
            let resp = Self::check(resp, what).await?;
            let next = next_page_url(&resp);
            let page: Vec<T> = resp.json().await?;
            out.extend(page);

            match next {
                // The next URL carries the original query string already.
                Some(next) => request = self.client.get(next).bearer_auth(&self.token),
                None => return Ok(out),
            }
        }
    }

    /// Sends `body` as JSON with the given method and decodes the response.
    async fn send_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &B,
        what: &str,
    ) -> LmsResult<T> {
        let resp = self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(resp, what).await?.json().await?)
    }

    // ---- enrollment and groups ----

    /// Lists every student enrolled in the course, with enrollment metadata
    /// and email addresses included.
    pub async fn list_students(&self) -> LmsResult<Vec<User>> {
        self.get_all(
            &self.course_url("/users"),
            &[
                ("enrollment_type[]", "student".to_string()),
                ("include[]", "enrollments".to_string()),
                ("include[]", "email".to_string()),
            ],
            "course users",
        )
        .await
    }

    /// Lists course groups, optionally with their members.
    pub async fn list_groups(&self, include_users: bool) -> LmsResult<Vec<Group>> {
        let mut query = Vec::new();
        if include_users {
            query.push(("include[]", "users".to_string()));
        }
        self.get_all(&self.course_url("/groups"), &query, "course groups")
            .await
    }

    // ---- assignments, overrides, submissions ----

    /// Fetches one assignment, including its rubric.
    pub async fn get_assignment(&self, assignment_id: i64) -> LmsResult<Assignment> {
        self.get_json(
            &self.course_url(&format!("/assignments/{assignment_id}")),
            &[],
            &format!("assignment {assignment_id}"),
        )
        .await
    }

    /// Lists every assignment in the course.
    pub async fn list_assignments(&self) -> LmsResult<Vec<Assignment>> {
        self.get_all(&self.course_url("/assignments"), &[], "assignments")
            .await
    }

    /// Lists the overrides currently attached to an assignment.
    pub async fn list_overrides(&self, assignment_id: i64) -> LmsResult<Vec<AssignmentOverride>> {
        self.get_all(
            &self.course_url(&format!("/assignments/{assignment_id}/overrides")),
            &[],
            "assignment overrides",
        )
        .await
    }

    /// Deletes one assignment override.
    pub async fn delete_override(&self, assignment_id: i64, override_id: i64) -> LmsResult<()> {
        let url = self.course_url(&format!("/assignments/{assignment_id}/overrides/{override_id}"));
        let resp = self.client.delete(&url).bearer_auth(&self.token).send().await?;
        Self::check(resp, &format!("override {override_id}")).await?;
        Ok(())
    }

    /// Creates an assignment override.
    pub async fn create_override(
        &self,
        assignment_id: i64,
        request: &OverrideRequest,
    ) -> LmsResult<AssignmentOverride> {
        self.send_json(
            reqwest::Method::POST,
            &self.course_url(&format!("/assignments/{assignment_id}/overrides")),
            &serde_json::json!({ "assignment_override": request }),
            "override creation",
        )
        .await
    }

    /// Lists every submission for an assignment, with rubric assessments.
    pub async fn list_submissions(&self, assignment_id: i64) -> LmsResult<Vec<Submission>> {
        self.get_all(
            &self.course_url(&format!("/assignments/{assignment_id}/submissions")),
            &[("include[]", "rubric_assessment".to_string())],
            "submissions",
        )
        .await
    }

    /// Fetches one student's submission with its rubric assessment.
    ///
    /// Returns `LmsError::NotFound` when the grading period or enrollment no
    /// longer exposes the submission; callers decide whether that is fatal.
    pub async fn get_submission(&self, assignment_id: i64, user_id: i64) -> LmsResult<Submission> {
        self.get_json(
            &self.course_url(&format!("/assignments/{assignment_id}/submissions/{user_id}")),
            &[("include[]", "rubric_assessment".to_string())],
            &format!("submission of user {user_id}"),
        )
        .await
    }

    /// Replaces a submission's rubric assessment.
    pub async fn update_rubric_assessment(
        &self,
        assignment_id: i64,
        user_id: i64,
        assessment: &RubricAssessment,
    ) -> LmsResult<()> {
        let url =
            self.course_url(&format!("/assignments/{assignment_id}/submissions/{user_id}"));
        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "rubric_assessment": assessment }))
            .send()
            .await?;
        Self::check(resp, "rubric assessment update").await?;
        Ok(())
    }

    // ---- discussions ----

    /// Lists every discussion topic in the course.
    pub async fn list_discussion_topics(&self) -> LmsResult<Vec<DiscussionTopic>> {
        self.get_all(&self.course_url("/discussion_topics"), &[], "discussion topics")
            .await
    }

    /// Fetches one discussion topic.
    pub async fn get_discussion_topic(&self, topic_id: i64) -> LmsResult<DiscussionTopic> {
        self.get_json(
            &self.course_url(&format!("/discussion_topics/{topic_id}")),
            &[],
            &format!("discussion topic {topic_id}"),
        )
        .await
    }

    /// Lists the top-level entries of a topic, in API order.
    pub async fn list_topic_entries(&self, topic_id: i64) -> LmsResult<Vec<TopicEntry>> {
        self.get_all(
            &self.course_url(&format!("/discussion_topics/{topic_id}/entries")),
            &[],
            "topic entries",
        )
        .await
    }

    /// Lists the replies to one entry, in API order.
    pub async fn list_entry_replies(
        &self,
        topic_id: i64,
        entry_id: i64,
    ) -> LmsResult<Vec<TopicEntry>> {
        self.get_all(
            &self.course_url(&format!("/discussion_topics/{topic_id}/entries/{entry_id}/replies")),
            &[],
            "entry replies",
        )
        .await
    }

    /// Updates an existing discussion topic (or announcement).
    pub async fn update_discussion(
        &self,
        topic_id: i64,
        request: &DiscussionRequest,
    ) -> LmsResult<DiscussionTopic> {
        self.send_json(
            reqwest::Method::PUT,
            &self.course_url(&format!("/discussion_topics/{topic_id}")),
            request,
            "discussion update",
        )
        .await
    }

    /// Creates a discussion topic.
    pub async fn create_discussion(&self, request: &DiscussionRequest) -> LmsResult<DiscussionTopic> {
        self.send_json(
            reqwest::Method::POST,
            &self.course_url("/discussion_topics"),
            request,
            "discussion creation",
        )
        .await
    }

    /// Lists announcements for this course across all time.
    ///
    /// Announcements live under their own top-level endpoint, scoped by
    /// context code rather than by course path.
    pub async fn list_announcements(&self) -> LmsResult<Vec<DiscussionTopic>> {
        let url = format!("{}/api/v1/announcements", self.base_url);
        self.get_all(
            &url,
            &[
                ("context_codes[]", format!("course_{}", self.course_id)),
                ("start_date", "2010-01-01".to_string()),
                ("end_date", "2999-01-01".to_string()),
            ],
            "announcements",
        )
        .await
    }

    // ---- pages and modules ----

    /// Replaces the course front page.
    pub async fn update_front_page(&self, request: &PageRequest) -> LmsResult<Page> {
        self.send_json(
            reqwest::Method::PUT,
            &self.course_url("/front_page"),
            &serde_json::json!({ "wiki_page": request }),
            "front page update",
        )
        .await
    }

    /// Lists every wiki page in the course.
    pub async fn list_pages(&self) -> LmsResult<Vec<Page>> {
        self.get_all(&self.course_url("/pages"), &[], "pages").await
    }

    /// Edits an existing page addressed by its URL slug.
    pub async fn update_page(&self, page_url: &str, request: &PageRequest) -> LmsResult<Page> {
        self.send_json(
            reqwest::Method::PUT,
            &self.course_url(&format!("/pages/{page_url}")),
            &serde_json::json!({ "wiki_page": request }),
            "page update",
        )
        .await
    }

    /// Creates a new page.
    pub async fn create_page(&self, request: &PageRequest) -> LmsResult<Page> {
        self.send_json(
            reqwest::Method::POST,
            &self.course_url("/pages"),
            &serde_json::json!({ "wiki_page": request }),
            "page creation",
        )
        .await
    }

    /// Lists every module in the course.
    pub async fn list_modules(&self) -> LmsResult<Vec<Module>> {
        self.get_all(&self.course_url("/modules"), &[], "modules").await
    }

    /// Edits an existing module.
    pub async fn update_module(&self, module_id: i64, request: &ModuleRequest) -> LmsResult<Module> {
        self.send_json(
            reqwest::Method::PUT,
            &self.course_url(&format!("/modules/{module_id}")),
            &serde_json::json!({ "module": request }),
            "module update",
        )
        .await
    }

    /// Creates a module.
    pub async fn create_module(&self, request: &ModuleRequest) -> LmsResult<Module> {
        self.send_json(
            reqwest::Method::POST,
            &self.course_url("/modules"),
            &serde_json::json!({ "module": request }),
            "module creation",
        )
        .await
    }

    /// Lists the items of a module.
    pub async fn list_module_items(&self, module_id: i64) -> LmsResult<Vec<ModuleItem>> {
        self.get_all(
            &self.course_url(&format!("/modules/{module_id}/items")),
            &[],
            "module items",
        )
        .await
    }

    /// Appends a page item to a module.
    pub async fn create_module_page_item(&self, module_id: i64, page_url: &str) -> LmsResult<()> {
        let url = self.course_url(&format!("/modules/{module_id}/items"));
        let body = serde_json::json!({
            "module_item": { "type": "Page", "page_url": page_url }
        });
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check(resp, "module item creation").await?;
        Ok(())
    }

    // ---- assignment groups, assignments, rubrics ----

    /// Lists every assignment group in the course.
    pub async fn list_assignment_groups(&self) -> LmsResult<Vec<AssignmentGroup>> {
        self.get_all(&self.course_url("/assignment_groups"), &[], "assignment groups")
            .await
    }

    /// Creates an assignment group with the given name.
    pub async fn create_assignment_group(&self, name: &str) -> LmsResult<AssignmentGroup> {
        self.send_json(
            reqwest::Method::POST,
            &self.course_url("/assignment_groups"),
            &serde_json::json!({ "name": name }),
            "assignment group creation",
        )
        .await
    }

    /// Creates an assignment.
    pub async fn create_assignment(&self, request: &AssignmentRequest) -> LmsResult<Assignment> {
        self.send_json(
            reqwest::Method::POST,
            &self.course_url("/assignments"),
            &serde_json::json!({ "assignment": request }),
            "assignment creation",
        )
        .await
    }

    /// Edits an existing assignment.
    pub async fn update_assignment(
        &self,
        assignment_id: i64,
        request: &AssignmentRequest,
    ) -> LmsResult<Assignment> {
        self.send_json(
            reqwest::Method::PUT,
            &self.course_url(&format!("/assignments/{assignment_id}")),
            &serde_json::json!({ "assignment": request }),
            "assignment update",
        )
        .await
    }

    /// Lists every rubric in the course.
    pub async fn list_rubrics(&self) -> LmsResult<Vec<Rubric>> {
        self.get_all(&self.course_url("/rubrics"), &[], "rubrics").await
    }

    /// Deletes one rubric.
    pub async fn delete_rubric(&self, rubric_id: i64) -> LmsResult<()> {
        let url = self.course_url(&format!("/rubrics/{rubric_id}"));
        let resp = self.client.delete(&url).bearer_auth(&self.token).send().await?;
        Self::check(resp, &format!("rubric {rubric_id}")).await?;
        Ok(())
    }

    /// Creates a rubric from a raw payload.
    pub async fn create_rubric(&self, rubric: &serde_json::Value) -> LmsResult<CreatedRubric> {
        self.send_json(
            reqwest::Method::POST,
            &self.course_url("/rubrics"),
            &serde_json::json!({ "rubric": rubric }),
            "rubric creation",
        )
        .await
    }

    /// Associates a rubric with an assignment for grading.
    pub async fn create_rubric_association(
        &self,
        association: &serde_json::Value,
    ) -> LmsResult<()> {
        let url = self.course_url("/rubric_associations");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "rubric_association": association }))
            .send()
            .await?;
        Self::check(resp, "rubric association").await?;
        Ok(())
    }

    // ---- files ----

    /// Uploads a local file into the course, returning its file id.
    ///
    /// The LMS upload protocol is two-step: declare the file against the
    /// course to receive an upload URL plus opaque parameters, then post the
    /// contents there as multipart form data.
    pub async fn upload_file(&self, path: &Path) -> LmsResult<i64> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let bytes = std::fs::read(path)?;

        let target: UploadTarget = self
            .send_json(
                reqwest::Method::POST,
                &self.course_url("/files"),
                &serde_json::json!({ "name": &name, "size": bytes.len() }),
                "file upload declaration",
            )
            .await?;

        let mut form = reqwest::multipart::Form::new();
        for (key, value) in &target.upload_params {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form = form.text(key.clone(), value);
        }
        form = form.part("file", reqwest::multipart::Part::bytes(bytes).file_name(name));

        let resp = self.client.post(&target.upload_url).multipart(form).send().await?;
        let uploaded: UploadedFile = Self::check(resp, "file upload").await?.json().await?;
        Ok(uploaded.id)
    }
}

/// Extracts the `rel="next"` target from a response's `Link` header, if any.
fn next_page_url(resp: &Response) -> Option<String> {
    let link = resp.headers().get(header::LINK)?.to_str().ok()?;
    for part in link.split(',') {
        let mut segments = part.split(';');
        let url = segments.next()?.trim();
        let is_next = segments.any(|s| s.trim() == "rel=\"next\"");
        if is_next {
            return Some(url.trim_start_matches('<').trim_end_matches('>').to_string());
        }
    }
    None
}
