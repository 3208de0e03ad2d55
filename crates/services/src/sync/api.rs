use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lesson_core::model::{LessonDraft, LessonId, ProgressPercent};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use url::Url;

use crate::error::SyncError;

/// The four operations the lesson service offers this engine.
#[async_trait]
pub trait LessonApi: Send + Sync {
    /// Fetch the raw lesson payload.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the lesson cannot be fetched.
    async fn fetch_lesson(&self, lesson_id: LessonId) -> Result<LessonDraft, SyncError>;

    /// # Errors
    ///
    /// Returns `SyncError` if the service does not acknowledge the update.
    async fn report_progress(
        &self,
        lesson_id: LessonId,
        percent: ProgressPercent,
    ) -> Result<(), SyncError>;

    /// # Errors
    ///
    /// Returns `SyncError` if the service does not acknowledge the start.
    async fn report_start(&self, lesson_id: LessonId) -> Result<(), SyncError>;

    /// # Errors
    ///
    /// Returns `SyncError` if the service does not acknowledge the completion.
    async fn report_complete(&self, lesson_id: LessonId) -> Result<(), SyncError>;
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct LessonApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl LessonApiConfig {
    /// Build a config, validating the base URL.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidBaseUrl` if `base_url` does not parse.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, SyncError> {
        let trimmed = base_url.trim();
        Url::parse(trimmed).map_err(|_| SyncError::InvalidBaseUrl(trimmed.to_string()))?;
        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Read `LESSON_API_BASE_URL` and `LESSON_API_TOKEN`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("LESSON_API_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        match Self::new(&base_url, env::var("LESSON_API_TOKEN").ok()) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(%err, "ignoring LESSON_API_BASE_URL");
                None
            }
        }
    }

    fn lesson_url(&self, lesson_id: LessonId) -> String {
        format!("{}/lessons/{lesson_id}", self.base_url)
    }
}

/// `LessonApi` over the lesson service's REST endpoints.
#[derive(Clone)]
pub struct HttpLessonApi {
    client: Client,
    config: LessonApiConfig,
}

#[derive(Debug, Serialize)]
struct ProgressRequest {
    progress: u8,
}

impl HttpLessonApi {
    #[must_use]
    pub fn new(config: LessonApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.authorized(self.client.get(url))
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        self.authorized(self.client.post(url))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let response = request.send().await?;
        check_status(response.status())?;
        Ok(response)
    }
}

#[async_trait]
impl LessonApi for HttpLessonApi {
    async fn fetch_lesson(&self, lesson_id: LessonId) -> Result<LessonDraft, SyncError> {
        let request = self.get(self.config.lesson_url(lesson_id));
        let response = match self.send(request).await {
            Err(SyncError::HttpStatus(StatusCode::NOT_FOUND)) => {
                return Err(SyncError::NotFound(lesson_id));
            }
            other => other?,
        };
        Ok(response.json().await?)
    }

    async fn report_progress(
        &self,
        lesson_id: LessonId,
        percent: ProgressPercent,
    ) -> Result<(), SyncError> {
        let url = format!("{}/progress", self.config.lesson_url(lesson_id));
        let body = ProgressRequest {
            progress: percent.value(),
        };
        self.send(self.post(url).json(&body)).await?;
        Ok(())
    }

    async fn report_start(&self, lesson_id: LessonId) -> Result<(), SyncError> {
        let url = format!("{}/start", self.config.lesson_url(lesson_id));
        self.send(self.post(url)).await?;
        Ok(())
    }

    async fn report_complete(&self, lesson_id: LessonId) -> Result<(), SyncError> {
        let url = format!("{}/complete", self.config.lesson_url(lesson_id));
        self.send(self.post(url)).await?;
        Ok(())
    }
}

fn check_status(status: StatusCode) -> Result<(), SyncError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(SyncError::HttpStatus(status))
    }
}

//
// ─── OFFLINE ───────────────────────────────────────────────────────────────────
//

/// Acknowledges every report and serves lessons from memory.
///
/// Lets a host run a session without a lesson service, e.g. from a lesson file.
#[derive(Clone, Default)]
pub struct OfflineLessonApi {
    lessons: Arc<Mutex<HashMap<LessonId, LessonDraft>>>,
}

impl OfflineLessonApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, lesson: LessonDraft) {
        self.lessons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(lesson.id, lesson);
    }
}

#[async_trait]
impl LessonApi for OfflineLessonApi {
    async fn fetch_lesson(&self, lesson_id: LessonId) -> Result<LessonDraft, SyncError> {
        self.lessons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&lesson_id)
            .cloned()
            .ok_or(SyncError::NotFound(lesson_id))
    }

    async fn report_progress(
        &self,
        lesson_id: LessonId,
        percent: ProgressPercent,
    ) -> Result<(), SyncError> {
        tracing::info!(%lesson_id, percent = percent.value(), "offline: progress");
        Ok(())
    }

    async fn report_start(&self, lesson_id: LessonId) -> Result<(), SyncError> {
        tracing::info!(%lesson_id, "offline: start");
        Ok(())
    }

    async fn report_complete(&self, lesson_id: LessonId) -> Result<(), SyncError> {
        tracing::info!(%lesson_id, "offline: complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_normalizes_base_url() {
        let config = LessonApiConfig::new(" https://lessons.example/api/ ", Some(String::new())).unwrap();
        assert_eq!(config.base_url, "https://lessons.example/api");
        assert_eq!(config.token, None);
        assert_eq!(
            config.lesson_url(LessonId::new(9)),
            "https://lessons.example/api/lessons/9"
        );
    }

    #[test]
    fn config_rejects_relative_url() {
        assert!(matches!(
            LessonApiConfig::new("lessons/api", None),
            Err(SyncError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn token_is_sent_on_reads_and_reports() {
        let config = LessonApiConfig::new("https://lessons.example", Some("secret".into())).unwrap();
        let api = HttpLessonApi::new(config.clone());

        let read = api.get(config.lesson_url(LessonId::new(2))).build().unwrap();
        let report = api.post(format!("{}/start", config.lesson_url(LessonId::new(2)))).build().unwrap();

        assert_eq!(read.method(), reqwest::Method::GET);
        assert_eq!(report.method(), reqwest::Method::POST);
        for request in [&read, &report] {
            assert_eq!(
                request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
                "Bearer secret"
            );
        }
    }

    #[test]
    fn no_token_means_no_authorization_header() {
        let config = LessonApiConfig::new("https://lessons.example", None).unwrap();
        let api = HttpLessonApi::new(config.clone());
        let read = api.get(config.lesson_url(LessonId::new(2))).build().unwrap();
        assert!(read.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn non_success_status_is_an_error() {
        assert!(check_status(StatusCode::NO_CONTENT).is_ok());
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND),
            Err(SyncError::HttpStatus(StatusCode::NOT_FOUND))
        ));
    }

    #[tokio::test]
    async fn offline_api_serves_inserted_lessons() {
        let api = OfflineLessonApi::new();
        let draft = LessonDraft {
            id: LessonId::new(4),
            title: "Tone of voice".into(),
            ..LessonDraft::default()
        };
        api.insert(draft.clone());

        assert_eq!(api.fetch_lesson(LessonId::new(4)).await.unwrap(), draft);
        assert!(matches!(
            api.fetch_lesson(LessonId::new(5)).await,
            Err(SyncError::NotFound(_))
        ));
        api.report_complete(LessonId::new(4)).await.unwrap();
    }
}
