use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::error::CircleError;
use super::types::{Artifact, BuildRecord, Project};

/// Root of the CircleCI v1.1 API.
pub const API_URL: &str = "https://circleci.com/api/v1.1";

/// Query parameter carrying the API token on every request.
pub const TOKEN_PARAM: &str = "circle-token";

/// Source of a branch's recent builds, newest first.
#[allow(async_fn_in_trait)]
pub trait BuildHistory {
    async fn list_builds(
        &self,
        project: &Project,
        branch: &str,
        limit: u32,
    ) -> Result<Vec<BuildRecord>, CircleError>;
}

/// Lists and downloads the artifacts of a build.
#[allow(async_fn_in_trait)]
pub trait ArtifactSource {
    async fn list_artifacts(
        &self,
        project: &Project,
        build_num: u64,
    ) -> Result<Vec<Artifact>, CircleError>;

    /// Streams `artifact` into `sink`, returning the number of bytes written.
    /// `on_progress` receives the running total after each chunk.
    async fn fetch<W: AsyncWrite + Unpin>(
        &self,
        artifact: &Artifact,
        sink: &mut W,
        on_progress: &mut dyn FnMut(u64),
    ) -> Result<u64, CircleError>;
}

/// Renders `url` with the token parameter's value replaced by `REDACTED`.
pub fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == TOKEN_PARAM) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == TOKEN_PARAM {
                "REDACTED".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    let mut shown = url.clone();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

pub struct CircleClient {
    token: String,
    client: Client,
    base_url: Url,
}

impl CircleClient {
    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(token: String, base_url: &str) -> Result<Self, CircleError> {
        // No overall timeout: artifact bodies can be arbitrarily large.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = Url::parse(base_url).map_err(|e| CircleError::Url(e.to_string()))?;
        Ok(Self {
            token,
            client,
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CircleError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CircleError::Url(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair(TOKEN_PARAM, &self.token);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CircleError> {
        let shown = redact(&url);
        debug!(url = %shown, "GET");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CircleError::Status {
                status: status.as_u16(),
                url: shown,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| CircleError::Decode { url: shown, source })
    }
}

impl BuildHistory for CircleClient {
    async fn list_builds(
        &self,
        project: &Project,
        branch: &str,
        limit: u32,
    ) -> Result<Vec<BuildRecord>, CircleError> {
        let mut url = self.endpoint(&[
            "project",
            project.vcs.as_str(),
            &project.owner,
            &project.name,
            "tree",
            branch,
        ])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());

        let mut builds: Vec<BuildRecord> = self.get_json(url).await?;
        builds.truncate(limit as usize);
        Ok(builds)
    }
}

impl ArtifactSource for CircleClient {
    async fn list_artifacts(
        &self,
        project: &Project,
        build_num: u64,
    ) -> Result<Vec<Artifact>, CircleError> {
        let url = self.endpoint(&[
            "project",
            project.vcs.as_str(),
            &project.owner,
            &project.name,
            &build_num.to_string(),
            "artifacts",
        ])?;
        self.get_json(url).await
    }

    async fn fetch<W: AsyncWrite + Unpin>(
        &self,
        artifact: &Artifact,
        sink: &mut W,
        on_progress: &mut dyn FnMut(u64),
    ) -> Result<u64, CircleError> {
        let mut url = Url::parse(&artifact.url).map_err(|e| CircleError::Url(e.to_string()))?;
        url.query_pairs_mut().append_pair(TOKEN_PARAM, &self.token);
        let shown = redact(&url);
        debug!(url = %shown, "downloading artifact");

        let mut response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(CircleError::Status {
                status: response.status().as_u16(),
                url: shown,
            });
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
            on_progress(written);
        }
        sink.flush().await?;
        Ok(written)
    }
}
