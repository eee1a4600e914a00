use std::time::Duration;

use indexwatch_core::{JobKey, JobStatus, ParentMode, Phase, RuleSummary, SegmentationMode};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;
use watch_logging::{watch_debug, watch_warn};

use crate::bus::{ApiErrorEvent, EventBus};
use crate::client::{ClientError, JobClient};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Console API root, e.g. `https://host/console/api`.
    pub base_url: Url,
    pub api_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// [`JobClient`] speaking to the console REST API.
///
/// Failures are also offered to the event bus as [`ApiErrorEvent`]s. Status
/// and pause/resume failures are published suppressed, since the poller and
/// the control facade report those themselves; rule summary failures are
/// left for the global toast.
#[derive(Debug, Clone)]
pub struct HttpJobClient {
    client: reqwest::Client,
    settings: ClientSettings,
    bus: Option<EventBus>,
}

impl HttpJobClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            settings,
            bus: None,
        })
    }

    pub fn with_error_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::InvalidRequest(format!(
                    "{} cannot be used as an api base",
                    self.settings.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn document_endpoint(&self, job_key: &JobKey, tail: &[&str]) -> Result<Url, ClientError> {
        let mut segments = vec![
            "datasets",
            job_key.dataset_id.as_str(),
            "documents",
            job_key.document_id.as_str(),
        ];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.settings.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        watch_debug!("GET {}", url);
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
    }

    async fn patch_operation(&self, url: Url) -> Result<(), ClientError> {
        watch_debug!("PATCH {}", url);
        let response = self
            .authorize(self.client.patch(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ClientError::Operation(format!("http status {}", status.as_u16())));
        }
        Ok(())
    }

    fn report<T>(&self, result: Result<T, ClientError>, suppress: bool) -> Result<T, ClientError> {
        if let Err(err) = &result {
            watch_warn!("api call failed: {}", err);
            if let Some(bus) = &self.bus {
                bus.publish_api_error(ApiErrorEvent {
                    message: err.to_string(),
                    suppress_global_toast: suppress,
                });
            }
        }
        result
    }

    async fn indexing_status(&self, job_key: &JobKey) -> Result<JobStatus, ClientError> {
        let url = self.document_endpoint(job_key, &["indexing-status"])?;
        let wire: IndexingStatusWire = self.get_json(url).await?;
        wire.into_status()
    }

    async fn processing(&self, job_key: &JobKey, action: &str) -> Result<(), ClientError> {
        let url = self.document_endpoint(job_key, &["processing", action])?;
        self.patch_operation(url).await
    }

    async fn process_rule(&self, document_id: &str) -> Result<RuleSummary, ClientError> {
        let mut url = self.endpoint(&["datasets", "process-rule"])?;
        url.query_pairs_mut().append_pair("document_id", document_id);
        let wire: ProcessRuleWire = self.get_json(url).await?;
        Ok(wire.into_summary())
    }
}

#[async_trait::async_trait]
impl JobClient for HttpJobClient {
    async fn fetch_job_status(&self, job_key: &JobKey) -> Result<JobStatus, ClientError> {
        let result = self.indexing_status(job_key).await;
        self.report(result, true)
    }

    async fn pause_job(&self, job_key: &JobKey) -> Result<(), ClientError> {
        let result = self.processing(job_key, "pause").await;
        self.report(result, true)
    }

    async fn resume_job(&self, job_key: &JobKey) -> Result<(), ClientError> {
        let result = self.processing(job_key, "resume").await;
        self.report(result, true)
    }

    async fn fetch_rule_summary(&self, document_id: &str) -> Result<RuleSummary, ClientError> {
        let result = self.process_rule(document_id).await;
        self.report(result, false)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::Transport(format!("timeout: {err}"));
    }
    ClientError::Transport(err.to_string())
}

#[derive(Debug, Deserialize)]
struct IndexingStatusWire {
    indexing_status: String,
    #[serde(default)]
    completed_segments: Option<u64>,
    #[serde(default)]
    total_segments: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

impl IndexingStatusWire {
    fn into_status(self) -> Result<JobStatus, ClientError> {
        let phase = self
            .indexing_status
            .parse::<Phase>()
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        Ok(JobStatus {
            phase,
            completed_units: self.completed_segments.unwrap_or(0),
            total_units: self.total_segments.unwrap_or(0),
            error: self.error.filter(|text| !text.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProcessRuleWire {
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    rules: Option<RulesWire>,
}

#[derive(Debug, Default, Deserialize)]
struct RulesWire {
    #[serde(default)]
    pre_processing_rules: Vec<PreProcessingRuleWire>,
    #[serde(default)]
    segmentation: Option<SegmentationWire>,
    #[serde(default)]
    parent_mode: Option<String>,
    #[serde(default)]
    subchunk_segmentation: Option<SegmentationWire>,
}

#[derive(Debug, Deserialize)]
struct PreProcessingRuleWire {
    id: String,
    #[serde(default)]
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct SegmentationWire {
    #[serde(default)]
    max_tokens: Option<u32>,
}

impl ProcessRuleWire {
    fn into_summary(self) -> RuleSummary {
        let mode = self.mode.as_deref().and_then(|mode| match mode {
            "custom" | "automatic" | "general" => Some(SegmentationMode::General),
            "hierarchical" => Some(SegmentationMode::Hierarchical),
            _ => None,
        });
        let rules = self.rules.unwrap_or_default();
        RuleSummary {
            mode,
            max_tokens: rules.segmentation.and_then(|s| s.max_tokens),
            child_max_tokens: rules.subchunk_segmentation.and_then(|s| s.max_tokens),
            parent_mode: rules.parent_mode.as_deref().and_then(|mode| match mode {
                "paragraph" => Some(ParentMode::Paragraph),
                "full-doc" => Some(ParentMode::FullDoc),
                _ => None,
            }),
            enabled_rules: rules
                .pre_processing_rules
                .into_iter()
                .filter(|rule| rule.enabled)
                .map(|rule| rule.id)
                .collect(),
        }
    }
}
