//! HTTP bridges to the two external collaborators.
//!
//! Both clients are constructed explicitly and passed into the engine;
//! missing credentials fail at construction, never mid-run.

use std::time::Instant;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use evalops_core::domain::{EvalOpsError, Result, SubjectSpec};
use evalops_core::packs::JudgeClient;
use evalops_core::subject::{SubjectClient, SubjectResponse};

/// Environment variable holding the judge API key.
pub const JUDGE_API_KEY_ENV: &str = "EVALOPS_JUDGE_API_KEY";

/// Environment variable holding the judge endpoint URL.
pub const JUDGE_ENDPOINT_ENV: &str = "EVALOPS_JUDGE_ENDPOINT";

/// Subject client speaking a minimal HTTP contract: POST the request
/// payload, receive the normalized response shape back.
pub struct HttpSubjectClient {
    subject_id: String,
    endpoint: String,
    http: reqwest::Client,
}

impl HttpSubjectClient {
    pub fn new(subject_id: String, endpoint: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("build subject http client")?;
        Ok(Self {
            subject_id,
            endpoint,
            http,
        })
    }
}

#[async_trait]
impl SubjectClient for HttpSubjectClient {
    fn subject_id(&self) -> &str {
        &self.subject_id
    }

    async fn run_query(
        &self,
        request: &Value,
        context: Option<&Value>,
    ) -> Result<SubjectResponse> {
        let started = Instant::now();

        let body = json!({
            "request": request,
            "context": context,
        });
        let http_response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| EvalOpsError::Subject(format!("send to {}: {e}", self.endpoint)))?
            .error_for_status()
            .map_err(|e| EvalOpsError::Subject(e.to_string()))?;

        let mut response: SubjectResponse = http_response
            .json()
            .await
            .map_err(|e| EvalOpsError::Subject(format!("decode subject response: {e}")))?;

        // Subjects that do not report latency get the measured wall clock.
        if response.latency_ms.is_none() {
            response.latency_ms = Some(started.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(response)
    }
}

#[derive(Debug, Deserialize)]
struct JudgeReply {
    text: String,
}

/// Judge client posting scoring prompts to a completion-style endpoint.
pub struct HttpJudgeClient {
    endpoint: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl HttpJudgeClient {
    /// Build from the environment plus the spec's judge config.
    ///
    /// Fails when the endpoint or API key is absent.
    pub fn from_env(spec: &SubjectSpec) -> anyhow::Result<Self> {
        let endpoint = match std::env::var(JUDGE_ENDPOINT_ENV) {
            Ok(v) if !v.trim().is_empty() => v,
            _ => bail!("{JUDGE_ENDPOINT_ENV} is not set; set it or disable judge metrics"),
        };
        let api_key = match std::env::var(JUDGE_API_KEY_ENV) {
            Ok(v) if !v.trim().is_empty() => v,
            _ => bail!("{JUDGE_API_KEY_ENV} is not set; set it or disable judge metrics"),
        };
        let model = spec
            .evaluation
            .judge
            .model
            .clone()
            .unwrap_or_else(|| "default".to_string());
        let http = reqwest::Client::builder()
            .build()
            .context("build judge http client")?;
        Ok(Self {
            endpoint,
            api_key,
            model,
            http,
        })
    }
}

#[async_trait]
impl JudgeClient for HttpJudgeClient {
    async fn score(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
        });
        let reply: JudgeReply = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EvalOpsError::Judge(format!("send to {}: {e}", self.endpoint)))?
            .error_for_status()
            .map_err(|e| EvalOpsError::Judge(e.to_string()))?
            .json()
            .await
            .map_err(|e| EvalOpsError::Judge(format!("decode judge reply: {e}")))?;
        Ok(reply.text)
    }
}
