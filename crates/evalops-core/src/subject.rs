//! The subject seam: the black-box agent under test.
//!
//! The engine only ever talks to a subject through [`SubjectClient`].
//! Responses are normalized into an explicit struct at the boundary;
//! fields a subject does not report default to empty/neutral values here,
//! not at every call site.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Result;

/// One tool invocation observed during a subject run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Tool name.
    pub name: String,

    /// Arguments the subject passed to the tool.
    #[serde(default)]
    pub input: serde_json::Value,

    /// Tool output, if the subject reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,

    /// Tool error, if the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Normalized response from any subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubjectResponse {
    /// Final answer text.
    #[serde(default)]
    pub answer: String,

    /// Wall-clock latency of the subject call, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,

    /// Tool calls observed during the run.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Opaque session graph, when the subject exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_graph: Option<serde_json::Value>,
}

/// Client contract every subject implementation must satisfy.
///
/// One call per testcase; the engine applies no retry or timeout around
/// it. Implementations needing bounded latency wrap the call themselves.
#[async_trait]
pub trait SubjectClient: Send + Sync {
    /// Stable identifier of the subject this client fronts.
    fn subject_id(&self) -> &str;

    /// Run one request against the subject and normalize the response.
    async fn run_query(
        &self,
        request: &serde_json::Value,
        context: Option<&serde_json::Value>,
    ) -> Result<SubjectResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_response_defaults() {
        let resp = SubjectResponse::default();
        assert!(resp.answer.is_empty());
        assert!(resp.latency_ms.is_none());
        assert!(resp.tool_calls.is_empty());
        assert!(resp.session_graph.is_none());
    }

    #[test]
    fn test_subject_response_deserialize_sparse() {
        // A subject that only reports an answer still normalizes cleanly.
        let resp: SubjectResponse =
            serde_json::from_str(r#"{"answer": "three days in Kyoto"}"#).expect("deserialize");
        assert_eq!(resp.answer, "three days in Kyoto");
        assert!(resp.tool_calls.is_empty());
    }

    #[test]
    fn test_tool_call_roundtrip() {
        let call = ToolCall {
            name: "weather_lookup".to_string(),
            input: serde_json::json!({"city": "Kyoto"}),
            output: Some(serde_json::json!({"forecast": "clear"})),
            error: None,
        };
        let json = serde_json::to_string(&call).expect("serialize");
        let back: ToolCall = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(call, back);
    }
}
