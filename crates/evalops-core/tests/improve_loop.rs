//! The full improvement loop: evaluate a version, apply a planner's
//! changeset, re-evaluate the successor, and compare versions from the
//! trace history.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::tempdir;

use evalops_core::changeset::{Changeset, ChangesetEngine, ConfigPatch, NewTestcase, SET_OP};
use evalops_core::domain::{Result, SubjectSpec};
use evalops_core::packs::{AnswerRulePack, JudgeClient, JudgeScorePack, ScoringPack};
use evalops_core::planner::ChangesetPlanner;
use evalops_core::store::{MemoryEntryKind, MemoryFilter, MemoryStore, TraceStore};
use evalops_core::subject::{SubjectClient, SubjectResponse};
use evalops_core::{summarize_traces, EvaluationEngine};

struct EchoSubject;

#[async_trait]
impl SubjectClient for EchoSubject {
    fn subject_id(&self) -> &str {
        "travel_planner"
    }

    async fn run_query(
        &self,
        request: &Value,
        _context: Option<&Value>,
    ) -> Result<SubjectResponse> {
        Ok(SubjectResponse {
            answer: format!("plan for {request}"),
            latency_ms: Some(50.0),
            ..Default::default()
        })
    }
}

/// Judge whose scores depend on the version under test, so the two runs
/// are distinguishable in the trace history.
struct VersionedJudge {
    score: u8,
}

#[async_trait]
impl JudgeClient for VersionedJudge {
    async fn score(&self, _prompt: &str) -> Result<String> {
        Ok(format!(
            r#"{{"score": {}, "rationale": "canned"}}"#,
            self.score
        ))
    }
}

/// Planner that proposes a fixed clarification patch plus one new case.
struct ClarificationPlanner;

#[async_trait]
impl ChangesetPlanner for ClarificationPlanner {
    async fn propose(&self, spec: &SubjectSpec, version_id: &str) -> Result<Changeset> {
        let base = spec
            .runtime_str("config_file")
            .unwrap_or("config_v1.json")
            .to_string();
        let base_path = std::path::PathBuf::from(&base);
        Ok(Changeset {
            new_config_path: ChangesetEngine::derive_new_config_path(&base_path, version_id),
            base_config_path: base_path,
            golden_set_path: spec
                .evaluation
                .golden_path
                .clone()
                .unwrap_or_else(|| "golden.csv".into()),
            config_patches: vec![ConfigPatch {
                path: "planning.clarification.enabled".to_string(),
                op: SET_OP.to_string(),
                value: json!(true),
            }],
            new_testcases: vec![NewTestcase::new(
                "{\"destination\": \"Rome\"}",
                "Does the plan cover Rome?",
                "Mentions Rome landmarks",
            )],
            notes: "enable clarification".to_string(),
        })
    }
}

fn spec_for(dir: &std::path::Path) -> SubjectSpec {
    let mut spec = SubjectSpec::new("travel_planner");
    spec.runtime.config.insert(
        "config_file".to_string(),
        json!(dir.join("config_v1.json")),
    );
    spec.evaluation.golden_path = Some(dir.join("golden.csv"));
    spec
}

fn engine_for(dir: &std::path::Path, spec: &SubjectSpec, judge_score: u8) -> EvaluationEngine {
    let packs: Vec<Arc<dyn ScoringPack>> = vec![
        Arc::new(AnswerRulePack::from_spec(spec)),
        Arc::new(
            JudgeScorePack::from_spec(Arc::new(VersionedJudge { score: judge_score }), spec)
                .with_disabled(false),
        ),
    ];
    EvaluationEngine::new(
        Arc::new(EchoSubject),
        packs,
        spec.clone(),
        TraceStore::in_dir(dir),
        MemoryStore::in_dir(dir),
    )
    .with_base_dir(dir)
}

#[tokio::test]
async fn test_eval_improve_reeval_cycle() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("config_v1.json"),
        serde_json::to_string_pretty(&json!({"planning": {"depth": 2}})).unwrap(),
    )
    .expect("write config");
    std::fs::write(
        dir.path().join("golden.csv"),
        "id,input,judge_question,expected_behavior\n\
         1,\"{\"\"destination\"\": \"\"Kyoto\"\"}\",complete?,covers all days\n\
         2,\"{\"\"destination\"\": \"\"Lima\"\"}\",complete?,covers all days\n",
    )
    .expect("write golden");

    let spec = spec_for(dir.path());

    // Baseline run.
    let baseline = engine_for(dir.path(), &spec, 3)
        .run_full_eval(Some("v1"))
        .await
        .expect("baseline eval");
    assert_eq!(baseline.num_testcases, 2);
    assert_eq!(baseline.metrics.judge_score_avg, Some(3.0));

    // Planner proposes, engine applies.
    let memory = MemoryStore::in_dir(dir.path());
    let changeset = ClarificationPlanner
        .propose(&spec, "v1")
        .await
        .expect("propose");
    let outcome = ChangesetEngine::new()
        .with_memory(memory.clone())
        .apply(&changeset)
        .expect("apply");
    assert_eq!(
        outcome.new_config_path,
        dir.path().join("config_v2.json")
    );

    // Re-run against the grown golden set as v2.
    let improved = engine_for(dir.path(), &spec, 5)
        .run_full_eval(Some("v2"))
        .await
        .expect("improved eval");
    assert_eq!(improved.num_testcases, 3, "new testcase joined the set");
    assert_eq!(improved.metrics.judge_score_avg, Some(5.0));
    assert_ne!(baseline.golden_digest, improved.golden_digest);

    // Trace history now distinguishes the two versions.
    let traces = TraceStore::in_dir(dir.path()).load().expect("load traces");
    let by_version = summarize_traces(&traces);
    assert_eq!(by_version.len(), 2);
    assert_eq!(by_version[0].version_id, "v1");
    assert_eq!(by_version[0].num_traces, 2);
    assert_eq!(by_version[0].avg_judge_score, Some(3.0));
    assert_eq!(by_version[1].version_id, "v2");
    assert_eq!(by_version[1].num_traces, 3);
    assert_eq!(by_version[1].pass_rate, Some(1.0));

    // Memory holds both the eval outcomes and the applied change.
    let changes = memory
        .load(&MemoryFilter::all().with_kind(MemoryEntryKind::ConfigChange))
        .expect("load changes");
    assert_eq!(changes.len(), 1);
    let outcomes = memory
        .load(&MemoryFilter::all().with_kind(MemoryEntryKind::EvalOutcome))
        .expect("load outcomes");
    assert_eq!(outcomes.len(), 5);
}
