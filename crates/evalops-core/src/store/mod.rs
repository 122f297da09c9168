//! Append-only record stores backing evalops history.
//!
//! Two instances of the same minimal log-structured design: a trace store
//! for per-invocation records and a memory bank for long-lived facts.
//! Both are line-oriented JSONL files with provenance fields injected at
//! write time.

pub mod jsonl;
pub mod memory;
pub mod trace;

pub use jsonl::{JsonlStore, PARSE_ERROR_VALUE, RAW_LINE_FIELD};
pub use memory::{
    BestPractice, MemoryEntryKind, MemoryFilter, MemoryStore, PromptTweak, MEMORY_FILE,
};
pub use trace::{TraceStore, TRACES_FILE};
