//! Dot-path deep merge over JSON configs.
//!
//! Patches are applied in list order against a deep copy of the base;
//! later patches can overwrite the effects of earlier ones on overlapping
//! paths. The base value is never mutated.

use serde_json::{Map, Value};

use crate::domain::{EvalOpsError, Result};

use super::{ConfigPatch, SET_OP};

/// Set `root[a][b]...[leaf] = value` for a dot-separated path.
///
/// Intermediate segments are created as objects when absent; a non-object
/// intermediate is replaced by an object. The leaf is set unconditionally,
/// including replacing a subtree with a scalar or vice versa.
pub fn set_by_dot_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => current = map,
            _ => unreachable!("intermediate segment was just made an object"),
        }
    }
    current.insert(segments[segments.len() - 1].to_string(), value);
}

/// Fold `patches` over a deep copy of `base` and return the merged config.
///
/// An unsupported op aborts the whole fold; nothing of the partially
/// merged state escapes. The base must be a JSON object.
pub fn apply_patches(base: &Value, patches: &[ConfigPatch]) -> Result<Value> {
    let mut merged = match base {
        Value::Object(map) => map.clone(),
        _ => {
            return Err(EvalOpsError::Config(
                "base config must be a JSON object".to_string(),
            ))
        }
    };

    for patch in patches {
        if patch.op != SET_OP {
            return Err(EvalOpsError::UnsupportedPatchOp {
                op: patch.op.clone(),
            });
        }
        set_by_dot_path(&mut merged, &patch.path, patch.value.clone());
    }

    Ok(Value::Object(merged))
}
