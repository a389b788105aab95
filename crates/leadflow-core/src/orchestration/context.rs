//! Run context: the shared key/value map accumulating step outputs.
//!
//! The engine owns one `RunContext` per run and is its only writer; steps
//! receive it by reference (or as a copy inside FOR_EACH iterations). Output
//! merging is an explicit fold performed by the engine after each step
//! completes, so there is never a partially written snapshot.

use serde_json::{Map, Value};

/// Mutable key/value state threaded through an orchestration run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    values: Map<String, Value>,
}

impl RunContext {
    /// Create a context seeded with the request's initial values.
    pub fn new(seed: Map<String, Value>) -> Self {
        Self { values: seed }
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Resolve a dotted path (e.g. `lead.contact.email`).
    ///
    /// Path segments traverse objects by key and arrays by numeric index.
    /// Returns `None` as soon as any segment is missing.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Bind a top-level key, replacing any existing value.
    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    /// Fold a completed step's output into the context.
    ///
    /// Object outputs merge key-by-key (last write wins); anything else is
    /// stored under the step's ID.
    pub fn merge_step_output(&mut self, step_id: &str, output: &Value) {
        match output {
            Value::Object(map) => {
                for (key, value) in map {
                    self.values.insert(key.clone(), value.clone());
                }
            }
            other => {
                self.values.insert(step_id.to_string(), other.clone());
            }
        }
    }

    /// The backing map, e.g. for snapshotting into a run result.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// Render a JSON value for template interpolation.
///
/// Strings are inserted bare; scalars via their display form; arrays and
/// objects as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> RunContext {
        let mut ctx = RunContext::default();
        ctx.set("lead", json!({"email": "a@b.co", "scores": [10, 20]}));
        ctx.set("count", json!(3));
        ctx
    }

    // -----------------------------------------------------------------------
    // Path lookup
    // -----------------------------------------------------------------------

    #[test]
    fn test_get_path_walks_objects_and_arrays() {
        let ctx = seeded();
        assert_eq!(ctx.get_path("lead.email"), Some(&json!("a@b.co")));
        assert_eq!(ctx.get_path("lead.scores.1"), Some(&json!(20)));
        assert_eq!(ctx.get_path("count"), Some(&json!(3)));
    }

    #[test]
    fn test_get_path_missing_segment_is_none() {
        let ctx = seeded();
        assert_eq!(ctx.get_path("lead.phone"), None);
        assert_eq!(ctx.get_path("lead.scores.9"), None);
        assert_eq!(ctx.get_path("nothing.at.all"), None);
        // Scalars have no children.
        assert_eq!(ctx.get_path("count.inner"), None);
    }

    // -----------------------------------------------------------------------
    // Output merging
    // -----------------------------------------------------------------------

    #[test]
    fn test_merge_object_output_spreads_keys() {
        let mut ctx = seeded();
        ctx.merge_step_output("score-step", &json!({"score": 75, "tier": "vip"}));
        assert_eq!(ctx.get("score"), Some(&json!(75)));
        assert_eq!(ctx.get("tier"), Some(&json!("vip")));
        assert_eq!(ctx.get("score-step"), None);
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut ctx = seeded();
        ctx.merge_step_output("a", &json!({"score": 10}));
        ctx.merge_step_output("b", &json!({"score": 99}));
        assert_eq!(ctx.get("score"), Some(&json!(99)));
    }

    #[test]
    fn test_merge_scalar_output_keyed_by_step_id() {
        let mut ctx = seeded();
        ctx.merge_step_output("fetch", &json!("raw body"));
        assert_eq!(ctx.get("fetch"), Some(&json!("raw body")));
    }

    // -----------------------------------------------------------------------
    // Display rendering
    // -----------------------------------------------------------------------

    #[test]
    fn test_display_value_forms() {
        assert_eq!(display_value(&json!("plain")), "plain");
        assert_eq!(display_value(&json!(42)), "42");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&Value::Null), "null");
        assert_eq!(display_value(&json!([1, 2])), "[1,2]");
    }
}
