//! Recursive merging of structured component and template data

use serde_json::Value;

/// Merge `overlay` on top of `base` and return the result.
///
/// Objects merge key by key and recursively. Anything else in `overlay`
/// (scalars, arrays, or a value whose kind differs from the one in `base`)
/// replaces the base value wholesale; arrays are never concatenated, so
/// stacking template layers cannot grow them without bound.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay);
    merged
}

/// In-place form of [`deep_merge`]
pub fn merge_into(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let both_objects = value.is_object() && target.get(key).is_some_and(Value::is_object);
                match target.get_mut(key) {
                    Some(existing) if both_objects => merge_into(existing, value),
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}

/// Merge an optional registry default with caller overrides.
///
/// A missing default or a `null` override both fall back to the other side.
pub fn with_defaults(default: Option<&Value>, overrides: &Value) -> Value {
    match (default, overrides) {
        (Some(default), Value::Null) => default.clone(),
        (Some(default), overrides) => deep_merge(default, overrides),
        (None, overrides) => overrides.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_merge() {
        let base = json!({"a": {"x": 1, "y": 2}, "b": true});
        let overlay = json!({"a": {"y": 5}});

        assert_eq!(deep_merge(&base, &overlay), json!({"a": {"x": 1, "y": 5}, "b": true}));
    }

    #[test]
    fn test_arrays_are_replaced() {
        let base = json!({"frames": [1, 2, 3]});
        let overlay = json!({"frames": [9]});

        assert_eq!(deep_merge(&base, &overlay), json!({"frames": [9]}));
    }

    #[test]
    fn test_kind_mismatch_replaces() {
        let base = json!({"speed": {"x": 1}});
        let overlay = json!({"speed": 4});

        assert_eq!(deep_merge(&base, &overlay), json!({"speed": 4}));
    }

    #[test]
    fn test_defaults_with_null_overrides() {
        let default = json!({"visible": true});
        assert_eq!(with_defaults(Some(&default), &Value::Null), default);
        assert_eq!(with_defaults(None, &json!({"a": 1})), json!({"a": 1}));
    }
}
