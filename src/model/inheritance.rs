//! Shared-value inheritance and document merging
//!
//! A config document maps env names to JSON objects, plus a shared section
//! under [`SHARED`]. Shared keys are `<selector>.<path>` where the selector
//! is `*` (every env) or one env name, and the path is a dotted path into
//! the env object. Precedence, strongest first: explicit env value,
//! env-scoped shared value, `*`-scoped shared value.

use crate::constants::SHARED;
use serde_json::{Map, Value};

/// Apply the shared section of `doc` onto its env sections, in place.
///
/// Values are only filled in where the target path is absent; intermediate
/// objects are created as needed. The shared section itself is left
/// untouched.
pub fn apply_shared_values(doc: &mut Map<String, Value>) {
    let shared = match doc.get(SHARED) {
        Some(Value::Object(map)) => map.clone(),
        _ => return,
    };
    let env_names: Vec<String> = doc.keys().filter(|k| *k != SHARED).cloned().collect();

    // env-scoped selectors go first so they win over "*" for the same path
    let mut entries: Vec<(&String, &Value)> = shared.iter().collect();
    entries.sort_by_key(|(key, _)| key.starts_with("*."));

    for (selector_key, value) in entries {
        let Some((selector, path)) = selector_key.split_once('.') else {
            continue;
        };
        if selector == "*" {
            for env_name in &env_names {
                if let Some(Value::Object(section)) = doc.get_mut(env_name) {
                    set_if_absent(section, path, value);
                }
            }
        } else if let Some(Value::Object(section)) = doc.get_mut(selector) {
            set_if_absent(section, path, value);
        }
    }
}

fn set_if_absent(obj: &mut Map<String, Value>, path: &str, value: &Value) {
    match path.split_once('.') {
        None => {
            obj.entry(path.to_string()).or_insert_with(|| value.clone());
        }
        Some((head, rest)) => {
            let child = obj
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = child {
                set_if_absent(map, rest, value);
            }
            // an existing non-object leaf is an explicit value and wins
        }
    }
}

/// Recursively merge `overlay` onto `base`. Objects merge key-wise;
/// anything else is replaced by the overlay.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(a), Value::Object(b)) => {
            let mut out = a.clone();
            for (key, value) in b {
                let merged = match out.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        _ => overlay.clone(),
    }
}

/// [`deep_merge`] for top-level documents.
pub fn deep_merge_maps(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    match deep_merge(&Value::Object(base.clone()), &Value::Object(overlay.clone())) {
        Value::Object(map) => map,
        _ => unreachable!("merging two objects yields an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_star_selector_applies_to_all_envs() {
        let mut data = doc(json!({
            SHARED: {"*.project_name": "my_app", "*.aws_region": "us-east-1"},
            "dev": {"username": "alice"},
            "prod": {"username": "bob"},
        }));
        apply_shared_values(&mut data);
        assert_eq!(data["dev"]["project_name"], "my_app");
        assert_eq!(data["prod"]["project_name"], "my_app");
        assert_eq!(data["dev"]["aws_region"], "us-east-1");
    }

    #[test]
    fn test_env_selector_beats_star() {
        let mut data = doc(json!({
            SHARED: {"*.instance_type": "t3.micro", "prod.instance_type": "m5.large"},
            "dev": {},
            "prod": {},
        }));
        apply_shared_values(&mut data);
        assert_eq!(data["dev"]["instance_type"], "t3.micro");
        assert_eq!(data["prod"]["instance_type"], "m5.large");
    }

    #[test]
    fn test_explicit_value_beats_shared() {
        let mut data = doc(json!({
            SHARED: {"*.aws_region": "us-east-1"},
            "dev": {"aws_region": "eu-west-1"},
        }));
        apply_shared_values(&mut data);
        assert_eq!(data["dev"]["aws_region"], "eu-west-1");
    }

    #[test]
    fn test_dotted_path_creates_nested_objects() {
        let mut data = doc(json!({
            SHARED: {"*.server.cpu": 4},
            "dev": {},
            "prod": {"server": {"cpu": 8}},
        }));
        apply_shared_values(&mut data);
        assert_eq!(data["dev"]["server"]["cpu"], 4);
        assert_eq!(data["prod"]["server"]["cpu"], 8);
    }

    #[test]
    fn test_env_selector_without_section_is_ignored() {
        let mut data = doc(json!({
            SHARED: {"qa.username": "carol"},
            "dev": {},
        }));
        apply_shared_values(&mut data);
        assert!(data.get("qa").is_none());
    }

    #[test]
    fn test_deep_merge() {
        let base = json!({"a": 1, "b": {"x": 1, "y": 2}, "c": [1, 2]});
        let overlay = json!({"b": {"y": 3, "z": 4}, "c": [9], "d": true});
        let merged = deep_merge(&base, &overlay);
        assert_eq!(
            merged,
            json!({"a": 1, "b": {"x": 1, "y": 3, "z": 4}, "c": [9], "d": true})
        );
    }

    #[test]
    fn test_deep_merge_maps_unions_envs() {
        let data = doc(json!({"dev": {"username": "alice"}}));
        let secret = doc(json!({"dev": {"password": "pw"}, "prod": {"password": "pw2"}}));
        let merged = deep_merge_maps(&data, &secret);
        assert_eq!(merged["dev"], json!({"username": "alice", "password": "pw"}));
        assert_eq!(merged["prod"], json!({"password": "pw2"}));
    }
}
