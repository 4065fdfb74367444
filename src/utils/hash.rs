//! Content checksums for deployed config payloads

use serde_json::Value;
use sha2::Digest;

/// SHA-256 of a text, hex encoded.
pub fn sha256_of_text(text: &str) -> String {
    hex::encode(sha2::Sha256::digest(text.as_bytes()))
}

/// SHA-256 of a config document, hex encoded.
///
/// The document is serialized with object keys in sorted order so the
/// checksum is independent of key insertion order.
pub fn sha256_of_config_data(data: &Value) -> String {
    sha256_of_text(&to_canonical_json(data))
}

fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(k).expect("string serializes"),
                        to_canonical_json(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let fields: Vec<String> = items.iter().map(to_canonical_json).collect();
            format!("[{}]", fields.join(","))
        }
        other => serde_json::to_string(other).expect("scalar serializes"),
    }
}
