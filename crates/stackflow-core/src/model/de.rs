//! JSON マニフェスト用のデシリアライズ補助
//!
//! PHP 由来のスタックでは空のマップが `[]` として書き出されることがあるため、
//! `null` と空配列は空マップとして受け付けます。

use serde::de::{Deserializer, Error};
use serde::Deserialize;
use std::collections::HashMap;

/// スカラー値のマップを文字列マップとして読み込む
pub(crate) fn string_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    json_to_string_map(&value).map_err(D::Error::custom)
}

/// 任意構造のマップを YAML マッピングとして読み込む
pub(crate) fn mapping<'de, D>(deserializer: D) -> Result<serde_yaml::Mapping, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(serde_yaml::Mapping::new()),
        serde_json::Value::Array(items) if items.is_empty() => Ok(serde_yaml::Mapping::new()),
        serde_json::Value::Object(_) => serde_yaml::to_value(&value)
            .map_err(D::Error::custom)
            .and_then(|v| match v {
                serde_yaml::Value::Mapping(map) => Ok(map),
                _ => Err(D::Error::custom("object expected")),
            }),
        other => Err(D::Error::custom(format!(
            "object expected, found {}",
            json_type_name(&other)
        ))),
    }
}

/// JSON のスカラー値マップを文字列マップに変換
pub fn json_to_string_map(value: &serde_json::Value) -> Result<HashMap<String, String>, String> {
    match value {
        serde_json::Value::Null => Ok(HashMap::new()),
        serde_json::Value::Array(items) if items.is_empty() => Ok(HashMap::new()),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, v)| {
                scalar_to_string(v)
                    .map(|s| (key.clone(), s))
                    .ok_or_else(|| format!("'{}' must be a scalar, found {}", key, json_type_name(v)))
            })
            .collect(),
        other => Err(format!("object expected, found {}", json_type_name(other))),
    }
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null => Some(String::new()),
        _ => None,
    }
}

/// エラーメッセージ用の JSON 型名
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
