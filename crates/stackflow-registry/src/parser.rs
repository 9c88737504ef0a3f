//! registry.json パーサー
//!
//! レジストリを JSON としてパースし、全カテゴリ・全エントリを検証してから
//! [`Catalog`] を構築する。1つでも不正なエントリがあれば読み込み全体が失敗する。

use crate::error::{RegistryError, Result};
use crate::model::{Catalog, CatalogEntry, ServiceDefinition};
use serde_json::{Map, Value};
use stackflow_core::{ServiceKey, StackLayout, json_to_string_map, json_type_name};
use std::path::Path;
use tracing::{debug, info};

/// スタックディレクトリから services/registry.json を読み込む
#[tracing::instrument(skip(stack_path), fields(stack_path = %stack_path.display()))]
pub fn load_catalog(stack_path: &Path) -> Result<Catalog> {
    let path = StackLayout::new(stack_path).registry_path();
    load_catalog_file(&path)
}

/// レジストリファイルを直接指定して読み込む
pub fn load_catalog_file(path: &Path) -> Result<Catalog> {
    if !path.is_file() {
        return Err(RegistryError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|e| RegistryError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let catalog = parse_catalog_value(&value)?;
    info!(
        registry = %path.display(),
        version = %catalog.version(),
        services = catalog.len(),
        "Service registry loaded"
    );

    Ok(catalog)
}

/// JSON 文字列をカタログとしてパース
pub fn parse_catalog(content: &str) -> Result<Catalog> {
    let value: Value = serde_json::from_str(content).map_err(|e| RegistryError::Parse {
        path: Default::default(),
        message: e.to_string(),
    })?;
    parse_catalog_value(&value)
}

/// 検証してからカタログを構築
pub fn parse_catalog_value(value: &Value) -> Result<Catalog> {
    let root = value.as_object().ok_or_else(|| {
        invalid(format!(
            "ルートはオブジェクトである必要があります（{}）",
            json_type_name(value)
        ))
    })?;

    let version = match root.get("version") {
        Some(Value::String(v)) if !v.trim().is_empty() => v.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(invalid(format!(
                "'version' は文字列である必要があります（{}）",
                json_type_name(other)
            )));
        }
        None => return Err(invalid("'version' がありません".to_string())),
    };

    let empty = Map::new();
    let categories = match root.get("services") {
        Some(Value::Object(categories)) => categories,
        Some(Value::Array(items)) if items.is_empty() => &empty,
        Some(other) => {
            return Err(invalid(format!(
                "'services' はオブジェクトである必要があります（{}）",
                json_type_name(other)
            )));
        }
        None => return Err(invalid("'services' がありません".to_string())),
    };

    let mut entries = Vec::new();
    for (category, services) in categories {
        let services = services.as_object().ok_or_else(|| {
            invalid(format!(
                "カテゴリ '{}' はオブジェクトである必要があります",
                category
            ))
        })?;

        for (name, definition) in services {
            let key = ServiceKey::new(category, name);
            let definition = parse_definition(&key, definition)?;
            debug!(service = %key, "Registered service");
            entries.push(CatalogEntry { key, definition });
        }
    }

    Ok(Catalog::new(version, entries))
}

/// サービス定義を検証して構築
fn parse_definition(key: &ServiceKey, value: &Value) -> Result<ServiceDefinition> {
    let entry = value
        .as_object()
        .ok_or_else(|| invalid(format!("サービス '{}' はオブジェクトである必要があります", key)))?;

    let display_name = required_text(key, entry, "displayName")?;
    let template_ref = required_text(key, entry, "templateRef")?;

    let description = match entry.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            return Err(invalid(format!(
                "サービス '{}' の description は文字列である必要があります（{}）",
                key,
                json_type_name(other)
            )));
        }
    };

    let default_variables = match entry.get("defaultVariables") {
        Some(value) => json_to_string_map(value)
            .map_err(|e| invalid(format!("サービス '{}' の defaultVariables: {}", key, e)))?,
        None => Default::default(),
    };

    let mut provided_resources = string_list(key, entry, "providedResources")?;
    dedup_in_order(&mut provided_resources);

    Ok(ServiceDefinition {
        display_name,
        template_ref,
        description,
        default_variables,
        required_variables: string_list(key, entry, "requiredVariables")?,
        provided_resources,
        depends_on: string_list(key, entry, "dependsOn")?,
    })
}

fn required_text(key: &ServiceKey, entry: &Map<String, Value>, field: &str) -> Result<String> {
    match entry.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(invalid(format!(
            "サービス '{}' には空でない '{}' が必要です",
            key, field
        ))),
    }
}

fn string_list(key: &ServiceKey, entry: &Map<String, Value>, field: &str) -> Result<Vec<String>> {
    match entry.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(String::from).ok_or_else(|| {
                    invalid(format!(
                        "サービス '{}' の {} は文字列の配列である必要があります",
                        key, field
                    ))
                })
            })
            .collect(),
        Some(other) => Err(invalid(format!(
            "サービス '{}' の {} は配列である必要があります（{}）",
            key,
            field,
            json_type_name(other)
        ))),
    }
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

fn invalid(message: String) -> RegistryError {
    RegistryError::InvalidRegistry(message)
}
