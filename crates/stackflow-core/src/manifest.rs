//! スタックマニフェストの読み込みと検証
//!
//! stack.json を JSON として読み込み、構造を検証してから
//! 型付きの [`StackManifest`] を構築します。検証に失敗した場合は
//! 部分的な値を返さずにエラーとします。

use crate::error::{CoreError, Result};
use crate::layout::StackLayout;
use crate::model::{
    GeneratedVariable, GeneratorKind, ServiceOverride, ServiceSlot, StackManifest, json_type_name,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// 必須のトップレベルフィールド
const REQUIRED_FIELDS: [&str; 4] = ["name", "version", "type", "framework"];

/// スタックディレクトリから stack.json を読み込む
#[tracing::instrument(skip(stack_path), fields(stack_path = %stack_path.display()))]
pub fn load_manifest(stack_path: &Path) -> Result<StackManifest> {
    let path = StackLayout::new(stack_path).manifest_path();
    load_manifest_file(&path)
}

/// マニフェストファイルを直接指定して読み込む
pub fn load_manifest_file(path: &Path) -> Result<StackManifest> {
    if !path.is_file() {
        return Err(CoreError::ManifestNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let manifest = parse_manifest(&content).map_err(|e| match e {
        CoreError::ManifestParse { message, .. } => CoreError::ManifestParse {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })?;

    info!(
        stack = %manifest.name,
        version = %manifest.version,
        required = manifest.required_services.len(),
        optional = manifest.optional_services.len(),
        "Stack manifest loaded"
    );

    Ok(manifest)
}

/// JSON 文字列をマニフェストとしてパース・検証
pub fn parse_manifest(content: &str) -> Result<StackManifest> {
    let value: Value = serde_json::from_str(content).map_err(|e| CoreError::ManifestParse {
        path: Default::default(),
        message: e.to_string(),
    })?;

    validate_manifest(&value)?;
    build_manifest(&value)
}

/// マニフェストの構造を検証
///
/// - `name` / `version` / `type` / `framework` は必須（空でない文字列）
/// - `required_services` / `optional_services` の各エントリは
///   文字列の `category` と配列の `options` を持つマップ
/// - `generated_variables` の各エントリの `generator` は許可された種類のみ
pub fn validate_manifest(value: &Value) -> Result<()> {
    let root = value.as_object().ok_or_else(|| {
        invalid(format!(
            "ルートはオブジェクトである必要があります（{}）",
            json_type_name(value)
        ))
    })?;

    for field in REQUIRED_FIELDS {
        match root.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(other) => {
                return Err(invalid(format!(
                    "'{}' は空でない文字列である必要があります（{}）",
                    field,
                    json_type_name(other)
                )));
            }
            None => return Err(invalid(format!("必須フィールド '{}' がありません", field))),
        }
    }

    if let Some(description) = root.get("description")
        && !description.is_string()
        && !description.is_null()
    {
        return Err(invalid("'description' は文字列である必要があります".to_string()));
    }

    for (section, default_required) in [("required_services", true), ("optional_services", false)] {
        if let Some(slots) = root.get(section) {
            validate_slots(section, slots, default_required)?;
        }
    }

    if let Some(overrides) = root.get("service_overrides") {
        validate_service_overrides(overrides)?;
    }

    if let Some(generated) = root.get("generated_variables") {
        validate_generated_variables(generated)?;
    }

    debug!("Manifest structure is valid");
    Ok(())
}

fn validate_slots(section: &str, slots: &Value, default_required: bool) -> Result<()> {
    let Some(slots) = as_object_or_empty(slots) else {
        return Err(invalid(format!("'{}' はオブジェクトである必要があります", section)));
    };

    for (slot_name, slot) in slots {
        let slot = slot.as_object().ok_or_else(|| {
            invalid(format!("{}.{} はオブジェクトである必要があります", section, slot_name))
        })?;

        if !slot.get("category").is_some_and(Value::is_string) {
            return Err(invalid(format!(
                "{}.{} には文字列の 'category' が必要です",
                section, slot_name
            )));
        }

        let options = slot.get("options").and_then(Value::as_array).ok_or_else(|| {
            invalid(format!("{}.{} には配列の 'options' が必要です", section, slot_name))
        })?;
        if options.iter().any(|o| !o.is_string()) {
            return Err(invalid(format!(
                "{}.{}.options は文字列の配列である必要があります",
                section, slot_name
            )));
        }

        match slot.get("default") {
            None | Some(Value::Null) if default_required => {
                return Err(invalid(format!(
                    "{}.{} には 'default' が必要です",
                    section, slot_name
                )));
            }
            None | Some(Value::Null) => {}
            Some(Value::String(default)) => {
                let listed = options.iter().any(|o| o.as_str() == Some(default.as_str()));
                if !options.is_empty() && !listed {
                    return Err(invalid(format!(
                        "{}.{} の default '{}' が options に含まれていません",
                        section, slot_name, default
                    )));
                }
            }
            Some(other) => {
                return Err(invalid(format!(
                    "{}.{}.default は文字列または null である必要があります（{}）",
                    section,
                    slot_name,
                    json_type_name(other)
                )));
            }
        }
    }

    Ok(())
}

fn validate_service_overrides(overrides: &Value) -> Result<()> {
    let Some(overrides) = as_object_or_empty(overrides) else {
        return Err(invalid("'service_overrides' はオブジェクトである必要があります".to_string()));
    };

    for (service_key, service_override) in overrides {
        serde_json::from_value::<ServiceOverride>(service_override.clone()).map_err(|e| {
            invalid(format!("service_overrides.{}: {}", service_key, e))
        })?;
    }

    Ok(())
}

fn validate_generated_variables(generated: &Value) -> Result<()> {
    let Some(generated) = as_object_or_empty(generated) else {
        return Err(invalid("'generated_variables' はオブジェクトである必要があります".to_string()));
    };

    for (var_name, declaration) in generated {
        let generator = declaration
            .as_object()
            .and_then(|declaration| declaration.get("generator"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                invalid(format!(
                    "generated_variables.{} には文字列の 'generator' が必要です",
                    var_name
                ))
            })?;

        if GeneratorKind::parse(generator).is_none() {
            return Err(invalid(format!(
                "generated_variables.{} の generator '{}' は不正です（許可: {}）",
                var_name,
                generator,
                GeneratorKind::ALLOWED.join(", ")
            )));
        }
    }

    Ok(())
}

/// 検証済みの JSON から型付きマニフェストを構築
fn build_manifest(value: &Value) -> Result<StackManifest> {
    let empty = Map::new();
    let root = value.as_object().unwrap_or(&empty);
    let text = |field: &str| {
        root.get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let mut service_overrides = HashMap::new();
    for (service_key, service_override) in entries(root.get("service_overrides")) {
        let parsed = serde_json::from_value::<ServiceOverride>(service_override.clone())
            .map_err(|e| invalid(format!("service_overrides.{}: {}", service_key, e)))?;
        service_overrides.insert(service_key.clone(), parsed);
    }

    let generated_variables = entries(root.get("generated_variables"))
        .filter_map(|(name, declaration)| {
            let declaration = declaration.as_object()?;
            let generator = GeneratorKind::parse(declaration.get("generator")?.as_str()?)?;
            let options = declaration
                .iter()
                .filter(|(key, _)| key.as_str() != "generator")
                .map(|(key, v)| (key.clone(), v.clone()))
                .collect();
            Some(GeneratedVariable {
                name: name.clone(),
                generator,
                options,
            })
        })
        .collect();

    Ok(StackManifest {
        name: text("name"),
        version: text("version"),
        stack_type: text("type"),
        framework: text("framework"),
        description: root
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
        required_services: build_slots(root.get("required_services")),
        optional_services: build_slots(root.get("optional_services")),
        service_overrides,
        generated_variables,
    })
}

fn build_slots(slots: Option<&Value>) -> Vec<ServiceSlot> {
    entries(slots)
        .map(|(name, slot)| ServiceSlot {
            name: name.clone(),
            category: slot
                .get("category")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            options: slot
                .get("options")
                .and_then(Value::as_array)
                .map(|options| {
                    options
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            default: slot.get("default").and_then(Value::as_str).map(String::from),
        })
        .collect()
}

/// オブジェクトのエントリを宣言順に列挙（空配列・null は空）
fn entries(value: Option<&Value>) -> impl Iterator<Item = (&String, &Value)> {
    value.and_then(Value::as_object).into_iter().flatten()
}

/// オブジェクト、または PHP 由来の空配列 / null を空として扱う
fn as_object_or_empty(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::Null => Some(Map::new()),
        Value::Array(items) if items.is_empty() => Some(Map::new()),
        _ => None,
    }
}

fn invalid(message: String) -> CoreError {
    CoreError::InvalidManifest(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn laravel_manifest() -> Value {
        json!({
            "name": "laravel",
            "version": "1.2.0",
            "type": "php",
            "framework": "laravel",
            "description": "Laravel application stack",
            "required_services": {
                "database": {"category": "database", "options": ["mysql", "postgres"], "default": "mysql"},
                "webserver": {"category": "webserver", "options": ["nginx"], "default": "nginx"}
            },
            "optional_services": {
                "cache": {"category": "cache", "options": ["redis"], "default": "redis"},
                "search": {"category": "search", "options": ["meilisearch"], "default": null}
            },
            "service_overrides": {
                "cache.redis": {
                    "variables": {"REDIS_PORT": "6380"},
                    "environments": {
                        "production": {
                            "variables": {"REDIS_MAX_MEMORY": "2gb"},
                            "resources": {"limits": {"memory": "2G"}}
                        }
                    }
                }
            },
            "generated_variables": {
                "APP_KEY": {"generator": "stack_specific_key"},
                "DB_PASSWORD": {"generator": "secure_random", "length": 32}
            }
        })
    }

    #[test]
    fn test_parse_manifest() -> Result<()> {
        let manifest = parse_manifest(&laravel_manifest().to_string())?;

        assert_eq!(manifest.name, "laravel");
        assert_eq!(manifest.stack_type, "php");
        assert_eq!(manifest.framework, "laravel");
        assert_eq!(manifest.description.as_deref(), Some("Laravel application stack"));
        assert_eq!(manifest.required_services.len(), 2);
        assert_eq!(manifest.required_services[0].name, "database");
        assert_eq!(manifest.optional_services[1].default, None);

        assert_eq!(
            manifest.default_services(),
            vec!["database.mysql", "webserver.nginx", "cache.redis"]
        );

        let production = manifest
            .environment_overrides("cache.redis", "production")
            .unwrap();
        assert_eq!(production.variables["REDIS_MAX_MEMORY"], "2gb");

        let generated = manifest.generated_variables();
        assert_eq!(generated.len(), 2);
        assert_eq!(generated[0].name, "APP_KEY");
        assert_eq!(generated[0].generator, GeneratorKind::StackSpecificKey);
        assert_eq!(generated[1].options["length"], json!(32));

        Ok(())
    }

    #[test]
    fn test_missing_required_fields() {
        for field in REQUIRED_FIELDS {
            let mut value = laravel_manifest();
            value.as_object_mut().unwrap().remove(field);

            let err = validate_manifest(&value).unwrap_err();
            assert!(
                matches!(&err, CoreError::InvalidManifest(msg) if msg.contains(field)),
                "{field} の欠落が検出されていません: {err}"
            );
        }
    }

    #[test]
    fn test_non_string_required_field() {
        let mut value = laravel_manifest();
        value["version"] = json!(2);

        assert!(matches!(
            validate_manifest(&value),
            Err(CoreError::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_slot_requires_category_and_options() {
        let mut value = laravel_manifest();
        value["required_services"]["database"] = json!({"options": ["mysql"]});
        assert!(validate_manifest(&value).is_err());

        let mut value = laravel_manifest();
        value["optional_services"]["cache"] = json!({"category": "cache", "options": "redis"});
        assert!(validate_manifest(&value).is_err());

        let mut value = laravel_manifest();
        value["optional_services"]["cache"] = json!("cache.redis");
        assert!(validate_manifest(&value).is_err());
    }

    #[test]
    fn test_slot_default_must_be_an_option() {
        let mut value = laravel_manifest();
        value["required_services"]["database"]["default"] = json!("sqlite");

        let err = validate_manifest(&value).unwrap_err();
        assert!(err.to_string().contains("sqlite"));
    }

    #[test]
    fn test_required_slot_needs_default() {
        let mut value = laravel_manifest();
        value["required_services"]["database"]["default"] = json!(null);
        assert!(validate_manifest(&value).is_err());

        let mut value = laravel_manifest();
        value["optional_services"]["cache"]["default"] = json!(null);
        assert!(validate_manifest(&value).is_ok());
    }

    #[test]
    fn test_unknown_generator_is_rejected() {
        let mut value = laravel_manifest();
        value["generated_variables"]["APP_KEY"] = json!({"generator": "uuid"});

        let err = validate_manifest(&value).unwrap_err();
        assert!(err.to_string().contains("uuid"));

        let mut value = laravel_manifest();
        value["generated_variables"]["APP_KEY"] = json!({"length": 32});
        assert!(validate_manifest(&value).is_err());
    }

    #[test]
    fn test_empty_array_sections_are_accepted() {
        let value = json!({
            "name": "static",
            "version": "1.0.0",
            "type": "node",
            "framework": "vite",
            "optional_services": [],
            "service_overrides": [],
            "generated_variables": []
        });

        let manifest = parse_manifest(&value.to_string()).unwrap();
        assert!(manifest.default_services().is_empty());
        assert!(manifest.service_overrides.is_empty());
    }

    #[test]
    fn test_load_manifest_from_stack_dir() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join("stack.json"),
            laravel_manifest().to_string(),
        )
        .unwrap();

        let manifest = load_manifest(temp_dir.path())?;
        assert_eq!(manifest.name, "laravel");

        Ok(())
    }

    #[test]
    fn test_load_manifest_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            load_manifest(temp_dir.path()),
            Err(CoreError::ManifestNotFound(_))
        ));
    }

    #[test]
    fn test_load_manifest_unparsable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stack.json");
        fs::write(&path, "{ name: laravel").unwrap();

        match load_manifest(temp_dir.path()) {
            Err(CoreError::ManifestParse { path: err_path, .. }) => assert_eq!(err_path, path),
            other => panic!("ManifestParse を期待: {other:?}"),
        }
    }
}
