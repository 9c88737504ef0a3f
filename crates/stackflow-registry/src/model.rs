//! Service Registry データモデル

use crate::error::{RegistryError, Result};
use crate::resolver::{DependencyResolver, ServiceLookup};
use stackflow_core::ServiceKey;
use std::collections::HashMap;

/// サービス定義（カタログの1エントリ）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDefinition {
    pub display_name: String,
    /// サービスディレクトリからの相対パス（`file.yml` または `file.yml#section`）
    pub template_ref: String,
    pub description: Option<String>,
    pub default_variables: HashMap<String, String>,
    pub required_variables: Vec<String>,
    /// 名前付きボリューム等の共有リソース（重複なし）
    pub provided_resources: Vec<String>,
    /// 依存サービスの名前（カテゴリなし）
    pub depends_on: Vec<String>,
}

impl ServiceDefinition {
    /// `variables` に含まれない必須変数
    pub fn missing_required_variables<'a>(
        &'a self,
        variables: &HashMap<String, String>,
    ) -> Vec<&'a str> {
        self.required_variables
            .iter()
            .filter(|name| !variables.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// カタログエントリ
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub key: ServiceKey,
    pub definition: ServiceDefinition,
}

/// サービスカタログ（1スタック分の検証済みサービス定義）
///
/// 読み込み後は不変です。エントリはレジストリでの宣言順
/// （カテゴリ順 → カテゴリ内のサービス順）に保持されます。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    version: String,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(version: impl Into<String>, entries: Vec<CatalogEntry>) -> Self {
        Self {
            version: version.into(),
            entries,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// カテゴリ名（宣言順、重複なし）
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !categories.contains(&entry.key.category.as_str()) {
                categories.push(&entry.key.category);
            }
        }
        categories
    }

    /// カテゴリ内のサービス（宣言順）
    pub fn services_in(&self, category: &str) -> Vec<(&str, &ServiceDefinition)> {
        self.entries
            .iter()
            .filter(|entry| entry.key.category == category)
            .map(|entry| (entry.key.name.as_str(), &entry.definition))
            .collect()
    }

    /// 全サービスキー（`category.name`、宣言順）
    pub fn service_keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key.to_string()).collect()
    }

    pub fn has_service(&self, category: &str, name: &str) -> bool {
        self.find(category, name).is_some()
    }

    pub fn get_service(&self, category: &str, name: &str) -> Result<&ServiceDefinition> {
        self.find(category, name)
            .ok_or_else(|| RegistryError::ServiceNotFound {
                category: category.to_string(),
                name: name.to_string(),
            })
    }

    /// 依存サービスの名前（カテゴリなし）
    pub fn get_dependencies(&self, category: &str, name: &str) -> Result<&[String]> {
        self.get_service(category, name)
            .map(|definition| definition.depends_on.as_slice())
    }

    /// サービス名からキーを検索
    ///
    /// カテゴリを宣言順に走査し、最初に一致したものを返します。
    pub fn find_service_key(&self, name: &str) -> Option<ServiceKey> {
        self.entries
            .iter()
            .find(|entry| entry.key.name == name)
            .map(|entry| entry.key.clone())
    }

    /// 選択されたサービスに推移的な依存関係を加えてインストール順に並べる
    pub fn resolve_dependencies(&self, selected: &[String]) -> Vec<String> {
        DependencyResolver::resolve(selected, self)
    }

    fn find(&self, category: &str, name: &str) -> Option<&ServiceDefinition> {
        self.entries
            .iter()
            .find(|entry| entry.key.category == category && entry.key.name == name)
            .map(|entry| &entry.definition)
    }
}

impl ServiceLookup for Catalog {
    fn dependencies_of(&self, key: &ServiceKey) -> Option<&[String]> {
        self.find(&key.category, &key.name)
            .map(|definition| definition.depends_on.as_slice())
    }

    fn find_service_key(&self, name: &str) -> Option<ServiceKey> {
        Catalog::find_service_key(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: &str, name: &str, depends_on: &[&str]) -> CatalogEntry {
        CatalogEntry {
            key: ServiceKey::new(category, name),
            definition: ServiceDefinition {
                display_name: name.to_uppercase(),
                template_ref: format!("{category}/{name}.yml"),
                depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog::new(
            "1.0",
            vec![
                entry("cache", "redis", &[]),
                entry("database", "mysql", &[]),
                entry("database", "postgres", &[]),
                entry("workers", "horizon", &["redis"]),
                entry("legacy", "redis", &[]),
            ],
        )
    }

    #[test]
    fn test_queries() {
        let catalog = sample_catalog();

        assert_eq!(catalog.version(), "1.0");
        assert_eq!(catalog.len(), 5);
        assert!(catalog.has_service("cache", "redis"));
        assert!(!catalog.has_service("cache", "memcached"));
        assert_eq!(catalog.get_service("workers", "horizon").unwrap().display_name, "HORIZON");
        assert_eq!(catalog.get_dependencies("workers", "horizon").unwrap(), ["redis"]);
        assert_eq!(
            catalog.categories(),
            vec!["cache", "database", "workers", "legacy"]
        );
        assert_eq!(catalog.services_in("database").len(), 2);
        assert_eq!(catalog.service_keys()[3], "workers.horizon");
    }

    #[test]
    fn test_get_service_not_found() {
        let catalog = sample_catalog();

        assert!(matches!(
            catalog.get_service("cache", "memcached"),
            Err(RegistryError::ServiceNotFound { .. })
        ));
        assert!(catalog.get_dependencies("search", "meilisearch").is_err());
    }

    #[test]
    fn test_find_service_key_first_category_wins() {
        let catalog = sample_catalog();

        assert_eq!(
            catalog.find_service_key("redis"),
            Some(ServiceKey::new("cache", "redis"))
        );
        assert!(catalog.find_service_key("memcached").is_none());
    }

    #[test]
    fn test_missing_required_variables() {
        let definition = ServiceDefinition {
            required_variables: vec!["DB_PASSWORD".to_string(), "DB_NAME".to_string()],
            ..Default::default()
        };
        let mut variables = HashMap::new();
        variables.insert("DB_NAME".to_string(), "app".to_string());

        assert_eq!(definition.missing_required_variables(&variables), vec!["DB_PASSWORD"]);
    }
}
