//! サービスオーバーライド定義

use super::de;
use serde::Deserialize;
use std::collections::HashMap;

/// スタック作者によるサービス単位の上書き設定
///
/// JSON形式（stack.json の `service_overrides` 配下）：
/// ```json
/// "cache.redis": {
///     "variables": { "REDIS_PORT": "6380" },
///     "environments": {
///         "production": {
///             "variables": { "REDIS_MAX_MEMORY": "2gb" },
///             "resources": { "limits": { "memory": "2G" } },
///             "deploy": { "replicas": 2 }
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceOverride {
    #[serde(default, deserialize_with = "de::string_map")]
    pub variables: HashMap<String, String>,
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

/// 環境固有の上書き設定
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EnvironmentOverride {
    #[serde(default, deserialize_with = "de::string_map")]
    pub variables: HashMap<String, String>,
    /// `deploy.resources` にマージされる
    #[serde(default, deserialize_with = "de::mapping")]
    pub resources: serde_yaml::Mapping,
    /// `deploy` にマージされる
    #[serde(default, deserialize_with = "de::mapping")]
    pub deploy: serde_yaml::Mapping,
}

impl ServiceOverride {
    pub fn environment(&self, environment: &str) -> Option<&EnvironmentOverride> {
        self.environments.get(environment)
    }
}

impl EnvironmentOverride {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.resources.is_empty() && self.deploy.is_empty()
    }
}
