//! サービスごとの置換変数の組み立て
//!
//! 優先順位（後のものが同じキーを上書き）:
//! 1. 固定キー（`NETWORK_NAME` / `PROJECT_NAME` / `ENVIRONMENT`）
//! 2. カタログの `defaultVariables`
//! 3. スタックの `service_overrides.<key>.variables`
//! 4. 環境の `service_overrides.<key>.environments.<env>.variables`

use stackflow_core::{EnvironmentOverride, Replacements, ServiceKey, ServiceOverride};
use stackflow_registry::ServiceDefinition;

pub const NETWORK_NAME_VAR: &str = "NETWORK_NAME";
pub const PROJECT_NAME_VAR: &str = "PROJECT_NAME";
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// Redis の最大メモリ（環境から既定値を導出する唯一の変数）
pub const REDIS_MAX_MEMORY_VAR: &str = "REDIS_MAX_MEMORY";

const REDIS_CATEGORY: &str = "cache";
const REDIS_NAME: &str = "redis";

/// 全サービス共通の固定キー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub project_name: String,
    pub network_name: String,
    pub environment: String,
}

impl BuildContext {
    pub fn new(project_name: impl Into<String>, environment: impl Into<String>) -> Self {
        let project_name = project_name.into();
        Self {
            network_name: format!("{}_network", project_name),
            project_name,
            environment: environment.into(),
        }
    }

    /// `<project>_<resource>`
    pub fn volume_name(&self, resource: &str) -> String {
        format!("{}_{}", self.project_name, resource)
    }

    fn fixed_variables(&self) -> Replacements {
        Replacements::from([
            (NETWORK_NAME_VAR.to_string(), self.network_name.clone()),
            (PROJECT_NAME_VAR.to_string(), self.project_name.clone()),
            (ENVIRONMENT_VAR.to_string(), self.environment.clone()),
        ])
    }
}

/// 環境名から Redis の最大メモリを決める（未知の環境は 256mb）
pub fn redis_max_memory(environment: &str) -> &'static str {
    match environment {
        "staging" => "512mb",
        "production" => "1024mb",
        _ => "256mb",
    }
}

/// 4層の変数を順に重ねた置換マップ
pub fn layered_variables(
    context: &BuildContext,
    key: &ServiceKey,
    definition: &ServiceDefinition,
    service_override: Option<&ServiceOverride>,
    environment_override: Option<&EnvironmentOverride>,
) -> Replacements {
    let mut variables = context.fixed_variables();

    let layers = [
        Some(&definition.default_variables),
        service_override.map(|o| &o.variables),
        environment_override.map(|o| &o.variables),
    ];
    for layer in layers.into_iter().flatten() {
        variables.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    if key.category == REDIS_CATEGORY && key.name == REDIS_NAME {
        variables
            .entry(REDIS_MAX_MEMORY_VAR.to_string())
            .or_insert_with(|| redis_max_memory(&context.environment).to_string());
    }

    variables
}
