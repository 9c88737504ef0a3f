//! スタックマニフェスト定義

use super::overrides::{EnvironmentOverride, ServiceOverride};
use std::collections::HashMap;

/// スタックマニフェスト（stack.json）
///
/// スタック = アプリケーションの雛形（例: "laravel"）。
/// 検証済みの値のみが構築されます（[`crate::load_manifest`] を参照）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackManifest {
    pub name: String,
    pub version: String,
    /// JSON の `type`
    pub stack_type: String,
    pub framework: String,
    pub description: Option<String>,
    /// 必須サービススロット（宣言順）
    pub required_services: Vec<ServiceSlot>,
    /// オプションサービススロット（宣言順）
    pub optional_services: Vec<ServiceSlot>,
    /// サービスキー（`category.name`）→ 上書き設定
    pub service_overrides: HashMap<String, ServiceOverride>,
    /// 生成される変数（宣言順）
    pub generated_variables: Vec<GeneratedVariable>,
}

/// サービススロット
///
/// カテゴリ内の選択肢と既定値。`default` はサービス名（カテゴリなし）です。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceSlot {
    pub name: String,
    pub category: String,
    pub options: Vec<String>,
    pub default: Option<String>,
}

impl ServiceSlot {
    /// 既定サービスのキー（`category.default`）
    pub fn default_key(&self) -> Option<String> {
        self.default
            .as_ref()
            .map(|default| format!("{}.{}", self.category, default))
    }
}

/// 生成変数の宣言
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVariable {
    pub name: String,
    pub generator: GeneratorKind,
    /// `generator` 以外の任意オプション（長さ等）
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// 生成器の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    /// 汎用の安全な乱数文字列
    SecureRandom,
    /// フレームワーク固有のキー（例: Laravel の APP_KEY）
    StackSpecificKey,
}

impl GeneratorKind {
    /// 許可されている JSON 表記
    pub const ALLOWED: [&'static str; 2] = ["secure_random", "stack_specific_key"];

    /// 文字列からパース
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "secure_random" => Some(Self::SecureRandom),
            "stack_specific_key" => Some(Self::StackSpecificKey),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecureRandom => "secure_random",
            Self::StackSpecificKey => "stack_specific_key",
        }
    }
}

impl StackManifest {
    /// サービス単位の上書き設定
    pub fn service_overrides(&self, service_key: &str) -> Option<&ServiceOverride> {
        self.service_overrides.get(service_key)
    }

    /// 環境固有の上書き設定（どちらかの階層が無ければ `None`）
    pub fn environment_overrides(
        &self,
        service_key: &str,
        environment: &str,
    ) -> Option<&EnvironmentOverride> {
        self.service_overrides(service_key)
            .and_then(|o| o.environment(environment))
    }

    /// 既定で選択されるサービスキー
    ///
    /// 必須スロットの既定値（宣言順）の後に、既定値が null でない
    /// オプションスロット（宣言順）が続きます。
    pub fn default_services(&self) -> Vec<String> {
        self.required_services
            .iter()
            .chain(self.optional_services.iter())
            .filter_map(ServiceSlot::default_key)
            .collect()
    }

    pub fn generated_variables(&self) -> &[GeneratedVariable] {
        &self.generated_variables
    }
}
