//! Compose ドキュメントの組み立て
//!
//! 呼び出し側が渡したサービスキーの順に、テンプレートのレンダリング・
//! オーバーライドのマージ・共有ボリュームの登録を行います。
//! 依存関係の解決は行わないため、必要なら事前に
//! [`Catalog::resolve_dependencies`] を通したリストを渡してください。

use crate::artifact::ComposeArtifact;
use crate::error::{ComposeError, Result};
use crate::merge::merge_at;
use crate::variables::{BuildContext, PROJECT_NAME_VAR, layered_variables};
use serde_yaml::{Mapping, Value};
use stackflow_core::{
    EnvironmentOverride, Replacements, ServiceKey, StackLayout, StackManifest, TemplateRef, find_placeholders,
    load_manifest,
};
use stackflow_registry::{Catalog, CatalogCache, ServiceDefinition};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// `PROJECT_NAME` が未設定のときのプロジェクト名
pub const DEFAULT_PROJECT_NAME: &str = "app";

/// Artifact Builder
///
/// 読み込んだカタログをスタックパス単位で保持します。
/// ビルド間で共有される状態はこのキャッシュだけです。
#[derive(Debug, Default)]
pub struct ComposeBuilder {
    cache: CatalogCache,
}

impl ComposeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: CatalogCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    pub fn catalog(&mut self, stack_path: &Path) -> Result<Arc<Catalog>> {
        Ok(self.cache.get_or_load(stack_path)?)
    }

    /// マニフェストを読み込み・検証してからビルド
    #[tracing::instrument(skip_all, fields(stack_path = %stack_path.display(), environment = %environment))]
    pub fn build_with_stack(
        &mut self,
        stack_path: &Path,
        services: &[String],
        project_config: &BTreeMap<String, String>,
        environment: &str,
    ) -> Result<ComposeArtifact> {
        let manifest = load_manifest(stack_path)?;
        self.build(
            stack_path,
            services,
            project_config,
            environment,
            Some(&manifest),
        )
    }

    /// サービスキーのリストから Compose ドキュメントを組み立てる
    ///
    /// `manifest` が `None` の場合、スタック・環境のオーバーライドは適用されません。
    #[tracing::instrument(skip_all, fields(stack_path = %stack_path.display(), environment = %environment))]
    pub fn build(
        &mut self,
        stack_path: &Path,
        services: &[String],
        project_config: &BTreeMap<String, String>,
        environment: &str,
        manifest: Option<&StackManifest>,
    ) -> Result<ComposeArtifact> {
        let project_name = project_config
            .get(PROJECT_NAME_VAR)
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PROJECT_NAME);
        let context = BuildContext::new(project_name, environment);
        let layout = StackLayout::new(stack_path);
        let catalog = self.catalog(stack_path)?;

        let mut artifact = ComposeArtifact::new(context.network_name.clone());

        for service in services {
            let key = ServiceKey::parse(service)
                .ok_or_else(|| ComposeError::InvalidServiceKey(service.clone()))?;
            let definition = catalog.get_service(&key.category, &key.name)?;

            let fragment = render_service(&context, &layout, &key, definition, manifest)?;
            artifact.add_services(service, fragment);

            for resource in &definition.provided_resources {
                if artifact.add_volume(resource, &context.volume_name(resource)) {
                    debug!(service = %key, volume = %resource, "Added volume");
                }
            }
        }

        info!(
            project = %context.project_name,
            services = artifact.services().len(),
            volumes = artifact.volumes().len(),
            "Compose artifact built"
        );

        Ok(artifact)
    }
}

/// 1サービス分のフラグメントをレンダリングしてオーバーライドを適用
fn render_service(
    context: &BuildContext,
    layout: &StackLayout,
    key: &ServiceKey,
    definition: &ServiceDefinition,
    manifest: Option<&StackManifest>,
) -> Result<Mapping> {
    let service_key = key.to_string();
    let service_override = manifest.and_then(|m| m.service_overrides(&service_key));
    let environment_override =
        manifest.and_then(|m| m.environment_overrides(&service_key, &context.environment));

    let variables = layered_variables(
        context,
        key,
        definition,
        service_override,
        environment_override,
    );
    check_required_variables(key, definition, &variables);

    let rendered = TemplateRef::parse(&definition.template_ref).render(layout, &variables)?;
    let leftover = find_placeholders(&rendered);
    if !leftover.is_empty() {
        warn!(
            service = %key,
            placeholders = %leftover.join(", "),
            "Unresolved placeholders left in template"
        );
    }

    let mut fragment = parse_fragment(&service_key, &rendered)?;

    if let Some(overrides) = environment_override {
        apply_environment_overrides(&mut fragment, key, overrides);
    }

    Ok(fragment)
}

fn check_required_variables(key: &ServiceKey, definition: &ServiceDefinition, variables: &Replacements) {
    let missing = definition.missing_required_variables(variables);
    if !missing.is_empty() {
        warn!(
            service = %key,
            variables = %missing.join(", "),
            "Required variables are not set"
        );
    }
}

/// レンダリング結果をマッピングとして解釈
fn parse_fragment(service: &str, rendered: &str) -> Result<Mapping> {
    let render_error = |message: String| ComposeError::Render {
        service: service.to_string(),
        message,
    };

    let value: Value = serde_yaml::from_str(rendered).map_err(|e| render_error(e.to_string()))?;
    match value {
        Value::Mapping(fragment) => Ok(fragment),
        Value::Null => Err(render_error("テンプレートが空です".to_string())),
        _ => Err(render_error(
            "トップレベルはマッピングである必要があります".to_string(),
        )),
    }
}

/// `deploy` と `deploy.resources` のオーバーライドをマージ
///
/// 適用先はサービス名と同じトップレベルキーのエントリ、それが無ければ
/// フラグメント唯一のトップレベルエントリです。どちらも無い場合は
/// フラグメントのルートに書き込まず、警告を出して適用しません。
fn apply_environment_overrides(
    fragment: &mut Mapping,
    service: &ServiceKey,
    overrides: &EnvironmentOverride,
) {
    if overrides.deploy.is_empty() && overrides.resources.is_empty() {
        return;
    }

    let target = if fragment.contains_key(service.name.as_str()) {
        Some(Value::String(service.name.clone()))
    } else if fragment.len() == 1 {
        fragment.keys().next().cloned()
    } else {
        None
    };

    match target.as_ref().and_then(|key| fragment.get_mut(key)) {
        Some(Value::Mapping(entry)) => merge_deploy(entry, overrides),
        _ => warn!(
            service = %service,
            "No service entry to apply deploy overrides to, skipping"
        ),
    }
}

fn merge_deploy(target: &mut Mapping, overrides: &EnvironmentOverride) {
    if !overrides.deploy.is_empty() {
        merge_at(target, &["deploy"], &overrides.deploy);
    }
    if !overrides.resources.is_empty() {
        merge_at(target, &["deploy", "resources"], &overrides.resources);
    }
}
