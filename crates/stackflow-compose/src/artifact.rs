//! Docker Compose ドキュメント
//!
//! `services` / `networks` / `volumes` の3つのトップレベルキーだけを持ちます。
//! 各サービスの中身はテンプレートが自由に定義するため、固定スキーマではなく
//! `serde_yaml::Value` の木として保持します。

use crate::error::{ComposeError, Result};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::{info, warn};

const NETWORK_DRIVER: &str = "bridge";
const VOLUME_DRIVER: &str = "local";

#[derive(Debug, Clone, PartialEq)]
pub struct ComposeArtifact {
    network_name: String,
    services: Mapping,
    networks: Mapping,
    volumes: Mapping,
}

impl ComposeArtifact {
    /// ネットワークを1つだけ持つ空のドキュメント
    pub fn new(network_name: impl Into<String>) -> Self {
        let network_name = network_name.into();
        let mut networks = Mapping::new();
        networks.insert(
            Value::String(network_name.clone()),
            single_entry("driver", NETWORK_DRIVER),
        );

        Self {
            network_name,
            services: Mapping::new(),
            networks,
            volumes: Mapping::new(),
        }
    }

    pub fn network_name(&self) -> &str {
        &self.network_name
    }

    pub fn services(&self) -> &Mapping {
        &self.services
    }

    pub fn networks(&self) -> &Mapping {
        &self.networks
    }

    pub fn volumes(&self) -> &Mapping {
        &self.volumes
    }

    pub fn service(&self, name: &str) -> Option<&Value> {
        self.services.get(name)
    }

    /// レンダリング済みフラグメントのトップレベルキーを `services` に追加
    ///
    /// 同名のキーが既にあれば後から追加したものが上書きします。
    pub fn add_services(&mut self, origin: &str, fragment: Mapping) {
        for (name, definition) in fragment {
            if self.services.contains_key(&name) {
                warn!(
                    service = %origin,
                    key = ?name.as_str(),
                    "Service key already defined, overwriting"
                );
            }
            self.services.insert(name, definition);
        }
    }

    /// 名前付きボリュームを追加（既に存在すれば何もしない）
    ///
    /// キーはリソース名、実体の名前は `volume_name` です。
    pub fn add_volume(&mut self, resource: &str, volume_name: &str) -> bool {
        if self.volumes.contains_key(resource) {
            return false;
        }

        let mut volume = Mapping::new();
        volume.insert("driver".into(), VOLUME_DRIVER.into());
        volume.insert("name".into(), volume_name.into());
        self.volumes.insert(resource.into(), Value::Mapping(volume));
        true
    }

    /// ドキュメント全体（services → networks → volumes の順）
    pub fn to_value(&self) -> Value {
        let mut root = Mapping::new();
        root.insert("services".into(), Value::Mapping(self.services.clone()));
        root.insert("networks".into(), Value::Mapping(self.networks.clone()));
        root.insert("volumes".into(), Value::Mapping(self.volumes.clone()));
        Value::Mapping(root)
    }

    /// ブロックスタイルの YAML に変換
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_value())?)
    }

    /// YAML を書き出す（親ディレクトリが無ければ作成）
    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        let write_error = |e: std::io::Error| ComposeError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, yaml).map_err(write_error)?;

        info!(
            services = self.services.len(),
            volumes = self.volumes.len(),
            "Compose file written"
        );
        Ok(())
    }
}

fn single_entry(key: &str, value: &str) -> Value {
    let mut map = Mapping::new();
    map.insert(key.into(), value.into());
    Value::Mapping(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str) -> Mapping {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_new_artifact_skeleton() {
        let artifact = ComposeArtifact::new("shop_network");

        assert_eq!(artifact.network_name(), "shop_network");
        assert!(artifact.services().is_empty());
        assert!(artifact.volumes().is_empty());
        assert_eq!(artifact.networks()["shop_network"]["driver"], "bridge");
    }

    #[test]
    fn test_add_services_later_wins() {
        let mut artifact = ComposeArtifact::new("app_network");
        artifact.add_services("cache.redis", fragment("redis:\n  image: redis:7\n"));
        artifact.add_services("legacy.redis", fragment("redis:\n  image: redis:6\n"));

        assert_eq!(artifact.services().len(), 1);
        assert_eq!(artifact.service("redis").unwrap()["image"], "redis:6");
    }

    #[test]
    fn test_add_volume_deduplicates() {
        let mut artifact = ComposeArtifact::new("app_network");

        assert!(artifact.add_volume("redis_data", "app_redis_data"));
        assert!(!artifact.add_volume("redis_data", "app_redis_data"));

        assert_eq!(artifact.volumes().len(), 1);
        assert_eq!(artifact.volumes()["redis_data"]["name"], "app_redis_data");
        assert_eq!(artifact.volumes()["redis_data"]["driver"], "local");
    }

    #[test]
    fn test_to_yaml_block_style_and_quoting() {
        let mut artifact = ComposeArtifact::new("app_network");
        artifact.add_services(
            "app.web",
            fragment("web:\n  image: nginx\n  ports:\n    - '8080:80'\n  command: 'echo a: b'\n"),
        );

        let yaml = artifact.to_yaml().unwrap();

        assert!(yaml.starts_with("services:\n"));
        assert!(yaml.contains("  web:\n    image: nginx\n"));
        assert!(yaml.contains("volumes: {}\n"));

        let parsed: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["services"]["web"]["ports"][0], "8080:80");
        assert_eq!(parsed["services"]["web"]["command"], "echo a: b");
        assert_eq!(parsed, artifact.to_value());
    }

    #[test]
    fn test_top_level_key_order() {
        let artifact = ComposeArtifact::new("app_network");

        let value = artifact.to_value();
        let keys: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(keys, vec!["services", "networks", "volumes"]);
    }

    #[test]
    fn test_write_to_file_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("deploy/prod/docker-compose.yml");
        let artifact = ComposeArtifact::new("app_network");

        artifact.write_to_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, artifact.to_yaml().unwrap());
    }

    #[test]
    fn test_write_to_file_error_names_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();
        let path = blocker.join("docker-compose.yml");

        let err = ComposeArtifact::new("app_network")
            .write_to_file(&path)
            .unwrap_err();

        assert!(matches!(err, ComposeError::Write { .. }));
        assert!(err.to_string().contains("docker-compose.yml"));
    }
}
