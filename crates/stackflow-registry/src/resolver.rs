//! 依存関係の解決
//!
//! 選択されたサービスキーに推移的な依存関係を加え、依存先が常に依存元より
//! 前に来るインストール順序を求めます。循環依存があっても必ず終了します。

use stackflow_core::ServiceKey;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// 依存解決に必要なカタログ参照
pub trait ServiceLookup {
    /// サービスが宣言している依存先の名前（未登録なら None）
    fn dependencies_of(&self, key: &ServiceKey) -> Option<&[String]>;

    /// 名前からサービスキーを検索
    fn find_service_key(&self, name: &str) -> Option<ServiceKey>;
}

/// 依存関係リゾルバー
pub struct DependencyResolver;

impl DependencyResolver {
    /// 選択されたサービスと推移的な依存先をインストール順に返す
    ///
    /// - `category.name` の形式でないキーは展開せずそのまま通します
    /// - どのカテゴリにも存在しない依存先は警告を出して無視します
    /// - 循環があれば残りを現在の順序のまま末尾に追加します
    pub fn resolve<C: ServiceLookup>(selected: &[String], catalog: &C) -> Vec<String> {
        let mut closure: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        for key in selected {
            if seen.insert(key.clone()) {
                queue.push_back(key.clone());
            }
        }

        while let Some(current) = queue.pop_front() {
            closure.push(current.clone());

            let Some(key) = ServiceKey::parse(&current) else {
                debug!(service = %current, "Passing through malformed service key");
                continue;
            };
            let Some(dependencies) = catalog.dependencies_of(&key) else {
                continue;
            };

            let mut resolved = Vec::new();
            for name in dependencies {
                let Some(dependency) = catalog.find_service_key(name) else {
                    warn!(
                        service = %current,
                        dependency = %name,
                        "Dependency not found in catalog, dropping"
                    );
                    continue;
                };
                let dependency = dependency.to_string();
                if seen.insert(dependency.clone()) {
                    queue.push_back(dependency.clone());
                }
                resolved.push(dependency);
            }
            edges.insert(current, resolved);
        }

        Self::order(closure, &edges)
    }

    /// 依存先がすべて出力済みの要素を先頭から順に取り出す安定な並べ替え
    fn order(mut pending: Vec<String>, edges: &HashMap<String, Vec<String>>) -> Vec<String> {
        let mut ordered: Vec<String> = Vec::with_capacity(pending.len());
        let mut emitted: HashSet<String> = HashSet::new();

        while !pending.is_empty() {
            let ready = pending.iter().position(|key| {
                edges.get(key).is_none_or(|deps| {
                    deps.iter()
                        .all(|dep| emitted.contains(dep) || !edges.contains_key(dep))
                })
            });

            let Some(index) = ready else {
                warn!(
                    services = %pending.join(", "),
                    "Circular dependency detected, appending remaining services"
                );
                ordered.append(&mut pending);
                break;
            };

            let key = pending.remove(index);
            emitted.insert(key.clone());
            ordered.push(key);
        }

        ordered
    }
}
