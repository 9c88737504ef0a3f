//! 構造を壊さないディープマージ
//!
//! 両側がマッピングのキーだけを再帰的にマージし、それ以外（配列・スカラー・
//! 型の異なる組み合わせ）は上書き側の値でそのまま置き換えます。
//! 配列を要素単位でマージしたり、スカラーを配列に変えたりはしません。

use serde_yaml::{Mapping, Value};

/// `overrides` を `base` にマージ
///
/// ```
/// use stackflow_compose::deep_merge;
///
/// let mut base: serde_yaml::Value =
///     serde_yaml::from_str("limits:\n  cpus: '0.5'\n").unwrap();
/// let overrides: serde_yaml::Value =
///     serde_yaml::from_str("limits:\n  memory: 1G\n").unwrap();
///
/// deep_merge(&mut base, &overrides);
/// assert_eq!(base["limits"]["cpus"], "0.5");
/// assert_eq!(base["limits"]["memory"], "1G");
/// ```
pub fn deep_merge(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Mapping(base_map), Value::Mapping(override_map)) => {
            merge_mapping(base_map, override_map);
        }
        (base, overrides) => {
            *base = overrides.clone();
        }
    }
}

/// マッピング同士のマージ（キーの挿入順は base 側を維持し、新規キーは末尾に追加）
pub fn merge_mapping(base: &mut Mapping, overrides: &Mapping) {
    for (key, override_value) in overrides {
        match base.get_mut(key) {
            Some(existing) if existing.is_mapping() && override_value.is_mapping() => {
                deep_merge(existing, override_value);
            }
            _ => {
                base.insert(key.clone(), override_value.clone());
            }
        }
    }
}

/// `path` で示す位置に `overrides` をマージ
///
/// 途中のキーが存在しない、またはマッピングでない場合は
/// 空のマッピングを作成してから潜ります。
pub fn merge_at(base: &mut Mapping, path: &[&str], overrides: &Mapping) {
    let Some((head, rest)) = path.split_first() else {
        merge_mapping(base, overrides);
        return;
    };

    let key = Value::String((*head).to_string());
    let child = base
        .entry(key)
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !child.is_mapping() {
        *child = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(child) = child {
        merge_at(child, rest, overrides);
    }
}
