//! サービスキー（`category.name`）

use std::fmt;

/// カタログエントリを指す `category.name` 形式のキー
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey {
    pub category: String,
    pub name: String,
}

impl ServiceKey {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// 空でない2セグメントにちょうど分割できる場合のみ `Some`
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.split('.');
        let category = parts.next()?;
        let name = parts.next()?;
        if parts.next().is_some() || category.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(category, name))
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.name)
    }
}
