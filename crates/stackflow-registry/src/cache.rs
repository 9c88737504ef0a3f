//! スタックパス単位のカタログキャッシュ
//!
//! グローバル状態は持たず、呼び出し側（通常は ComposeBuilder）が所有します。
//! 一度読み込んだカタログは不変なので `Arc` で共有します。

use crate::error::Result;
use crate::model::Catalog;
use crate::parser::load_catalog;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct CatalogCache {
    catalogs: HashMap<PathBuf, Arc<Catalog>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// キャッシュ済みならそれを返し、なければ読み込んで保持する
    pub fn get_or_load(&mut self, stack_path: &Path) -> Result<Arc<Catalog>> {
        if let Some(catalog) = self.catalogs.get(stack_path) {
            debug!(stack_path = %stack_path.display(), "Catalog cache hit");
            return Ok(Arc::clone(catalog));
        }

        let catalog = Arc::new(load_catalog(stack_path)?);
        self.catalogs
            .insert(stack_path.to_path_buf(), Arc::clone(&catalog));
        Ok(catalog)
    }

    pub fn get(&self, stack_path: &Path) -> Option<Arc<Catalog>> {
        self.catalogs.get(stack_path).cloned()
    }

    pub fn contains(&self, stack_path: &Path) -> bool {
        self.catalogs.contains_key(stack_path)
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    pub fn clear(&mut self) {
        self.catalogs.clear();
    }
}
