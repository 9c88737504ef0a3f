//! スタックディレクトリのレイアウト
//!
//! 規約ベースのディレクトリ構造:
//!
//! ```text
//! <stack>/
//! ├── stack.json              スタックマニフェスト
//! └── services/
//!     ├── registry.json       サービスカタログ
//!     └── cache/redis.yml     サービステンプレート（templateRef の参照先）
//! ```

use std::path::{Path, PathBuf};

/// スタックマニフェストのファイル名
pub const STACK_MANIFEST_FILE: &str = "stack.json";

/// サービスディレクトリ名
pub const SERVICES_DIR: &str = "services";

/// サービスカタログのファイル名（services/ 配下）
pub const REGISTRY_FILE: &str = "registry.json";

/// 展開済みスタックディレクトリ
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackLayout {
    root: PathBuf,
}

impl StackLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<stack>/stack.json`
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(STACK_MANIFEST_FILE)
    }

    /// `<stack>/services`
    pub fn services_dir(&self) -> PathBuf {
        self.root.join(SERVICES_DIR)
    }

    /// `<stack>/services/registry.json`
    pub fn registry_path(&self) -> PathBuf {
        self.services_dir().join(REGISTRY_FILE)
    }

    /// サービスディレクトリからの相対パスでテンプレートファイルを解決
    pub fn template_path(&self, file: &str) -> PathBuf {
        self.services_dir().join(file)
    }
}
