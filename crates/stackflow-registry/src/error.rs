//! Service Registry エラー型

use std::path::PathBuf;

/// Service Registry のエラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("サービスレジストリが見つかりません: {0}")]
    NotFound(PathBuf),

    #[error("サービスレジストリのパースエラー: {path}\n理由: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("不正なサービスレジストリ定義: {0}")]
    InvalidRegistry(String),

    #[error("サービス '{category}.{name}' が見つかりません")]
    ServiceNotFound { category: String, name: String },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
