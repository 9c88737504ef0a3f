use stackflow_core::CoreError;
use stackflow_registry::RegistryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error(
        "不正なサービスキー: '{0}'\nヒント: サービスキーは 'category.name' の形式で指定してください"
    )]
    InvalidServiceKey(String),

    #[error("サービス '{service}' のテンプレートを解釈できません\n理由: {message}")]
    Render { service: String, message: String },

    #[error("YAML シリアライズエラー: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("ファイルの書き込みに失敗しました: {path}\n理由: {message}")]
    Write { path: PathBuf, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, ComposeError>;
