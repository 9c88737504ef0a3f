use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("テンプレートが見つかりません: {0}")]
    TemplateNotFound(PathBuf),

    #[error("セクション '{section}' が見つかりません: {path}")]
    SectionNotFound { path: PathBuf, section: String },

    #[error(
        "スタックマニフェストが見つかりません: {0}\nヒント: スタックディレクトリに stack.json を配置してください"
    )]
    ManifestNotFound(PathBuf),

    #[error("スタックマニフェストのパースエラー: {path}\n理由: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("不正なスタックマニフェスト: {0}")]
    InvalidManifest(String),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
