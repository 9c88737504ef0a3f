use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "スタック '{name}' が見つかりません（検索先: {searched}）\n\
        ヒント: スタックディレクトリに stack.json があるか確認してください。\n\
        STACKFLOW_STACKS_PATH 環境変数で検索先を変更できます"
    )]
    StackNotFound { name: String, searched: PathBuf },

    #[error("プロジェクト設定のパースエラー: {path}:{line}\n理由: {message}")]
    EnvFileParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
