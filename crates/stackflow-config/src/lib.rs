//! StackFlow の設定
//!
//! ユーザー設定ディレクトリ、ローカルに展開済みのスタックの検索、
//! `.env` 形式のプロジェクト設定の読み込みを扱います。

pub mod error;

pub use error::*;

use stackflow_core::STACK_MANIFEST_FILE;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// スタックの検索先を上書きする環境変数
pub const STACKS_PATH_ENV: &str = "STACKFLOW_STACKS_PATH";

/// プロジェクト設定（`.env` のキーと値）
pub type ProjectConfig = BTreeMap<String, String>;

/// StackFlow の設定ディレクトリを取得（無ければ作成）
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("stackflow");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// スタックを展開しておくディレクトリ
///
/// 1. 環境変数 STACKFLOW_STACKS_PATH
/// 2. ~/.config/stackflow/stacks
pub fn find_stacks_dir() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(STACKS_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(get_config_dir()?.join("stacks"))
}

/// 名前からスタックディレクトリを探す（stack.json が必要）
pub fn find_stack(name: &str) -> Result<PathBuf> {
    let stacks_dir = find_stacks_dir()?;
    let stack_path = stacks_dir.join(name);

    if stack_path.join(STACK_MANIFEST_FILE).is_file() {
        debug!(stack = %name, path = %stack_path.display(), "Found stack");
        return Ok(stack_path);
    }

    Err(ConfigError::StackNotFound {
        name: name.to_string(),
        searched: stacks_dir,
    })
}

/// `.env` 形式のプロジェクト設定を読み込む
///
/// - 空行と `#` で始まる行は無視
/// - `export KEY=VALUE` の `export` は無視
/// - 値を囲む対になったクォートは除去
/// - 同じキーは後の行が優先
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_project_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_project_config(&content).map_err(|(line, message)| {
        ConfigError::EnvFileParse {
            path: path.to_path_buf(),
            line,
            message,
        }
    })?;

    info!(variable_count = config.len(), "Loaded project config");
    Ok(config)
}

fn parse_project_config(content: &str) -> std::result::Result<ProjectConfig, (usize, String)> {
    let mut config = ProjectConfig::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            return Err((index + 1, format!("'=' がありません: {}", line)));
        };

        let key = key.trim();
        if key.is_empty() {
            return Err((index + 1, "キーが空です".to_string()));
        }

        config.insert(key.to_string(), strip_quotes(value.trim()).to_string());
    }

    Ok(config)
}

fn strip_quotes(s: &str) -> &str {
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')));
    if quoted { &s[1..s.len() - 1] } else { s }
}
