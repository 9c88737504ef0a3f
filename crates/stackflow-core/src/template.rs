//! テンプレートフラグメントの読み込み
//!
//! サービステンプレートは `{{PLACEHOLDER}}` 形式のトークンを含むテキストファイルです。
//! 1つのファイルを `# @section: <name>` 行で複数のセクションに分割できます。
//!
//! ```yaml
//! redis:
//!   image: redis:7-alpine
//!   command: redis-server --maxmemory {{REDIS_MAX_MEMORY}}
//! # @section: volumes
//! redis_data:
//!   driver: local
//! ```

use crate::error::{CoreError, Result};
use crate::layout::StackLayout;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// 最初のマーカーより前の内容が属するセクション名
pub const BASE_SECTION: &str = "base";

/// 置換変数（キー → 値）
pub type Replacements = HashMap<String, String>;

static SECTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*#\s*@\s*section\s*:\s*(\S+)\s*$").expect("section marker pattern")
});

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder pattern"));

static PLACEHOLDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").expect("placeholder name pattern")
});

/// テンプレートファイルを読み込んで置換
///
/// `replacements` に存在しないキーのプレースホルダーはそのまま残ります。
pub fn load_template(path: &Path, replacements: &Replacements) -> Result<String> {
    let content = read_template(path)?;
    Ok(substitute(&content, replacements))
}

/// テキストをセクションに分割
///
/// - 最初のマーカーより前の内容（マーカーが無い場合は全体）は `base` セクション
/// - セクション名は小文字に正規化
/// - 内容が空のセクションは結果に含めない
/// - 同名のセクションが複数ある場合は出現順に連結
pub fn parse_sections(text: &str) -> BTreeMap<String, String> {
    let mut sections: BTreeMap<String, String> = BTreeMap::new();
    let mut current = BASE_SECTION.to_string();
    let mut buffer: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = SECTION_MARKER.captures(line) {
            flush_section(&mut sections, &current, &buffer);
            current = caps[1].to_lowercase();
            buffer.clear();
        } else {
            buffer.push(line);
        }
    }
    flush_section(&mut sections, &current, &buffer);

    sections
}

fn flush_section(sections: &mut BTreeMap<String, String>, name: &str, lines: &[&str]) {
    let content = lines.join("\n");
    let content = content.trim();
    if content.is_empty() {
        return;
    }

    sections
        .entry(name.to_string())
        .and_modify(|existing| {
            existing.push('\n');
            existing.push_str(content);
        })
        .or_insert_with(|| content.to_string());
}

/// 指定セクションを読み込んで置換
///
/// セクションが存在しない場合は `Ok(None)` を返します。
pub fn load_section(
    path: &Path,
    section: &str,
    replacements: &Replacements,
) -> Result<Option<String>> {
    let content = read_template(path)?;
    let mut sections = parse_sections(&content);

    Ok(sections
        .remove(&section.to_lowercase())
        .map(|text| substitute(&text, replacements)))
}

/// ファイルに有効なセクションマーカーが1つ以上含まれるか
pub fn has_sections(path: &Path) -> Result<bool> {
    let content = read_template(path)?;
    Ok(content.lines().any(|line| SECTION_MARKER.is_match(line)))
}

/// `{{KEY}}` を置換
///
/// 1パスで置換するため、置換後の値に含まれるプレースホルダーは再展開されません。
pub fn substitute(text: &str, replacements: &Replacements) -> String {
    if replacements.is_empty() {
        return text.to_string();
    }

    PLACEHOLDER
        .replace_all(text, |caps: &Captures| match replacements.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// 未解決のプレースホルダー名を列挙（重複なし、名前順）
pub fn find_placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER_NAME
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// カタログの `templateRef`
///
/// `cache/redis.yml` はファイル全体、`cache/redis.yml#service` は
/// `service` セクションのみを参照します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateRef<'a> {
    pub file: &'a str,
    pub section: Option<&'a str>,
}

impl<'a> TemplateRef<'a> {
    pub fn parse(value: &'a str) -> Self {
        match value.rsplit_once('#') {
            Some((file, section)) if !file.is_empty() && !section.is_empty() => Self {
                file,
                section: Some(section),
            },
            _ => Self {
                file: value,
                section: None,
            },
        }
    }

    /// スタックのサービスディレクトリを基準に読み込んで置換
    ///
    /// セクション指定が無く、ファイルにセクションマーカーがある場合は
    /// `base` セクションのみをレンダリングします。
    pub fn render(&self, layout: &StackLayout, replacements: &Replacements) -> Result<String> {
        let path = layout.template_path(self.file);
        debug!(template = %path.display(), section = ?self.section, "Rendering template");

        match self.section {
            Some(section) => load_section(&path, section, replacements)?.ok_or_else(|| {
                CoreError::SectionNotFound {
                    path,
                    section: section.to_string(),
                }
            }),
            None if has_sections(&path)? => {
                debug!(template = %path.display(), "Template has sections, rendering base only");
                load_section(&path, BASE_SECTION, replacements)?.ok_or_else(|| {
                    CoreError::SectionNotFound {
                        path,
                        section: BASE_SECTION.to_string(),
                    }
                })
            }
            None => load_template(&path, replacements),
        }
    }
}

fn read_template(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(CoreError::TemplateNotFound(path.to_path_buf()));
    }

    std::fs::read_to_string(path).map_err(|e| CoreError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
