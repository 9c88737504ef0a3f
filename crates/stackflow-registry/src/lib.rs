//! Service Registry: スタック単位のサービスカタログ
//!
//! `services/registry.json` に定義された利用可能なサービスを読み込み・検証し、
//! 選択されたサービスの依存関係を解決してインストール順序を決定します。
//!
//! # 概要
//!
//! - **Catalog**: `category.name` で識別されるサービス定義の集合
//! - **Resolver**: 推移的な依存関係の収集と安定したトポロジカル順序付け
//! - **Cache**: スタックパス単位で読み込み済みカタログを保持（呼び出し側が所有）

pub mod cache;
pub mod error;
pub mod model;
pub mod parser;
pub mod resolver;

pub use cache::*;
pub use error::*;
pub use model::*;
pub use parser::*;
pub use resolver::*;
