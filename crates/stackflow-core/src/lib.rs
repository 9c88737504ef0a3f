//! StackFlow コア
//!
//! スタックディレクトリのレイアウト、テンプレートフラグメントの読み込み、
//! スタックマニフェスト（stack.json）の読み込みと検証を提供します。

pub mod error;
pub mod layout;
pub mod manifest;
pub mod model;
pub mod template;

pub use error::*;
pub use layout::*;
pub use manifest::*;
pub use model::*;
pub use template::*;
