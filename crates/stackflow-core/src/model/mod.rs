//! モデル定義
//!
//! スタックマニフェストとサービスキーのデータモデルを定義します。

mod de;
mod manifest;
mod overrides;
mod service_key;

// Re-exports
pub use de::{json_to_string_map, json_type_name};
pub use manifest::*;
pub use overrides::*;
pub use service_key::*;
