//! StackFlow Compose: Docker Compose ドキュメントの生成
//!
//! スタックのサービスカタログとマニフェストから、選択されたサービスの
//! テンプレートをレンダリングし、3層のオーバーライド
//! （カタログ既定値 → スタック → 環境）を適用した Compose ファイルを組み立てます。
//!
//! ```no_run
//! use stackflow_compose::ComposeBuilder;
//! use std::collections::BTreeMap;
//! use std::path::Path;
//!
//! # fn main() -> stackflow_compose::Result<()> {
//! let stack = Path::new("/path/to/stacks/laravel");
//! let mut builder = ComposeBuilder::new();
//! let catalog = builder.catalog(stack)?;
//! let services = catalog.resolve_dependencies(&["workers.horizon".to_string()]);
//!
//! let config = BTreeMap::from([("PROJECT_NAME".to_string(), "shop".to_string())]);
//! let artifact = builder.build_with_stack(stack, &services, &config, "production")?;
//! artifact.write_to_file(Path::new("docker-compose.yml"))?;
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod builder;
pub mod error;
pub mod merge;
pub mod variables;

pub use artifact::*;
pub use builder::*;
pub use error::*;
pub use merge::*;
pub use variables::*;
