#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod assets;
pub mod config;
pub mod error;
pub mod models;
pub mod renderer;
pub mod store;
pub mod wake;

pub use assets::Assets;
pub use config::{AssetsConfig, DEFAULT_BUILD};
pub use error::{AssetsError, Result};
pub use models::{AssetKind, ResolutionKey, ResolveMode};
pub use renderer::{IncludeOptions, Renderer, RendererOptions};
