#![forbid(unsafe_code)]

pub mod apps;
pub mod assets;
pub mod config;
pub mod foundation;
pub mod publish;
pub mod quiz;
pub mod render;
pub mod sources;

pub use apps::{App, Now, RenderResources};
pub use config::{AppConfig, Config};
pub use foundation::core::{Bitmap, DISPLAY_HEIGHT, DISPLAY_WIDTH, Raster};
pub use foundation::error::{InkError, InkResult};
pub use publish::{Manifest, PublishResult, Publisher, ScreenOutcome};
