pub mod catalog;
pub mod city;
pub mod config;
pub mod dataset;
pub mod demo;
pub mod map;
pub mod mask;
pub mod present;
pub mod region;
pub mod session;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use catalog::CityCatalog;
pub use city::CityRecord;
pub use config::{AppConfig, ConfigError};
pub use dataset::{Dataset, LoadError};
pub use demo::{demo_catalog, demo_dataset, demo_photo, demo_region};
pub use map::{MapError, MapRender, MapStyle, render_map};
pub use mask::{ImageLoadError, MASK_FILL, MaskBand, mask_band, mask_image, mask_photo};
pub use present::{CityCard, PhotoStatus, PhotoView, Screen, photo_view, screen, session_map};
pub use region::{RegionFilter, RegionMap, RegionPolygon};
pub use session::{SessionError, SessionPhase, SessionState, TRAIL_SEPARATOR};
