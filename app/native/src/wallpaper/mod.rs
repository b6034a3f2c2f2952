//! Wallpaper rotation.
//!
//! - [`catalog`] - lists images in a folder
//! - [`pool`] - shuffled non-repeating image order
//! - [`timing`] - fixed and randomized wait policies
//! - [`gate`] - screensaver detection
//! - [`sink`] - applies images to the desktop and browsers
//! - [`browser`] - browser new tab backgrounds
//! - [`scheduler`] - the background rotation worker

pub mod browser;
pub mod catalog;
pub mod gate;
pub mod pool;
pub mod scheduler;
pub mod signal;
pub mod sink;
pub mod timing;

pub use browser::BrowserTarget;
pub use catalog::{DirectoryCatalog, ImageCatalog, list_images_in_directory};
pub use gate::{NeverActive, ScreensaverGate, SwitchableGate, SystemScreensaverGate};
pub use scheduler::{Pacing, RotationScheduler, RunState, SchedulerStatus};
pub use sink::{SinkError, SinkOptions, SystemWallpaperSink, WallpaperSink};
pub use timing::{TimingError, TimingMode, TimingPolicy};
