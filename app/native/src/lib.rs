//! Wallshift - rotates the desktop wallpaper from a folder of images.
//!
//! A background scheduler picks images without repeating one until the folder
//! is exhausted, pauses while the screensaver runs, and can mirror each image
//! into browser new-tab pages. The daemon is driven through a small CLI over a
//! local control socket.

pub mod autostart;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod daemon;
pub mod error;
pub mod ipc;
pub mod platform;
pub mod schema;
pub mod wallpaper;
