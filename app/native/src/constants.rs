//! Application-wide constants.

/// Short application name, used for directories, sockets and login items.
pub const APP_NAME: &str = "wallshift";

/// Reverse-DNS identifier used for the cache directory and the macOS launch agent.
pub const APP_BUNDLE_ID: &str = "com.wallshift.app";

/// File name of the PNG copy of the current wallpaper handed to browsers.
pub const SHARED_IMAGE_NAME: &str = "wallshift_wallpaper.png";

/// File name of the generated Firefox new tab page.
pub const FIREFOX_NEWTAB_NAME: &str = "wallshift_newtab.html";
