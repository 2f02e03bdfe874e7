/// Extension settings

/// Session key the home URL is stored under
pub const HOME_URL_KEY: &str = "originalUrl";

/// Shared by the background script and the popup, so both read and write
/// home URLs under the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub home_url_key: String,
    /// One of `error`, `warn`, `info`, `debug`, `trace`
    pub log_level: String,
    /// Unload pinned tabs that already have a home URL during the startup sync
    pub discard_on_sync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            home_url_key: HOME_URL_KEY.to_string(),
            log_level: "info".to_string(),
            discard_on_sync: true,
        }
    }
}

impl Config {
    /// Falls back to `Info` for unknown level names
    pub fn level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}
