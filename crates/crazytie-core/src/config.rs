//! TOML loading shared by the per-game configs.

use serde::de::DeserializeOwned;

/// Load a game config from the file named by `env_var`, else `default_path`,
/// else defaults. A file that exists but fails to parse is logged and
/// skipped.
pub fn load_game_config<T>(env_var: &str, default_path: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let override_path = std::env::var(env_var).ok();
    let candidates = override_path.iter().map(String::as_str).chain([default_path]);
    for path in candidates {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        if let Some(config) = parse_config(&contents, path) {
            tracing::info!(path, "Loaded game configuration");
            return config;
        }
    }
    T::default()
}

/// Parse one config file's contents. `source` only labels the warning.
pub fn parse_config<T: DeserializeOwned>(contents: &str, source: &str) -> Option<T> {
    match toml::from_str(contents) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(source, "Failed to parse {source}: {e}, ignoring");
            None
        },
    }
}
