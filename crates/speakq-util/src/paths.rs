//! Default paths for speakq components
//!
//! Paths are user-writable by default (no root required):
//! - Socket: `$XDG_RUNTIME_DIR/speakqd/speakqd.sock` or `/tmp/speakqd-$USER/speakqd.sock`
//! - Config: `$XDG_CONFIG_HOME/speakq/config.toml` or `~/.config/speakq/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const SPEAKQ_SOCKET_ENV: &str = "SPEAKQ_SOCKET";

/// Socket filename within the socket directory
const SOCKET_FILENAME: &str = "speakqd.sock";

/// Daemon subdirectory name
const DAEMON_DIR: &str = "speakqd";

/// Config subdirectory name
const CONFIG_DIR: &str = "speakq";

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$SPEAKQ_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/speakqd/speakqd.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/speakqd-$USER/speakqd.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(SPEAKQ_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking the SPEAKQ_SOCKET env var.
/// Used for default values in configs where the env var is checked separately.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(DAEMON_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", DAEMON_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/speakq/config.toml`
/// 2. `~/.config/speakq/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(CONFIG_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR)
            .join("config.toml");
    }

    PathBuf::from("/etc").join(CONFIG_DIR).join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_contains_speakqd() {
        let path = socket_path_without_env();
        assert!(path.to_string_lossy().contains("speakqd"));
        assert!(path.to_string_lossy().ends_with(".sock"));
    }

    #[test]
    fn config_path_is_toml() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("speakq"));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
    }
}
