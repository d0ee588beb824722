//! CLI argument definitions for the Concierge terminal host.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use concierge_core::config::ConciergeConfig;

/// Concierge: a rule-based shop assistant you can talk to from the terminal.
#[derive(Parser, Debug, Default)]
#[command(name = "concierge", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory for the chat history database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Intent catalog location: a file path or an http(s) URL.
    #[arg(long = "intents")]
    pub intents: Option<String>,

    /// Pause before each reply, in milliseconds.
    #[arg(long = "typing-delay-ms")]
    pub typing_delay_ms: Option<u64>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CONCIERGE_CONFIG env var > ~/.concierge/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CONCIERGE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Fold the flags that were given into a loaded configuration.
    pub fn apply(&self, config: &mut ConciergeConfig) {
        if let Some(ref dir) = self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref location) = self.intents {
            config.chat.intents_path = location.clone();
        }
        if let Some(ms) = self.typing_delay_ms {
            config.chat.typing_delay_ms = ms;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".concierge").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".concierge").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_flags() {
        let args = CliArgs::try_parse_from([
            "concierge",
            "-c",
            "/tmp/c.toml",
            "-d",
            "/tmp/data",
            "-l",
            "debug",
            "--intents",
            "https://shop.example/intents.json",
            "--typing-delay-ms",
            "0",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/data")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(
            args.intents.as_deref(),
            Some("https://shop.example/intents.json")
        );
        assert_eq!(args.typing_delay_ms, Some(0));
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let args = CliArgs {
            config: Some(PathBuf::from("/etc/concierge.toml")),
            ..CliArgs::default()
        };
        assert_eq!(
            args.resolve_config_path(),
            PathBuf::from("/etc/concierge.toml")
        );
    }

    #[test]
    fn test_apply_overrides_only_given_flags() {
        let mut config = ConciergeConfig::default();
        let args = CliArgs {
            data_dir: Some(PathBuf::from("/srv/concierge")),
            typing_delay_ms: Some(0),
            ..CliArgs::default()
        };
        args.apply(&mut config);

        assert_eq!(config.general.data_dir, "/srv/concierge");
        assert_eq!(config.chat.typing_delay_ms, 0);
        // Untouched.
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.chat.intents_path, "data/chat-intents.json");
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[general]
log_level = "warn"

[chat]
intents_path = "https://shop.example/intents.json"
typing_delay_ms = 1200
"#,
        )
        .unwrap();

        let args = CliArgs::try_parse_from([
            "concierge",
            "--config",
            path.to_str().unwrap(),
            "--typing-delay-ms",
            "0",
        ])
        .unwrap();
        let mut config = ConciergeConfig::load_or_default(&args.resolve_config_path());
        args.apply(&mut config);

        // From the file.
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.chat.intents_path, "https://shop.example/intents.json");
        // From the flag.
        assert_eq!(config.chat.typing_delay_ms, 0);
        // Defaults.
        assert_eq!(config.general.data_dir, "~/.concierge/data");
        assert_eq!(config.chat.max_history_length, 50);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("relative"), PathBuf::from("relative"));
        let expanded = expand_home("~/.concierge/data");
        assert!(expanded.ends_with(".concierge/data"));
        assert!(!expanded.starts_with("~"));
    }
}
