//! User configuration: selector binary and default flags.
//!
//! Settings are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/fzf-but-typed/config.toml` (default
//! `~/.config/fzf-but-typed/config.toml`).  `FZF_BUT_TYPED_BIN` overrides the
//! binary for a single run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::options::{FzfOptions, Layout};

/// Environment variable that overrides [`SelectorConfig::binary`].
pub const BIN_ENV: &str = "FZF_BUT_TYPED_BIN";

/// Defaults applied to every [`Selector`](crate::selector::Selector) built
/// from the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Selector program, looked up on `PATH`.
    pub binary: String,
    /// Pass `FZF_DEFAULT_OPTS` through to the selector.
    pub inherit_default_opts: bool,
    /// `--height` value; `None` runs fullscreen.
    pub height: Option<String>,
    pub layout: Layout,
    /// Kill the selector after this long.
    pub timeout: Option<Duration>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            binary: "fzf".to_string(),
            inherit_default_opts: false,
            height: None,
            layout: Layout::Default,
            timeout: None,
        }
    }
}

impl SelectorConfig {
    /// Load config from disk and the environment, falling back to defaults.
    pub fn load() -> Self {
        let mut config = Self::load_from(&config_path());
        config.apply_binary_override(std::env::var(BIN_ENV).ok());
        config
    }

    /// Load config from `path`; a missing or unreadable file gives defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(&contents),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "can't read config");
                }
                Self::default()
            }
        }
    }

    /// Persist current config to the default location.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialise())?;
        Ok(())
    }

    /// Base flags for a selector built from this config.
    pub fn options(&self) -> FzfOptions {
        let mut options = FzfOptions::new().layout(self.layout);
        options.height = self.height.clone();
        options
    }

    fn apply_binary_override(&mut self, binary: Option<String>) {
        if let Some(binary) = binary.filter(|b| !b.trim().is_empty()) {
            tracing::debug!(%binary, "selector binary overridden from {BIN_ENV}");
            self.binary = binary;
        }
    }

    fn parse_config(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            match key {
                "binary" => {
                    if value.is_empty() {
                        tracing::warn!(binary = %config.binary, "empty binary in config, keeping");
                    } else {
                        config.binary = value.to_string();
                    }
                }
                "inherit_default_opts" => match value {
                    "true" => config.inherit_default_opts = true,
                    "false" => config.inherit_default_opts = false,
                    _ => tracing::warn!(value, "inherit_default_opts is not true or false"),
                },
                "height" => {
                    config.height = (!value.is_empty()).then(|| value.to_string());
                }
                "layout" => match Layout::parse(value) {
                    Some(layout) => config.layout = layout,
                    None => tracing::warn!(value, "unknown layout in config"),
                },
                "timeout_ms" => match value.parse::<u64>() {
                    Ok(0) => config.timeout = None,
                    Ok(ms) => config.timeout = Some(Duration::from_millis(ms)),
                    Err(_) => tracing::warn!(value, "timeout_ms is not a number"),
                },
                _ => tracing::warn!(key, "unknown config key"),
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let timeout_ms = self.timeout.map_or(0, |t| t.as_millis());
        let lines = [
            "# fzf-but-typed configuration".to_string(),
            String::new(),
            "# Selector program, looked up on PATH".to_string(),
            format!("binary = {}", self.binary),
            "# Keep FZF_DEFAULT_OPTS in the selector's environment".to_string(),
            format!("inherit_default_opts = {}", self.inherit_default_opts),
            "# --height, e.g. 40% (empty = fullscreen)".to_string(),
            format!("height = {}", self.height.as_deref().unwrap_or("")),
            "# default, reverse or reverse-list".to_string(),
            format!("layout = {}", self.layout.label()),
            "# Kill the selector after this many milliseconds (0 = never)".to_string(),
            format!("timeout_ms = {timeout_ms}"),
            String::new(),
        ];
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/fzf-but-typed/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join(env!("CARGO_PKG_NAME")).join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_key() {
        let config = SelectorConfig::parse_config(
            "# comment\n\
             [selector]\n\
             binary = \"sk\"\n\
             inherit_default_opts = true\n\
             height = 40%\n\
             layout = reverse\n\
             timeout_ms = 1500\n",
        );
        assert_eq!(
            config,
            SelectorConfig {
                binary: "sk".into(),
                inherit_default_opts: true,
                height: Some("40%".into()),
                layout: Layout::Reverse,
                timeout: Some(Duration::from_millis(1500)),
            }
        );
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = SelectorConfig::parse_config(
            "binary =\nlayout = sideways\ntimeout_ms = soon\ncolour = red\nnot a pair\n",
        );
        assert_eq!(config, SelectorConfig::default());
    }

    #[test]
    fn bad_values_do_not_undo_earlier_lines() {
        let config = SelectorConfig::parse_config(
            "binary = sk\n\
             inherit_default_opts = true\n\
             binary =\n\
             inherit_default_opts = yes\n",
        );
        assert_eq!(config.binary, "sk");
        assert!(config.inherit_default_opts);

        let config = SelectorConfig::parse_config(
            "inherit_default_opts = true\ninherit_default_opts = false",
        );
        assert!(!config.inherit_default_opts);
    }

    #[test]
    fn zero_timeout_means_none() {
        let config = SelectorConfig::parse_config("timeout_ms = 0");
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = SelectorConfig {
            binary: "/opt/bin/fzf".into(),
            inherit_default_opts: true,
            height: Some("20".into()),
            layout: Layout::ReverseList,
            timeout: Some(Duration::from_secs(3)),
        };
        config.save_to(&path).unwrap();
        assert_eq!(SelectorConfig::load_from(&path), config);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SelectorConfig::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config, SelectorConfig::default());
    }

    #[test]
    fn env_override_wins_unless_blank() {
        let mut config = SelectorConfig::default();
        config.apply_binary_override(Some("  ".into()));
        assert_eq!(config.binary, "fzf");
        config.apply_binary_override(Some("sk".into()));
        assert_eq!(config.binary, "sk");
        config.apply_binary_override(None);
        assert_eq!(config.binary, "sk");
    }

    #[test]
    fn options_carry_height_and_layout() {
        let config = SelectorConfig {
            height: Some("50%".into()),
            layout: Layout::Reverse,
            ..SelectorConfig::default()
        };
        assert_eq!(config.options().to_args(), ["--height=50%", "--layout=reverse"]);
    }
}
