//! Configuration for barpyrus.
//!
//! The panel reads `~/.config/barpyrus/config.yaml` (or `--config PATH`).
//! Every section is optional; missing fields take the defaults of the stock
//! panel.
//!
//! ```yaml
//! bar:
//!   height: 20
//!   fonts:
//!     - "-*-fixed-medium-*-*-*-12-*-*-*-*-*-*-*"
//! widgets:
//!   clock_format: "%a %d. %B, %H:%M"
//! timing:
//!   min_wait_ms: 50
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use barpyrus_core::{BarError, Result};
use serde::Deserialize;
use tracing::debug;

/// Default config file location (`$XDG_CONFIG_HOME/barpyrus/config.yaml`).
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("barpyrus").join("config.yaml"))
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    /// lemonbar process settings
    #[serde(default)]
    pub bar: BarSettings,

    /// Parameters of the stock widget tree
    #[serde(default)]
    pub widgets: WidgetSettings,

    /// Scheduler wait bounds
    #[serde(default)]
    pub timing: TimingSettings,
}

impl Config {
    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BarError::ConfigNotFound {
                    path: path.to_path_buf(),
                    source: Some(e),
                }
            } else {
                BarError::ConfigInvalid {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        })?;
        let config = Self::parse(&content).map_err(|message| BarError::ConfigInvalid {
            path: path.to_path_buf(),
            message,
        })?;
        config.validate().map_err(|message| BarError::ConfigInvalid {
            path: path.to_path_buf(),
            message,
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load from `path` if given, else from [`config_path`] if that file
    /// exists, else fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match config_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str::<Self>(content).map_err(|e| e.to_string())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.bar.height == 0 {
            return Err("bar.height must be > 0".into());
        }
        if self.bar.fonts.is_empty() {
            return Err("bar.fonts must list at least one font".into());
        }
        if self.timing.min_wait_ms == 0 {
            return Err("timing.min_wait_ms must be > 0".into());
        }
        if self.timing.max_wait_secs > MAX_WAIT_LIMIT_SECS {
            return Err(format!(
                "timing.max_wait_secs ({}s) exceeds one day ({MAX_WAIT_LIMIT_SECS}s)",
                self.timing.max_wait_secs
            ));
        }
        if self.timing.max_wait() < self.timing.min_wait() {
            return Err(format!(
                "timing.max_wait_secs ({}s) is shorter than timing.min_wait_ms ({}ms)",
                self.timing.max_wait_secs, self.timing.min_wait_ms
            ));
        }
        for (idx, layout) in self.widgets.keyboard_layouts.iter().enumerate() {
            if layout.name.is_empty() || layout.label.is_empty() {
                return Err(format!(
                    "widgets.keyboard_layouts[{idx}] needs a name and a label"
                ));
            }
        }
        Ok(())
    }
}

/// lemonbar process settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BarSettings {
    /// lemonbar executable
    pub command: String,
    /// Panel height in pixels
    pub height: u32,
    /// Maximum number of clickable areas (`-a`)
    pub clickable_areas: u32,
    /// Under/overline thickness in pixels (`-u`)
    pub underline_width: u32,
    /// Background color (`-B`)
    pub background: String,
    /// Fonts, in lemonbar index order (`-f`, index 1 first)
    pub fonts: Vec<String>,
    /// Font index used for icon glyphs
    pub symbol_font: u8,
    /// Font index used for fixed-width spacing; pixel offsets when unset
    pub space_font: Option<u8>,
}

impl Default for BarSettings {
    fn default() -> Self {
        Self {
            command: "lemonbar".into(),
            height: 16,
            clickable_areas: 100,
            underline_width: 2,
            background: "#ee121212".into(),
            fonts: vec![
                "-*-fixed-medium-*-*-*-12-*-*-*-*-*-*-*".into(),
                "-wuncon-siji-medium-r-normal--10-100-75-75-c-80-iso10646-1".into(),
            ],
            symbol_font: 2,
            space_font: None,
        }
    }
}

/// One selectable keyboard layout.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct KeyboardLayout {
    /// Internal name, sent with the `keyboard_layout` hook
    pub name: String,
    /// Text shown in the switcher
    pub label: String,
    /// Arguments appended to the setxkbmap command
    #[serde(default)]
    pub args: Vec<String>,
}

/// Colors and padding of the frame drawn around framed widgets.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrameSettings {
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub padding_left: u32,
    pub padding_right: u32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            fg: Some("#efefef".into()),
            bg: Some("#303030".into()),
            padding_left: 3,
            padding_right: 3,
        }
    }
}

/// Parameters of the stock widget tree.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WidgetSettings {
    /// strftime format of the long clock
    pub clock_format: String,
    /// strftime format of the short clock
    pub short_clock_format: String,
    /// conky text shown on the right
    pub conky_status: Option<String>,
    /// conky text shown in place of the window title on unfocused monitors
    pub conky_unfocused: Option<String>,
    /// Layouts offered by the keyboard layout switcher
    pub keyboard_layouts: Vec<KeyboardLayout>,
    /// Command (and leading arguments) used to apply a keyboard layout
    pub setxkbmap: Vec<String>,
    /// Media player followed by playerctl; disabled when unset
    pub player: Option<String>,
    /// Frame around the window title and clocks
    pub frame: FrameSettings,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            clock_format: "%H:%M, %Y-%m-%d".into(),
            short_clock_format: "%H:%M".into(),
            conky_status: Some(
                "${if_existing /sys/class/power_supply/BAT0}B: ${battery_percent} $endif".into(),
            ),
            conky_unfocused: Some("df /: ${fs_used_perc /}%".into()),
            keyboard_layouts: vec![
                KeyboardLayout {
                    name: "us".into(),
                    label: "us".into(),
                    args: vec!["-variant".into(), "altgr-intl".into(), "us".into()],
                },
                KeyboardLayout {
                    name: "de".into(),
                    label: "de".into(),
                    args: vec!["de".into()],
                },
            ],
            setxkbmap: [
                "setxkbmap",
                "-option",
                "compose:menu",
                "-option",
                "ctrl:nocaps",
                "-option",
                "compose:ralt",
                "-option",
                "compose:rctrl",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            player: None,
            frame: FrameSettings::default(),
        }
    }
}

/// Upper bound accepted for `timing.max_wait_secs`.
pub const MAX_WAIT_LIMIT_SECS: u64 = 24 * 60 * 60;

/// Bounds of the scheduler's blocking wait.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingSettings {
    /// Longest wait when no widget has a deadline
    pub max_wait_secs: u64,
    /// Shortest wait, even when a deadline already passed
    pub min_wait_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            max_wait_secs: 360,
            min_wait_ms: 100,
        }
    }
}

impl TimingSettings {
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn min_wait(&self) -> Duration {
        Duration::from_millis(self.min_wait_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bar.height, 16);
        assert_eq!(config.bar.fonts.len(), 2);
        assert_eq!(config.timing.max_wait(), Duration::from_secs(360));
        assert_eq!(config.timing.min_wait(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
bar:
  height: 24
widgets:
  clock_format: "%H:%M:%S"
  keyboard_layouts:
    - name: neo
      label: NEO
      args: [de, neo]
"#;
        let config = Config::parse(yaml).expect("Failed to parse config");
        assert_eq!(config.bar.height, 24);
        assert_eq!(config.bar.clickable_areas, 100);
        assert_eq!(config.widgets.clock_format, "%H:%M:%S");
        assert_eq!(config.widgets.short_clock_format, "%H:%M");
        assert_eq!(config.widgets.keyboard_layouts.len(), 1);
        assert_eq!(config.widgets.keyboard_layouts[0].args, vec!["de", "neo"]);
    }

    #[test]
    fn test_parse_empty_is_default() {
        assert_eq!(Config::parse("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_validate_rejects_bad_timing() {
        let mut config = Config::default();
        config.timing.min_wait_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timing.max_wait_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_caps_max_wait() {
        let mut config = Config::default();
        config.timing.max_wait_secs = MAX_WAIT_LIMIT_SECS;
        assert!(config.validate().is_ok());

        config.timing.max_wait_secs = MAX_WAIT_LIMIT_SECS + 1;
        assert!(config.validate().unwrap_err().contains("one day"));

        let yaml = format!("timing:\n  max_wait_secs: {}\n", u64::MAX);
        let config = Config::parse(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unnamed_layout() {
        let mut config = Config::default();
        config.widgets.keyboard_layouts.push(KeyboardLayout {
            name: String::new(),
            label: "x".into(),
            args: vec![],
        });
        let err = config.validate().unwrap_err();
        assert!(err.contains("keyboard_layouts[2]"));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(b"bar: [not, a, map").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, BarError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/barpyrus.yaml")).unwrap_err();
        assert!(matches!(err, BarError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_valid_file() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(b"timing:\n  min_wait_ms: 50\n").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.timing.min_wait(), Duration::from_millis(50));
    }

    #[test]
    #[serial]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        // SAFETY: serialized test, no other thread reads the environment
        unsafe { std::env::set_var("XDG_CONFIG_HOME", dir.path()) };
        let config = Config::load_or_default(None).unwrap();
        assert_eq!(config, Config::default());
        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };
    }
}
