//! conky as a line source.
//!
//! conky is started with `-c -` and reads a generated Lua configuration from
//! stdin; afterwards it prints one line of `conky.text` per update interval.

use barpyrus_core::Result;
use tracing::debug;

use crate::channel::Channel;
use crate::input::LineSink;

/// Settings written into the `conky.config` table unless overridden.
const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("out_to_console", "true"),
    ("out_to_x", "false"),
    ("update_interval", "20"),
    ("background", "false"),
    ("default_bar_width", "5"),
    ("use_spacer", "none"),
];

/// A conky configuration: settings table, optional Lua, and the text.
#[derive(Debug, Clone, PartialEq)]
pub struct ConkyConfig {
    text: String,
    settings: Vec<(String, String)>,
    lua: String,
}

impl ConkyConfig {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            settings: DEFAULT_SETTINGS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            lua: String::new(),
        }
    }

    /// Set (or override) one `conky.config` entry. `value` is written as
    /// Lua source.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        match self.settings.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.settings.push((key, value)),
        }
        self
    }

    /// Extra Lua placed between the settings table and the text.
    pub fn with_lua(mut self, lua: impl Into<String>) -> Self {
        self.lua = lua.into();
        self
    }

    /// The configuration as conky reads it.
    pub fn render(&self) -> String {
        let mut out = String::from("conky.config = {\n");
        for (key, value) in &self.settings {
            out.push_str(&format!("    {key} = {value},\n"));
        }
        out.push_str("};\n");
        out.push_str(&self.lua);
        out.push('\n');
        out.push_str("conky.text = [[\n");
        out.push_str(&self.text);
        out.push_str("\n]];");
        out
    }

    /// Spawn `conky -c -`, feed it this configuration and close its stdin.
    pub fn spawn(&self) -> Result<Channel> {
        let mut channel = Channel::spawn(&["conky", "-c", "-"])?;
        channel.write_line(&self.render())?;
        channel.close_stdin();
        debug!(text = %self.text, "conky started");
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_defaults() {
        let rendered = ConkyConfig::new("${cpu}%").render();
        assert!(rendered.starts_with("conky.config = {\n    out_to_console = true,\n"));
        assert!(rendered.contains("    update_interval = 20,\n"));
        assert!(rendered.ends_with("conky.text = [[\n${cpu}%\n]];"));
    }

    #[test]
    fn test_set_overrides_in_place() {
        let config = ConkyConfig::new("x")
            .set("update_interval", "1")
            .set("cpu_avg_samples", "2")
            .with_lua("-- nothing");
        let rendered = config.render();
        assert!(rendered.contains("    update_interval = 1,\n"));
        assert!(!rendered.contains("update_interval = 20"));
        assert!(rendered.contains("    cpu_avg_samples = 2,\n};\n-- nothing\n"));
        // overriding keeps the original position
        let interval = rendered.find("update_interval").unwrap();
        let background = rendered.find("background").unwrap();
        assert!(interval < background);
    }
}
