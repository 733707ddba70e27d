//! Media player metadata via `playerctl --follow`.

use std::collections::HashMap;

use barpyrus_core::Result;
use tracing::warn;

use crate::channel::Channel;

/// Field separator in the requested format string.
const SEPARATOR: &str = "<>";

/// Metadata fields followed by the panel, in format order.
pub const FIELDS: [&str; 4] = ["artist", "title", "status", "album"];

/// Command line for `playerctl [--player=P] --follow --format=... metadata`.
pub fn command(program: &str, player: Option<&str>, fields: &[&str]) -> Vec<String> {
    let mut argv = vec![program.to_string()];
    if let Some(player) = player {
        argv.push(format!("--player={player}"));
    }
    let format = fields
        .iter()
        .map(|f| format!("{{{{markup_escape({f})}}}}"))
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    argv.push("--follow".into());
    argv.push(format!("--format={format}"));
    argv.push("metadata".into());
    argv
}

/// Spawn playerctl following `player` (or any player).
pub fn spawn(player: Option<&str>) -> Result<Channel> {
    let mut channel = Channel::spawn(&command("playerctl", player, &FIELDS))?;
    channel.close_stdin();
    Ok(channel)
}

/// Latest metadata reported by playerctl.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerMetadata {
    values: HashMap<String, String>,
}

impl PlayerMetadata {
    /// Value of `field`, or the empty string before the first report.
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn is_playing(&self) -> bool {
        self.get("status") == "Playing"
    }

    /// Apply one output line of [`command`] built with `fields`.
    ///
    /// A field count mismatch is logged; the fields that are present are
    /// still applied.
    pub fn update(&mut self, line: &str, fields: &[&str]) {
        let values: Vec<&str> = line.split(SEPARATOR).collect();
        if values.len() != fields.len() {
            warn!(
                expected = fields.len(),
                got = values.len(),
                %line,
                "unexpected field count from playerctl"
            );
        }
        for (field, value) in fields.iter().zip(values) {
            self.values.insert(field.to_string(), unescape_markup(value));
        }
    }
}

/// Undo the escaping applied by playerctl's `markup_escape`.
fn unescape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let entity = rest.find(';').map(|end| (&rest[1..end], end));
        let decoded = entity.and_then(|(name, end)| decode_entity(name).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => name.strip_prefix('#')?.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
