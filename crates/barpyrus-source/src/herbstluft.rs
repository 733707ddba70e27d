//! herbstluftwm integration.
//!
//! [`HerbstClient`] runs one-shot `herbstclient -n` commands; [`HerbstInput`]
//! follows `herbstclient --idle` and dispatches every hook line to the
//! callbacks registered for its event name.

use std::collections::HashMap;
use std::os::fd::RawFd;
use std::process::{Command, Stdio};

use barpyrus_core::{BarError, LoopContext, Result};
use tracing::{debug, instrument, warn};

use crate::channel::Channel;
use crate::input::{EventInput, LineSource};

/// Monitor geometry as reported by `monitor_rect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Parse the `X Y W H` output of `monitor_rect`.
    pub fn parse(output: &str) -> Result<Self> {
        let fields: Vec<&str> = output.split_whitespace().collect();
        let &[x, y, w, h] = fields.as_slice() else {
            return Err(BarError::parse(
                "monitor_rect",
                format!("expected 4 fields, got {output:?}"),
            ));
        };
        let int = |s: &str| {
            s.parse::<i32>()
                .map_err(|e| BarError::parse("monitor_rect", format!("{s:?}: {e}")))
        };
        let dim = |s: &str| {
            s.parse::<u32>()
                .map_err(|e| BarError::parse("monitor_rect", format!("{s:?}: {e}")))
        };
        Ok(Self {
            x: int(x)?,
            y: int(y)?,
            width: dim(w)?,
            height: dim(h)?,
        })
    }
}

/// State of one tag as encoded by the first character of a `tag_status`
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    /// `.` no clients
    Empty,
    /// `#` focused and shown on this monitor
    FocusedHere,
    /// `%` focused, shown on another monitor
    FocusedElsewhere,
    /// `+` shown on this monitor, unfocused
    Here,
    /// `!` contains an urgent client
    Urgent,
    /// `:` occupied, not visible
    Hidden,
    /// `-` shown on another monitor, unfocused
    VisibleElsewhere,
}

impl TagState {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '.' => Self::Empty,
            '#' => Self::FocusedHere,
            '%' => Self::FocusedElsewhere,
            '+' => Self::Here,
            '!' => Self::Urgent,
            ':' => Self::Hidden,
            '-' => Self::VisibleElsewhere,
            _ => return None,
        })
    }
}

/// One entry of `tag_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagStatus {
    pub name: String,
    pub state: TagState,
}

impl TagStatus {
    pub fn is_empty(&self) -> bool {
        self.state == TagState::Empty
    }

    pub fn occupied(&self) -> bool {
        !self.is_empty()
    }

    pub fn focused(&self) -> bool {
        matches!(self.state, TagState::FocusedHere | TagState::FocusedElsewhere)
    }

    pub fn here(&self) -> bool {
        matches!(self.state, TagState::FocusedHere | TagState::Here)
    }

    pub fn urgent(&self) -> bool {
        self.state == TagState::Urgent
    }

    pub fn visible(&self) -> bool {
        !matches!(self.state, TagState::Empty | TagState::Hidden)
    }
}

/// Parse the tab-separated output of `tag_status`.
///
/// Unknown status characters are logged and treated like `-`.
pub fn parse_tag_status(output: &str) -> Vec<TagStatus> {
    output
        .trim_matches(|c| c == '\t' || c == '\n')
        .split('\t')
        .filter_map(|field| {
            let mut chars = field.chars();
            let marker = chars.next()?;
            let state = TagState::from_char(marker).unwrap_or_else(|| {
                warn!(%marker, tag = chars.as_str(), "unknown tag status marker");
                TagState::VisibleElsewhere
            });
            Some(TagStatus {
                name: chars.as_str().to_string(),
                state,
            })
        })
        .collect()
}

/// A client able to run window-manager commands.
pub trait WmClient {
    /// Run one command and return its stdout.
    fn call(&self, args: &[&str]) -> Result<String>;

    fn monitor_rect(&self, monitor: u32) -> Result<Rect> {
        Rect::parse(&self.call(&["monitor_rect", monitor.to_string().as_str()])?)
    }

    /// Reserve `top` pixels at the top of `monitor`.
    fn pad(&self, monitor: u32, top: u32) -> Result<()> {
        let (monitor, top) = (monitor.to_string(), top.to_string());
        self.call(&["pad", monitor.as_str(), top.as_str()]).map(drop)
    }

    fn tag_status(&self, monitor: u32) -> Result<Vec<TagStatus>> {
        Ok(parse_tag_status(
            &self.call(&["tag_status", monitor.to_string().as_str()])?,
        ))
    }

    /// Read an attribute, trimmed of surrounding whitespace.
    fn attr(&self, path: &str) -> Result<String> {
        Ok(self.call(&["attr", path])?.trim().to_string())
    }

    fn emit_hook(&self, args: &[&str]) -> Result<()> {
        let mut argv = vec!["emit_hook"];
        argv.extend_from_slice(args);
        self.call(&argv).map(drop)
    }
}

/// Runs `herbstclient -n <args>` as a child process.
#[derive(Debug, Clone)]
pub struct HerbstClient {
    program: String,
}

impl Default for HerbstClient {
    fn default() -> Self {
        Self {
            program: "herbstclient".into(),
        }
    }
}

impl HerbstClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different client executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl WmClient for HerbstClient {
    #[instrument(level = "debug", skip(self))]
    fn call(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-n")
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| BarError::spawn(&self.program, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            return Err(BarError::WmCommand {
                args: args.iter().map(|s| s.to_string()).collect(),
                exit_code: output.status.code(),
                stdout,
            });
        }
        Ok(stdout)
    }
}

/// Callback for one window-manager hook; receives the fields after the
/// event name.
pub type Hook = Box<dyn FnMut(&[String], &mut LoopContext)>;

/// The `herbstclient --idle` event stream.
pub struct HerbstInput {
    source: Box<dyn LineSource>,
    hooks: HashMap<String, Vec<Hook>>,
    open: bool,
}

impl HerbstInput {
    /// Spawn `herbstclient --idle`.
    pub fn connect() -> Result<Self> {
        let mut channel = Channel::spawn(&["herbstclient", "--idle"])?;
        channel.close_stdin();
        Ok(Self::new(channel))
    }

    /// Follow hook lines from `source`.
    ///
    /// `quit_panel` and `reload` request shutdown of the main loop.
    pub fn new(source: impl LineSource + 'static) -> Self {
        let mut input = Self {
            source: Box::new(source),
            hooks: HashMap::new(),
            open: true,
        };
        for event in ["quit_panel", "reload"] {
            input.enhook(event, |_, cx| cx.request_shutdown());
        }
        input
    }

    /// Register `hook` for `event`. Hooks run in registration order.
    pub fn enhook(
        &mut self,
        event: impl Into<String>,
        hook: impl FnMut(&[String], &mut LoopContext) + 'static,
    ) {
        self.hooks
            .entry(event.into())
            .or_default()
            .push(Box::new(hook));
    }

    /// Dispatch one hook line.
    pub fn dispatch(&mut self, line: &str, cx: &mut LoopContext) {
        let mut fields = line.split('\t').map(str::to_string);
        let Some(event) = fields.next().filter(|e| !e.is_empty()) else {
            return;
        };
        let args: Vec<String> = fields.collect();
        match self.hooks.get_mut(&event) {
            Some(hooks) => {
                debug!(%event, ?args, handlers = hooks.len(), "dispatching hook");
                for hook in hooks.iter_mut() {
                    hook(&args[..], cx);
                }
            }
            None => debug!(%event, "no handler for hook"),
        }
    }
}

impl EventInput for HerbstInput {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn raw_fd(&self) -> Option<RawFd> {
        self.open.then(|| self.source.raw_fd())
    }

    fn process(&mut self, cx: &mut LoopContext) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        for line in self.source.pull_lines()? {
            self.dispatch(&line, cx);
        }
        Ok(())
    }

    fn is_critical(&self) -> bool {
        true
    }

    fn terminate(&mut self) {
        if self.open {
            self.source.terminate();
            self.open = false;
        }
    }
}
