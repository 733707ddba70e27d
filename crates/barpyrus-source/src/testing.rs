//! Scripted doubles for channels, readiness and the window manager.
//!
//! A [`Script`] is a shared timeline. Every call to
//! [`ScriptedPoller::wait`], including zero-timeout checks, consumes the
//! next step and delivers its items to the matching [`ScriptedSource`]s. A
//! wait with no step left fails, so a scheduler under test cannot hang.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::Duration;

use barpyrus_core::{BarError, Result};

use crate::herbstluft::WmClient;
use crate::input::{LineSink, LineSource};
use crate::poll::Readiness;
use crate::spawn::Spawner;

/// First descriptor handed out to scripted sources.
const FIRST_FAKE_FD: RawFd = 1000;

/// Something a scripted source produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Line(String),
    EndOfStream,
}

impl Item {
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    next_fd: RawFd,
    steps: VecDeque<Vec<(RawFd, Item)>>,
    pending: HashMap<RawFd, VecDeque<Item>>,
    waits: Vec<Duration>,
    terminated: Vec<String>,
    output: HashMap<String, Vec<String>>,
}

impl ScriptState {
    fn deliver(&mut self, step: Vec<(RawFd, Item)>) {
        for (fd, item) in step {
            self.pending.entry(fd).or_default().push_back(item);
        }
    }

    fn has_pending(&self, fd: RawFd) -> bool {
        self.pending.get(&fd).is_some_and(|q| !q.is_empty())
    }
}

/// Shared timeline of scripted input.
#[derive(Debug, Clone)]
pub struct Script(Rc<RefCell<ScriptState>>);

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl Script {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(ScriptState {
            next_fd: FIRST_FAKE_FD,
            ..ScriptState::default()
        })))
    }

    /// Create a source with a fresh fake descriptor.
    pub fn source(&self, name: &str) -> ScriptedSource {
        let mut state = self.0.borrow_mut();
        let fd = state.next_fd;
        state.next_fd += 1;
        ScriptedSource {
            name: name.to_string(),
            fd,
            script: self.clone(),
        }
    }

    /// Poller reading this timeline.
    pub fn poller(&self) -> ScriptedPoller {
        ScriptedPoller {
            script: self.clone(),
        }
    }

    /// Append a step delivering `items` on one wait call.
    pub fn step(&self, items: Vec<(RawFd, Item)>) -> &Self {
        self.0.borrow_mut().steps.push_back(items);
        self
    }

    /// Append a step in which nothing becomes ready.
    pub fn idle(&self) -> &Self {
        self.step(Vec::new())
    }

    /// Deliver every remaining step immediately, without a poller.
    pub fn deliver_all(&self) {
        let mut state = self.0.borrow_mut();
        while let Some(step) = state.steps.pop_front() {
            state.deliver(step);
        }
    }

    /// Number of steps not consumed yet.
    pub fn remaining_steps(&self) -> usize {
        self.0.borrow().steps.len()
    }

    /// Timeouts passed to every wait call so far.
    pub fn waits(&self) -> Vec<Duration> {
        self.0.borrow().waits.clone()
    }

    /// Names of sources in the order they were terminated.
    pub fn terminated(&self) -> Vec<String> {
        self.0.borrow().terminated.clone()
    }

    /// Lines written to the source called `name`.
    pub fn output(&self, name: &str) -> Vec<String> {
        self.0.borrow().output.get(name).cloned().unwrap_or_default()
    }
}

/// A fake channel fed by a [`Script`].
#[derive(Debug)]
pub struct ScriptedSource {
    name: String,
    fd: RawFd,
    script: Script,
}

impl ScriptedSource {
    pub fn fd(&self) -> RawFd {
        self.fd
    }
}

impl LineSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn raw_fd(&self) -> RawFd {
        self.fd
    }

    fn pull_lines(&mut self) -> Result<Vec<String>> {
        let mut state = self.script.0.borrow_mut();
        let Some(queue) = state.pending.get_mut(&self.fd) else {
            return Ok(Vec::new());
        };
        let mut lines = Vec::new();
        while let Some(item) = queue.front() {
            match item {
                Item::Line(text) => {
                    lines.push(text.clone());
                    queue.pop_front();
                }
                // Reported by the read after the one returning the last lines
                Item::EndOfStream if lines.is_empty() => {
                    return Err(BarError::end_of_stream(&self.name));
                }
                Item::EndOfStream => break,
            }
        }
        Ok(lines)
    }

    fn terminate(&mut self) {
        self.script.0.borrow_mut().terminated.push(self.name.clone());
    }
}

impl LineSink for ScriptedSource {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.script
            .0
            .borrow_mut()
            .output
            .entry(self.name.clone())
            .or_default()
            .push(line.to_string());
        Ok(())
    }
}

/// [`Readiness`] answering from a [`Script`].
#[derive(Debug)]
pub struct ScriptedPoller {
    script: Script,
}

impl Readiness for ScriptedPoller {
    fn wait(&mut self, fds: &[RawFd], timeout: Duration) -> Result<Vec<RawFd>> {
        let mut state = self.script.0.borrow_mut();
        state.waits.push(timeout);
        let step = state
            .steps
            .pop_front()
            .ok_or_else(|| BarError::internal("script exhausted"))?;
        state.deliver(step);
        Ok(fds
            .iter()
            .copied()
            .filter(|&fd| state.has_pending(fd))
            .collect())
    }
}

/// Window-manager client recording commands and replaying canned output.
#[derive(Debug, Default)]
pub struct FakeWm {
    responses: RefCell<HashMap<String, String>>,
    calls: RefCell<Vec<String>>,
}

impl FakeWm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` (arguments joined by spaces) with `stdout`.
    pub fn respond(&self, command: &str, stdout: &str) {
        self.responses
            .borrow_mut()
            .insert(command.to_string(), stdout.to_string());
    }

    /// Commands seen so far, arguments joined by spaces.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl WmClient for FakeWm {
    fn call(&self, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        self.calls.borrow_mut().push(command.clone());
        Ok(self
            .responses
            .borrow()
            .get(&command)
            .cloned()
            .unwrap_or_default())
    }
}

/// [`Spawner`] that records instead of launching.
#[derive(Debug, Default)]
pub struct RecordingSpawner {
    spawned: RefCell<Vec<Vec<String>>>,
}

impl RecordingSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawned(&self) -> Vec<Vec<String>> {
        self.spawned.borrow().clone()
    }
}

impl Spawner for RecordingSpawner {
    fn spawn(&self, argv: &[String]) -> Result<()> {
        self.spawned.borrow_mut().push(argv.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poller_consumes_one_step_per_wait() {
        let script = Script::new();
        let mut a = script.source("a");
        let b = script.source("b");
        let (fa, fb) = (a.fd(), b.fd());

        script.step(vec![(fa, Item::line("x"))]).idle();
        let mut poller = script.poller();

        assert_eq!(poller.wait(&[fa, fb], Duration::ZERO).unwrap(), vec![fa]);
        // still pending: reported again even on an idle step
        assert_eq!(poller.wait(&[fa, fb], Duration::from_secs(1)).unwrap(), vec![fa]);
        assert_eq!(a.pull_lines().unwrap(), vec!["x"]);

        assert!(poller.wait(&[fa, fb], Duration::ZERO).is_err());
        assert_eq!(script.waits(), vec![Duration::ZERO, Duration::from_secs(1), Duration::ZERO]);
    }

    #[test]
    fn test_end_of_stream_after_lines() {
        let script = Script::new();
        let mut a = script.source("a");
        script.step(vec![(a.fd(), Item::line("last")), (a.fd(), Item::EndOfStream)]);
        script.deliver_all();

        assert_eq!(a.pull_lines().unwrap(), vec!["last"]);
        assert!(a.pull_lines().unwrap_err().is_end_of_stream());
        assert!(a.pull_lines().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_sink_and_terminate_are_recorded() {
        let script = Script::new();
        let mut bar = script.source("bar");
        bar.write_line("%{F-}hi").unwrap();
        bar.terminate();
        assert_eq!(script.output("bar"), vec!["%{F-}hi"]);
        assert!(script.output("other").is_empty());
        assert_eq!(script.terminated(), vec!["bar"]);
    }
}
