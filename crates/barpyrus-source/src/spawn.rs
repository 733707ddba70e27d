//! Fire-and-forget process launching for click actions.

use std::cell::RefCell;
use std::process::{Child, Command, Stdio};

use barpyrus_core::{BarError, Result};
use tracing::{debug, warn};

/// Launches detached helper processes (setxkbmap, menu launchers, ...).
pub trait Spawner {
    /// Start `argv[0]` with the remaining arguments and do not wait for it.
    fn spawn(&self, argv: &[String]) -> Result<()>;

    /// Start `command` through `sh -c`.
    fn spawn_shell(&self, command: &str) -> Result<()> {
        self.spawn(&["sh".to_string(), "-c".to_string(), command.to_string()])
    }
}

/// [`Spawner`] starting real processes.
///
/// Finished children are reaped on the next launch, so the panel does not
/// accumulate zombies.
#[derive(Debug, Default)]
pub struct ProcessSpawner {
    children: RefCell<Vec<Child>>,
}

impl ProcessSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    fn reap_finished(&self) {
        self.children.borrow_mut().retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = child.id(), %status, "helper exited");
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(pid = child.id(), error = %e, "cannot query helper status");
                false
            }
        });
    }
}

impl Spawner for ProcessSpawner {
    fn spawn(&self, argv: &[String]) -> Result<()> {
        self.reap_finished();
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| BarError::internal("cannot spawn an empty command line"))?;
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| BarError::spawn(program, e))?;
        debug!(pid = child.id(), ?argv, "spawned helper");
        self.children.borrow_mut().push(child);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_reap() {
        let spawner = ProcessSpawner::new();
        spawner.spawn_shell("exit 0").unwrap();
        assert_eq!(spawner.children.borrow().len(), 1);

        if let Some(child) = spawner.children.borrow_mut().first_mut() {
            child.wait().unwrap();
        }
        spawner.spawn(&["true".to_string()]).unwrap();
        // the first helper was reaped before the second one started
        assert_eq!(spawner.children.borrow().len(), 1);
    }

    #[test]
    fn test_spawn_empty_command() {
        assert!(ProcessSpawner::new().spawn(&[]).is_err());
    }

    #[test]
    fn test_spawn_missing_program() {
        let err = ProcessSpawner::new()
            .spawn(&["barpyrus-no-such-helper".to_string()])
            .unwrap_err();
        assert!(matches!(err, BarError::Spawn { .. }));
    }
}
