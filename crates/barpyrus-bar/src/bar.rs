//! The lemonbar process: where frames go and where clicks come from.

use std::os::fd::RawFd;

use barpyrus_core::{LoopContext, Result};
use barpyrus_source::Duplex;
use tracing::{debug, trace};

use crate::painter::{Frame, Painter, PainterStyle};
use crate::router::ClickTable;
use crate::widget::Widget;

/// Handle on the running bar.
///
/// Owns the click table of the last presented frame. A frame that is
/// rendered but never presented leaves the table untouched.
pub struct Bar {
    channel: Box<dyn Duplex>,
    style: PainterStyle,
    frame: u64,
    clicks: ClickTable,
}

impl Bar {
    pub fn new(channel: impl Duplex + 'static, style: PainterStyle) -> Self {
        Self {
            channel: Box::new(channel),
            style,
            frame: 0,
            clicks: ClickTable::new(),
        }
    }

    /// Start rendering the next frame.
    pub fn painter(&mut self) -> Painter {
        self.frame += 1;
        Painter::new(self.frame, self.style)
    }

    /// Number of the frame most recently handed out by [`Bar::painter`].
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Write `frame` to the bar and make its click tokens current.
    pub fn present(&mut self, frame: Frame) -> Result<()> {
        trace!(frame = self.frame, line = %frame.line, "presenting frame");
        self.channel.write_line(&frame.line)?;
        debug!(frame = self.frame, clicks = frame.clicks.len(), "frame presented");
        self.clicks = frame.clicks;
        Ok(())
    }

    /// Tokens of the frame currently on screen.
    pub fn clicks(&self) -> &ClickTable {
        &self.clicks
    }

    /// Deliver one click line reported by lemonbar.
    pub fn route_click(&self, token: &str, root: &mut dyn Widget, cx: &mut LoopContext) -> bool {
        self.clicks.route(token, root, cx)
    }

    pub fn name(&self) -> &str {
        self.channel.name()
    }

    pub fn raw_fd(&self) -> RawFd {
        self.channel.raw_fd()
    }

    /// Read the click lines available on the bar's stdout.
    pub fn pull_lines(&mut self) -> Result<Vec<String>> {
        self.channel.pull_lines()
    }

    pub fn terminate(&mut self) {
        self.channel.terminate();
    }
}

impl std::fmt::Debug for Bar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bar")
            .field("channel", &self.channel.name())
            .field("frame", &self.frame)
            .field("clicks", &self.clicks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Button;
    use barpyrus_source::testing::Script;

    #[test]
    fn test_unflushed_frame_keeps_previous_clicks() {
        let script = Script::new();
        let mut bar = Bar::new(script.source("lemonbar"), PainterStyle::default());
        let button = Button::new("x");

        let mut p = bar.painter();
        p.widget(&button);
        p.flush(&mut bar).unwrap();
        assert_eq!(script.output("lemonbar"), vec!["%{A1:1_0_1:}x%{A}"]);
        assert!(bar.clicks().resolve("1_0_1").is_some());

        // rendered but discarded
        let mut p = bar.painter();
        p.widget(&button);
        drop(p);
        assert_eq!(bar.frame(), 2);
        assert!(bar.clicks().resolve("1_0_1").is_some());
        assert!(bar.clicks().resolve("2_0_1").is_none());
    }

    #[test]
    fn test_stale_painter_cannot_flush() {
        let script = Script::new();
        let mut bar = Bar::new(script.source("lemonbar"), PainterStyle::default());
        let stale = bar.painter();
        let _current = bar.painter();
        assert!(stale.flush(&mut bar).is_err());
        assert!(script.output("lemonbar").is_empty());
    }
}
