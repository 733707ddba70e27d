//! Widgets showing the output of auxiliary status processes.

use std::cell::RefCell;
use std::rc::Rc;

use barpyrus_core::Result;
use barpyrus_source::conky::ConkyConfig;
use barpyrus_source::playerctl::{self, FIELDS, PlayerMetadata};
use barpyrus_source::{EventInput, LineInput, LineSource};

use crate::painter::Painter;
use crate::widget::{Widget, WidgetBase};

/// The latest line printed by conky, drawn as markup.
///
/// When conky goes away the widget keeps showing its last line.
pub struct ConkyWidget {
    base: WidgetBase,
    text: Rc<RefCell<String>>,
    input: LineInput,
}

impl ConkyWidget {
    /// Show the lines of an already running conky.
    pub fn new(source: impl LineSource + 'static) -> Self {
        let text = Rc::new(RefCell::new(String::new()));
        let latest = Rc::clone(&text);
        let input = LineInput::new(source, move |line, _| {
            *latest.borrow_mut() = line.to_string();
        });
        Self {
            base: WidgetBase::new(),
            text,
            input,
        }
    }

    pub fn spawn(config: &ConkyConfig) -> Result<Self> {
        Ok(Self::new(config.spawn()?))
    }

    pub fn with_base(mut self, base: WidgetBase) -> Self {
        self.base = base;
        self
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }
}

impl Widget for ConkyWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        p.draw_raw(&self.text.borrow());
    }

    fn is_empty(&self) -> bool {
        self.text.borrow().is_empty()
    }

    fn own_inputs(&mut self, f: &mut dyn FnMut(&mut dyn EventInput)) {
        f(&mut self.input);
    }
}

/// Play state glyphs in the symbol font.
const PLAY_SYMBOL: char = '\u{e058}';
const PAUSE_SYMBOL: char = '\u{e059}';

/// Colors of a [`PlayerWidget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerColors {
    pub symbol: String,
    pub text: String,
    pub artist: String,
    pub title: String,
    pub album: String,
}

impl Default for PlayerColors {
    fn default() -> Self {
        Self {
            symbol: "#b16286".into(),
            text: "#a89984".into(),
            artist: "#b8bb26".into(),
            title: "#fe8019".into(),
            album: "#fabd2f".into(),
        }
    }
}

/// Play state, artist, title and album of a media player.
pub struct PlayerWidget {
    base: WidgetBase,
    meta: Rc<RefCell<PlayerMetadata>>,
    colors: PlayerColors,
    input: LineInput,
}

impl PlayerWidget {
    /// Follow metadata lines produced by [`playerctl::command`] with
    /// [`FIELDS`].
    pub fn new(source: impl LineSource + 'static) -> Self {
        let meta = Rc::new(RefCell::new(PlayerMetadata::default()));
        let latest = Rc::clone(&meta);
        let input = LineInput::new(source, move |line, _| {
            latest.borrow_mut().update(line, &FIELDS);
        });
        Self {
            base: WidgetBase::new(),
            meta,
            colors: PlayerColors::default(),
            input,
        }
    }

    /// Follow `player`, or whichever player playerctl picks.
    pub fn spawn(player: Option<&str>) -> Result<Self> {
        Ok(Self::new(playerctl::spawn(player)?))
    }

    pub fn with_colors(mut self, colors: PlayerColors) -> Self {
        self.colors = colors;
        self
    }

    pub fn metadata(&self) -> PlayerMetadata {
        self.meta.borrow().clone()
    }
}

impl Widget for PlayerWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        let meta = self.meta.borrow();
        let c = &self.colors;
        p.fg(Some(&c.symbol));
        p.symbol(if meta.is_playing() {
            PLAY_SYMBOL
        } else {
            PAUSE_SYMBOL
        });
        p.space(3);
        p.fg(Some(&c.artist));
        p.text(meta.get("artist"));
        p.fg(Some(&c.text));
        p.text(": ");
        p.fg(Some(&c.title));
        p.text(meta.get("title"));
        p.fg(Some(&c.text));
        let album = meta.get("album");
        if !album.is_empty() {
            p.text(" (");
            p.fg(Some(&c.album));
            p.text(album);
            p.fg(Some(&c.text));
            p.text(")");
        }
        p.fg(None);
    }

    fn is_empty(&self) -> bool {
        let meta = self.meta.borrow();
        meta.get("title").is_empty() && meta.get("artist").is_empty()
    }

    fn own_inputs(&mut self, f: &mut dyn FnMut(&mut dyn EventInput)) {
        f(&mut self.input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::painter::PainterStyle;
    use crate::widget::render_line;
    use barpyrus_core::LoopContext;
    use barpyrus_source::testing::{Item, Script};

    fn process_all(widget: &mut dyn Widget) {
        let mut cx = LoopContext::new();
        widget.event_inputs(&mut |input| {
            let _ = input.process(&mut cx);
        });
    }

    #[test]
    fn test_conky_widget_shows_latest_line() {
        let script = Script::new();
        let source = script.source("conky");
        let fd = source.fd();
        let mut conky = ConkyWidget::new(source);
        assert!(conky.is_empty());

        script.step(vec![(fd, Item::line("cpu 3%")), (fd, Item::line("%{F#fff}cpu 5%"))]);
        script.deliver_all();
        process_all(&mut conky);
        assert_eq!(conky.text(), "%{F#fff}cpu 5%");
        assert_eq!(render_line(&conky, PainterStyle::default()), "%{F#fff}cpu 5%");
    }

    #[test]
    fn test_conky_widget_keeps_text_after_end_of_stream() {
        let script = Script::new();
        let source = script.source("conky");
        let fd = source.fd();
        let mut conky = ConkyWidget::new(source);
        script.step(vec![(fd, Item::line("up")), (fd, Item::EndOfStream)]);
        script.deliver_all();

        let mut cx = LoopContext::new();
        let mut results = Vec::new();
        for _ in 0..2 {
            conky.event_inputs(&mut |input| results.push(input.process(&mut cx).is_ok()));
        }
        assert_eq!(results, vec![true, false]);
        assert_eq!(conky.text(), "up");
    }

    #[test]
    fn test_player_widget_renders_metadata() {
        let script = Script::new();
        let source = script.source("playerctl");
        let fd = source.fd();
        let mut player = PlayerWidget::new(source).with_colors(PlayerColors {
            symbol: "#1".into(),
            text: "#2".into(),
            artist: "#3".into(),
            title: "#4".into(),
            album: "#5".into(),
        });
        assert!(player.is_empty());

        script.step(vec![(fd, Item::line("Bach<>Air &amp; Aria<>Playing<>"))]);
        script.deliver_all();
        process_all(&mut player);

        assert!(player.metadata().is_playing());
        assert_eq!(
            render_line(&player, PainterStyle::default()),
            "%{F#1}%{T2}\u{e058}%{T-}%{O3}%{F#3}Bach%{F#2}: %{F#4}Air & Aria%{F#2}%{F-}"
        );
    }

    #[test]
    fn test_player_widget_album_and_pause() {
        let script = Script::new();
        let source = script.source("playerctl");
        let fd = source.fd();
        let mut player = PlayerWidget::new(source);
        script.step(vec![(fd, Item::line("A<>T<>Paused<>LP"))]);
        script.deliver_all();
        process_all(&mut player);

        let line = render_line(&player, PainterStyle::default());
        assert!(line.contains('\u{e059}'));
        assert!(line.contains(" (%{F#fabd2f}LP%{F#a89984})"));
    }
}
