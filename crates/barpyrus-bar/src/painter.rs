//! Rendering widgets into one lemonbar line.
//!
//! A [`Painter`] lives for exactly one render pass. It tracks the current
//! colors and line flags so that repeated requests for the same state emit
//! nothing, and it registers a fresh click token for every clickable region
//! it opens.

use barpyrus_config::BarSettings;
use barpyrus_core::{BarError, MouseButton, Result, WidgetId};
use tracing::error;

use crate::bar::Bar;
use crate::markup::{Markup, escape};
use crate::router::{ClickTable, ClickTarget};
use crate::widget::Widget;

/// Font selection for spacing and icon glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PainterStyle {
    /// Font index used by [`Painter::symbol`]
    pub symbol_font: u8,
    /// Font index whose space glyph [`Painter::space`] repeats; pixel
    /// offsets are used when unset
    pub space_font: Option<u8>,
}

impl Default for PainterStyle {
    fn default() -> Self {
        Self {
            symbol_font: 2,
            space_font: None,
        }
    }
}

impl From<&BarSettings> for PainterStyle {
    fn from(settings: &BarSettings) -> Self {
        Self {
            symbol_font: settings.symbol_font,
            space_font: settings.space_font,
        }
    }
}

/// A rendered line and the click tokens embedded in it.
#[derive(Debug, Clone)]
pub struct Frame {
    pub line: String,
    pub clicks: ClickTable,
}

/// Emitter for one render pass.
#[derive(Debug)]
pub struct Painter {
    buf: String,
    style: PainterStyle,
    frame: u64,
    next_span: u32,
    clicks: ClickTable,
    fg: Option<String>,
    bg: Option<String>,
    line_color: Option<String>,
    underline: bool,
    overline: bool,
}

impl Painter {
    /// Start rendering frame number `frame`.
    pub fn new(frame: u64, style: PainterStyle) -> Self {
        Self {
            buf: String::new(),
            style,
            frame,
            next_span: 0,
            clicks: ClickTable::new(),
            fg: None,
            bg: None,
            line_color: None,
            underline: false,
            overline: false,
        }
    }

    /// Emit `text` unescaped; the caller guarantees it is valid markup.
    /// Line breaks still become spaces.
    pub fn draw_raw(&mut self, text: &str) {
        self.buf
            .extend(text.chars().map(|c| if matches!(c, '\n' | '\r') { ' ' } else { c }));
    }

    /// Emit `text` so that it displays literally.
    pub fn text(&mut self, text: &str) {
        self.buf.push_str(&escape(text));
    }

    fn emit(&mut self, markup: Markup<'_>) {
        use std::fmt::Write;
        // Writing into a String cannot fail
        let _ = write!(self.buf, "{markup}");
    }

    /// Set the foreground color; `None` restores the default.
    pub fn fg(&mut self, color: Option<&str>) {
        if self.fg.as_deref() != color {
            self.emit(Markup::Foreground(color));
            self.fg = color.map(str::to_string);
        }
    }

    /// Set the background color; `None` restores the default.
    pub fn bg(&mut self, color: Option<&str>) {
        if self.bg.as_deref() != color {
            self.emit(Markup::Background(color));
            self.bg = color.map(str::to_string);
        }
    }

    /// Set the color shared by underline and overline.
    pub fn line_color(&mut self, color: Option<&str>) {
        if self.line_color.as_deref() != color {
            self.emit(Markup::LineColor(color));
            self.line_color = color.map(str::to_string);
        }
    }

    pub fn set_underline(&mut self, on: bool) {
        if self.underline != on {
            self.emit(Markup::Underline(on));
            self.underline = on;
        }
    }

    pub fn set_overline(&mut self, on: bool) {
        if self.overline != on {
            self.emit(Markup::Overline(on));
            self.overline = on;
        }
    }

    /// Emit a gap of `width` space glyphs of the space font.
    pub fn space(&mut self, width: u32) {
        if width == 0 {
            return;
        }
        match self.style.space_font {
            Some(font) => {
                self.emit(Markup::Font(Some(font)));
                self.buf.extend(std::iter::repeat_n(' ', width as usize));
                self.emit(Markup::Font(None));
            }
            None => self.emit(Markup::Offset(width)),
        }
    }

    /// Emit one glyph from the symbol font.
    pub fn symbol(&mut self, glyph: char) {
        self.emit(Markup::Font(Some(self.style.symbol_font)));
        self.text(glyph.encode_utf8(&mut [0; 4]));
        self.emit(Markup::Font(None));
    }

    /// Render `widget` bracketed by its click region and theme.
    pub fn widget(&mut self, widget: &dyn Widget) {
        if widget.is_hidden() {
            return;
        }
        let base = widget.base();
        let clickable = !base.buttons().is_empty();
        if clickable {
            self.enter_clickable(base.id(), base.buttons());
        }
        if let Some(theme) = base.theme() {
            theme.begin(self);
        }
        widget.render(self);
        if let Some(theme) = base.theme() {
            theme.end(self);
        }
        if clickable {
            self.exit_clickable(base.buttons());
        }
    }

    /// Open a click region reporting `buttons` for `widget`.
    pub fn enter_clickable(&mut self, widget: WidgetId, buttons: &[MouseButton]) {
        let span = self.next_span;
        self.next_span += 1;
        for &button in buttons {
            let token = ClickTable::token(self.frame, span, button);
            self.emit(Markup::ClickStart(button, &token));
            if !self.clicks.insert(token, ClickTarget { widget, button }) {
                error!(frame = self.frame, span, %button, "duplicate click token");
            }
        }
    }

    /// Close the region opened by the matching [`Painter::enter_clickable`].
    pub fn exit_clickable(&mut self, buttons: &[MouseButton]) {
        for _ in buttons {
            self.emit(Markup::ClickEnd);
        }
    }

    /// Everything emitted so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn finish(self) -> Frame {
        Frame {
            line: self.buf,
            clicks: self.clicks,
        }
    }

    /// Send the frame to `bar` and make its click tokens current.
    pub fn flush(self, bar: &mut Bar) -> Result<()> {
        if self.frame != bar.frame() {
            return Err(BarError::internal(format!(
                "painter for frame {} flushed while bar is at frame {}",
                self.frame,
                bar.frame()
            )));
        }
        bar.present(self.finish())
    }
}
