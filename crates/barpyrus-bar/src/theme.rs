//! Decorations drawn around a widget.

use barpyrus_config::FrameSettings;

use crate::painter::Painter;

/// Colors and padding applied around a widget by [`Painter::widget`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Theme {
    pub fg: Option<String>,
    pub bg: Option<String>,
    /// Under/overline color
    pub line: Option<String>,
    pub padding_left: u32,
    pub padding_right: u32,
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fg(mut self, color: impl Into<String>) -> Self {
        self.fg = Some(color.into());
        self
    }

    pub fn with_bg(mut self, color: impl Into<String>) -> Self {
        self.bg = Some(color.into());
        self
    }

    pub fn with_line(mut self, color: impl Into<String>) -> Self {
        self.line = Some(color.into());
        self
    }

    pub fn with_padding(mut self, left: u32, right: u32) -> Self {
        self.padding_left = left;
        self.padding_right = right;
        self
    }

    pub(crate) fn begin(&self, p: &mut Painter) {
        if let Some(fg) = &self.fg {
            p.fg(Some(fg));
        }
        if let Some(bg) = &self.bg {
            p.bg(Some(bg));
        }
        if let Some(line) = &self.line {
            p.line_color(Some(line));
        }
        p.space(self.padding_left);
    }

    /// Pad and reset exactly the colors [`Theme::begin`] set.
    pub(crate) fn end(&self, p: &mut Painter) {
        p.space(self.padding_right);
        if self.line.is_some() {
            p.line_color(None);
        }
        if self.bg.is_some() {
            p.bg(None);
        }
        if self.fg.is_some() {
            p.fg(None);
        }
    }
}

impl From<&FrameSettings> for Theme {
    fn from(frame: &FrameSettings) -> Self {
        Self {
            fg: frame.fg.clone(),
            bg: frame.bg.clone(),
            line: None,
            padding_left: frame.padding_left,
            padding_right: frame.padding_right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::painter::PainterStyle;

    #[test]
    fn test_begin_end_resets_what_it_set() {
        let theme = Theme::new().with_bg("#303030").with_padding(3, 1);
        let mut p = Painter::new(1, PainterStyle::default());
        theme.begin(&mut p);
        p.text("x");
        theme.end(&mut p);
        assert_eq!(p.as_str(), "%{B#303030}%{O3}x%{O1}%{B-}");
    }

    #[test]
    fn test_from_frame_settings() {
        let theme = Theme::from(&FrameSettings::default());
        assert_eq!(theme.bg.as_deref(), Some("#303030"));
        assert_eq!(theme.padding_left, 3);
        assert!(theme.line.is_none());
    }
}
