//! The lemonbar markup dialect.
//!
//! Control sequences have the form `%{...}`; a literal `%` must be written
//! as `%%`. lemonbar reads one frame per line, so text never carries a
//! line break.

use std::fmt;

use barpyrus_core::MouseButton;

/// One lemonbar control sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup<'a> {
    /// `%{F#c}` / `%{F-}`
    Foreground(Option<&'a str>),
    /// `%{B#c}` / `%{B-}`
    Background(Option<&'a str>),
    /// `%{U#c}` / `%{U-}`, shared by underline and overline
    LineColor(Option<&'a str>),
    /// `%{+u}` / `%{-u}`
    Underline(bool),
    /// `%{+o}` / `%{-o}`
    Overline(bool),
    /// `%{Tn}` / `%{T-}`
    Font(Option<u8>),
    /// `%{On}`, a gap of n pixels
    Offset(u32),
    /// `%{An:token:}`
    ClickStart(MouseButton, &'a str),
    /// `%{A}`
    ClickEnd,
}

impl fmt::Display for Markup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn color(f: &mut fmt::Formatter<'_>, tag: char, c: Option<&str>) -> fmt::Result {
            write!(f, "%{{{tag}{}}}", c.unwrap_or("-"))
        }
        fn flag(f: &mut fmt::Formatter<'_>, tag: char, on: bool) -> fmt::Result {
            write!(f, "%{{{}{tag}}}", if on { '+' } else { '-' })
        }
        match *self {
            Self::Foreground(c) => color(f, 'F', c),
            Self::Background(c) => color(f, 'B', c),
            Self::LineColor(c) => color(f, 'U', c),
            Self::Underline(on) => flag(f, 'u', on),
            Self::Overline(on) => flag(f, 'o', on),
            Self::Font(Some(n)) => write!(f, "%{{T{n}}}"),
            Self::Font(None) => f.write_str("%{T-}"),
            Self::Offset(px) => write!(f, "%{{O{px}}}"),
            Self::ClickStart(button, token) => write!(f, "%{{A{button}:{token}:}}"),
            Self::ClickEnd => f.write_str("%{A}"),
        }
    }
}

/// Escape `text` so lemonbar displays it literally on the current line.
///
/// `%` is doubled and line breaks become spaces.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' => out.push_str("%%"),
            '\n' | '\r' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}
