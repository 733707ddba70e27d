//! Text widgets and buttons.

use std::fmt::Write;
use std::rc::Rc;
use std::time::Duration;

use barpyrus_core::{LoopContext, MouseButton};
use barpyrus_source::Spawner;
use tracing::warn;

use crate::painter::Painter;
use crate::widget::{Widget, WidgetBase};

/// Text passed to the bar as markup, unescaped.
#[derive(Debug, Clone)]
pub struct RawLabel {
    base: WidgetBase,
    pub text: String,
}

impl RawLabel {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(),
            text: text.into(),
        }
    }
}

impl Widget for RawLabel {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        p.draw_raw(&self.text);
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Plain text, escaped.
#[derive(Debug, Clone)]
pub struct Label {
    base: WidgetBase,
    pub text: String,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(),
            text: text.into(),
        }
    }

    pub fn with_base(mut self, base: WidgetBase) -> Self {
        self.base = base;
        self
    }
}

impl Widget for Label {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        p.text(&self.text);
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Raw markup drawn in a fixed foreground color.
#[derive(Debug, Clone)]
pub struct ColorLabel {
    base: WidgetBase,
    pub text: String,
    pub color: String,
}

impl ColorLabel {
    pub fn new(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(),
            text: text.into(),
            color: color.into(),
        }
    }
}

impl Widget for ColorLabel {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        p.fg(Some(&self.color));
        p.draw_raw(&self.text);
    }
}

/// Callback of a [`Button`].
pub type ClickHandler = Box<dyn FnMut(MouseButton, &mut LoopContext)>;

/// A label reacting to the left mouse button.
pub struct Button {
    base: WidgetBase,
    pub label: String,
    callback: Option<ClickHandler>,
}

impl std::fmt::Debug for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Button")
            .field("id", &self.base.id())
            .field("label", &self.label)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new().with_buttons(&[MouseButton::LEFT]),
            label: label.into(),
            callback: None,
        }
    }

    pub fn on_click(
        mut self,
        callback: impl FnMut(MouseButton, &mut LoopContext) + 'static,
    ) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// A button running `command` through the shell when clicked.
    pub fn exec(label: impl Into<String>, command: impl Into<String>, spawner: Rc<dyn Spawner>) -> Self {
        let command = command.into();
        Self::new(label).on_click(move |_, _| {
            if let Err(e) = spawner.spawn_shell(&command) {
                warn!(%command, error = %e, "failed to run button command");
            }
        })
    }
}

impl Widget for Button {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        p.text(&self.label);
    }

    fn on_click(&mut self, button: MouseButton, cx: &mut LoopContext) {
        if let Some(callback) = self.callback.as_mut() {
            callback(button, cx);
        }
    }

    fn is_empty(&self) -> bool {
        self.label.is_empty()
    }
}

/// The local time in a strftime format, refreshed every second.
#[derive(Debug, Clone)]
pub struct DateTime {
    base: WidgetBase,
    format: String,
    text: String,
}

impl DateTime {
    pub fn new(format: impl Into<String>) -> Self {
        let mut clock = Self {
            base: WidgetBase::new().with_timer(Duration::from_secs(1)),
            format: format.into(),
            text: String::new(),
        };
        clock.text = clock.format_now();
        clock
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn format_now(&self) -> String {
        let mut text = String::new();
        // chrono reports an invalid format through fmt::Error
        if write!(text, "{}", chrono::Local::now().format(&self.format)).is_err() {
            warn!(format = %self.format, "invalid clock format");
            return self.format.clone();
        }
        text
    }
}

impl Widget for DateTime {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        p.text(&self.text);
    }

    fn on_timeout(&mut self) -> bool {
        let text = self.format_now();
        if text == self.text {
            return false;
        }
        self.text = text;
        true
    }
}
