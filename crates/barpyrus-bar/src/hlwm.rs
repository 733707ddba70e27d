//! Widgets driven by herbstluftwm hooks.
//!
//! Each widget keeps the state its hooks update in an `Rc<RefCell<_>>` (or
//! a [`Selection`]) shared with the closures registered on the
//! [`HerbstInput`]. Commands go through a shared [`WmClient`].

use std::cell::RefCell;
use std::rc::Rc;

use barpyrus_config::KeyboardLayout;
use barpyrus_core::{LoopContext, MouseButton, WidgetId};
use barpyrus_source::{HerbstInput, Spawner, TagStatus, WmClient};
use tracing::{debug, warn};

use crate::layout::{Selection, StackedLayout, Switcher};
use crate::painter::Painter;
use crate::widget::{Widget, WidgetBase};

/// Hooks after which the tag list is reloaded.
const TAG_HOOKS: [&str; 5] = [
    "tag_changed",
    "tag_flags",
    "tag_added",
    "tag_removed",
    "tag_renamed",
];

/// Colors used by the tag renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagColors {
    /// Line under/over the focused tag
    pub active: String,
    /// Background of tags shown on this monitor
    pub emphasis_bg: String,
    pub fg: String,
    pub occupied_fg: String,
    /// Foreground of unoccupied tags
    pub dim_fg: String,
    /// Line of unfocused tags
    pub line: String,
    pub urgent_bg: String,
    pub alert: String,
    pub alert_bg: String,
}

impl Default for TagColors {
    fn default() -> Self {
        Self {
            active: "#98971a".into(),
            emphasis_bg: "#98971a".into(),
            fg: "#ebdbb2".into(),
            occupied_fg: "#d5c4a1".into(),
            dim_fg: "#a89984".into(),
            line: "#504945".into(),
            urgent_bg: "#b16286".into(),
            alert: "#fe8019".into(),
            alert_bg: "#cc241d".into(),
        }
    }
}

/// Draws one tag.
pub type TagRenderer = Rc<dyn Fn(&TagStatus, &TagColors, &mut Painter)>;

/// Tag name between overlines; the focused tag's line is the active color.
pub fn default_tag(tag: &TagStatus, colors: &TagColors, p: &mut Painter) {
    if tag.is_empty() {
        return;
    }
    p.bg(tag.here().then_some(colors.emphasis_bg.as_str()));
    p.set_overline(tag.visible());
    p.fg((!tag.occupied()).then_some(colors.dim_fg.as_str()));
    if tag.urgent() {
        p.fg(Some(&colors.fg));
        p.bg(Some(&colors.urgent_bg));
        p.set_overline(false);
    }
    if tag.focused() {
        p.fg(Some(&colors.fg));
        p.line_color(Some(&colors.active));
    } else {
        p.line_color(Some(&colors.line));
    }
    p.space(4);
    p.text(&tag.name);
    p.space(4);
    p.bg(None);
    p.fg(None);
    p.line_color(None);
    p.set_overline(false);
}

/// Tag name above an underline marking visible tags.
pub fn underlined_tag(tag: &TagStatus, colors: &TagColors, p: &mut Painter) {
    if tag.is_empty() {
        return;
    }
    p.set_underline(tag.visible());
    p.fg(Some(if tag.occupied() {
        colors.occupied_fg.as_str()
    } else {
        colors.dim_fg.as_str()
    }));
    if tag.urgent() {
        p.line_color(Some(&colors.alert));
        p.fg(Some(&colors.alert));
        p.set_underline(true);
        p.bg(Some(&colors.alert_bg));
    } else if tag.here() {
        p.fg(Some(&colors.fg));
        p.line_color(Some(if tag.focused() {
            colors.active.as_str()
        } else {
            colors.fg.as_str()
        }));
        p.bg(Some(&colors.emphasis_bg));
    } else {
        p.line_color(Some(&colors.line));
    }
    p.space(3);
    p.text(&tag.name);
    p.space(3);
    p.bg(None);
    p.line_color(None);
    p.set_underline(false);
    p.fg(None);
    p.space(2);
}

/// A tag and the identity of its click region.
#[derive(Debug, Clone)]
struct TagEntry {
    id: WidgetId,
    status: TagStatus,
}

/// Update `entries` in place by index. Surviving indices keep their
/// identity; new ones get a fresh id and the tail beyond `statuses` is
/// dropped.
fn reconcile(entries: &mut Vec<TagEntry>, statuses: Vec<TagStatus>) {
    entries.truncate(statuses.len());
    for (index, status) in statuses.into_iter().enumerate() {
        match entries.get_mut(index) {
            Some(entry) => entry.status = status,
            None => entries.push(TagEntry {
                id: WidgetId::next(),
                status,
            }),
        }
    }
}

fn refresh_tags(wm: &dyn WmClient, monitor: u32, entries: &RefCell<Vec<TagEntry>>) {
    match wm.tag_status(monitor) {
        Ok(statuses) => {
            debug!(monitor, tags = statuses.len(), "tag list refreshed");
            reconcile(&mut entries.borrow_mut(), statuses);
        }
        Err(e) => warn!(monitor, error = %e, "cannot read tag status"),
    }
}

/// The tags of one monitor; clicking a tag shows it, the wheel cycles
/// through the hidden ones.
pub struct TagBar {
    base: WidgetBase,
    monitor: u32,
    wm: Rc<dyn WmClient>,
    tags: Rc<RefCell<Vec<TagEntry>>>,
    colors: TagColors,
    renderer: TagRenderer,
}

impl TagBar {
    pub fn new(wm: Rc<dyn WmClient>, hc: &mut HerbstInput, monitor: u32) -> Self {
        let mut colors = TagColors::default();
        match wm.attr("theme.tiling.active.color") {
            Ok(color) if !color.is_empty() => colors.active = color,
            Ok(_) => {}
            Err(e) => debug!(error = %e, "keeping default active tag color"),
        }

        let tags = Rc::new(RefCell::new(Vec::new()));
        refresh_tags(wm.as_ref(), monitor, &tags);
        for event in TAG_HOOKS {
            let (wm, tags) = (Rc::clone(&wm), Rc::clone(&tags));
            hc.enhook(event, move |_, _| refresh_tags(wm.as_ref(), monitor, &tags));
        }

        Self {
            base: WidgetBase::new().with_buttons(&[MouseButton::WHEEL_UP, MouseButton::WHEEL_DOWN]),
            monitor,
            wm,
            tags,
            colors,
            renderer: Rc::new(default_tag),
        }
    }

    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&TagStatus, &TagColors, &mut Painter) + 'static,
    ) -> Self {
        self.renderer = Rc::new(renderer);
        self
    }

    pub fn with_colors(mut self, colors: TagColors) -> Self {
        self.colors = colors;
        self
    }

    pub fn colors(&self) -> &TagColors {
        &self.colors
    }

    pub fn statuses(&self) -> Vec<TagStatus> {
        self.tags.borrow().iter().map(|t| t.status.clone()).collect()
    }

    /// Click identities of the tags, by index.
    pub fn tag_ids(&self) -> Vec<WidgetId> {
        self.tags.borrow().iter().map(|t| t.id).collect()
    }

    fn run(&self, args: &[&str]) {
        if let Err(e) = self.wm.call(args) {
            warn!(?args, error = %e, "window manager command failed");
        }
    }

    fn tag_clicked(&self, index: usize) {
        let (monitor, index) = (self.monitor.to_string(), index.to_string());
        self.run(&[
            "chain",
            ",",
            "focus_monitor",
            monitor.as_str(),
            ",",
            "use_index",
            index.as_str(),
        ]);
    }
}

impl Widget for TagBar {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        for tag in self.tags.borrow().iter() {
            if tag.status.is_empty() {
                continue;
            }
            p.enter_clickable(tag.id, &[MouseButton::LEFT]);
            (self.renderer)(&tag.status, &self.colors, p);
            p.exit_clickable(&[MouseButton::LEFT]);
        }
    }

    fn on_click(&mut self, button: MouseButton, _cx: &mut LoopContext) {
        if !button.is_wheel() {
            return;
        }
        let delta = if button == MouseButton::WHEEL_UP { -1 } else { 1 };
        let (monitor, delta) = (self.monitor.to_string(), format!("{delta:+}"));
        self.run(&[
            "chain",
            ",",
            "focus_monitor",
            monitor.as_str(),
            ",",
            "use_index",
            delta.as_str(),
            "--skip-visible",
        ]);
    }

    fn can_handle_input(
        &mut self,
        target: WidgetId,
        button: MouseButton,
        cx: &mut LoopContext,
    ) -> bool {
        let index = self.tags.borrow().iter().position(|t| t.id == target);
        if let Some(index) = index {
            self.tag_clicked(index);
            return true;
        }
        if target == self.id() {
            self.on_click(button, cx);
            return true;
        }
        false
    }
}

#[derive(Debug, Default)]
struct TitleState {
    title: String,
    maxlen: Option<usize>,
}

impl TitleState {
    fn label(&self) -> String {
        match self.maxlen {
            Some(max) if self.title.chars().count() > max => {
                let mut label: String = self.title.chars().take(max.saturating_sub(1)).collect();
                label.push('…');
                label
            }
            _ => self.title.clone(),
        }
    }

    /// Wheel down shortens the title, wheel up lengthens it until it is
    /// shown in full.
    fn scroll(&mut self, button: MouseButton) {
        let len = self.title.chars().count();
        let mut max = match self.maxlen {
            Some(max) if max <= len => max,
            _ => len,
        };
        if button == MouseButton::WHEEL_DOWN {
            max = max.saturating_sub(1).max(1);
        } else if button == MouseButton::WHEEL_UP {
            max += 1;
        }
        self.maxlen = (max <= len).then_some(max);
    }
}

/// Title of the focused window.
pub struct WindowTitle {
    base: WidgetBase,
    state: Rc<RefCell<TitleState>>,
}

impl WindowTitle {
    pub fn new(wm: &dyn WmClient, hc: &mut HerbstInput, maxlen: Option<usize>) -> Self {
        let title = wm.call(&["attr", "clients.focus.title"]).unwrap_or_default();
        let state = Rc::new(RefCell::new(TitleState { title, maxlen }));
        for event in ["focus_changed", "window_title_changed"] {
            let state = Rc::clone(&state);
            hc.enhook(event, move |args, _| {
                state.borrow_mut().title = args.get(1).cloned().unwrap_or_default();
            });
        }
        Self {
            base: WidgetBase::new().with_buttons(&[MouseButton::WHEEL_UP, MouseButton::WHEEL_DOWN]),
            state,
        }
    }

    pub fn with_base(mut self, base: WidgetBase) -> Self {
        self.base = base;
        self
    }

    /// The text currently displayed.
    pub fn label(&self) -> String {
        self.state.borrow().label()
    }
}

impl Widget for WindowTitle {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        p.text(&self.label());
    }

    fn on_click(&mut self, button: MouseButton, _cx: &mut LoopContext) {
        self.state.borrow_mut().scroll(button);
    }

    fn is_empty(&self) -> bool {
        self.state.borrow().title.is_empty()
    }

    fn is_hidden(&self) -> bool {
        self.is_empty()
    }
}

/// A [`Switcher`] over keyboard layouts.
///
/// A click announces the layout with the `keyboard_layout` hook and applies
/// it by running `command` followed by the layout's arguments. The hook,
/// whoever emits it, moves the selection.
pub fn keyboard_layout_switcher(
    wm: Rc<dyn WmClient>,
    hc: &mut HerbstInput,
    layouts: &[KeyboardLayout],
    command: &[String],
    spawner: Rc<dyn Spawner>,
) -> Switcher {
    let names: Vec<String> = layouts.iter().map(|l| l.name.clone()).collect();
    let switcher = Switcher::new(layouts.iter().map(|l| l.label.clone()), 0);

    let selection: Selection = switcher.selection();
    hc.enhook("keyboard_layout", move |args, _| {
        let Some(name) = args.first() else {
            return;
        };
        match names.iter().position(|n| n == name) {
            Some(index) => selection.set(index),
            None => debug!(%name, "keyboard layout not offered by the switcher"),
        }
    });

    let layouts = layouts.to_vec();
    let command = command.to_vec();
    switcher.on_switch(move |index, _, _| {
        let Some(layout) = layouts.get(index) else {
            return;
        };
        if let Err(e) = wm.emit_hook(&["keyboard_layout", layout.name.as_str()]) {
            warn!(layout = %layout.name, error = %e, "cannot announce keyboard layout");
        }
        let argv: Vec<String> = command.iter().chain(&layout.args).cloned().collect();
        if let Err(e) = spawner.spawn(&argv) {
            warn!(layout = %layout.name, error = %e, "cannot apply keyboard layout");
        }
    })
}

/// A strict [`StackedLayout`] showing `active` while `monitor` has the
/// focus and `passive` otherwise, even when that one is empty.
pub fn monitor_focus_layout(
    wm: &dyn WmClient,
    hc: &mut HerbstInput,
    monitor: u32,
    active: Box<dyn Widget>,
    passive: Box<dyn Widget>,
) -> StackedLayout {
    let focused = match wm.attr("monitors.focus.index").map(|s| s.parse::<u32>()) {
        Ok(Ok(index)) => index,
        Ok(Err(e)) => {
            warn!(error = %e, "unexpected focused monitor index");
            0
        }
        Err(e) => {
            warn!(error = %e, "cannot read focused monitor");
            0
        }
    };
    let layout =
        StackedLayout::new(vec![passive, active], usize::from(focused == monitor)).strict();
    let selection = layout.selection();
    hc.enhook("tag_changed", move |args, _| {
        if let Some(Ok(focused)) = args.get(1).map(|s| s.parse::<u32>()) {
            selection.set(usize::from(focused == monitor));
        }
    });
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::painter::PainterStyle;
    use crate::widget::render_line;
    use barpyrus_source::herbstluft::TagState;
    use barpyrus_source::testing::{FakeWm, RecordingSpawner, Script};
    use proptest::prelude::*;

    fn statuses(names: &[String]) -> Vec<TagStatus> {
        names
            .iter()
            .map(|name| TagStatus {
                name: name.clone(),
                state: TagState::Hidden,
            })
            .collect()
    }

    proptest! {
        #[test]
        fn test_reconcile_preserves_surviving_ids(
            before in prop::collection::vec("[a-z]{1,4}", 0..12),
            after in prop::collection::vec("[a-z]{1,4}", 0..12),
        ) {
            let mut entries = Vec::new();
            reconcile(&mut entries, statuses(&before));
            let old: Vec<WidgetId> = entries.iter().map(|e| e.id).collect();

            reconcile(&mut entries, statuses(&after));
            prop_assert_eq!(entries.len(), after.len());
            let kept = before.len().min(after.len());
            for (index, entry) in entries.iter().enumerate() {
                prop_assert_eq!(&entry.status.name, &after[index]);
                if index < kept {
                    prop_assert_eq!(entry.id, old[index]);
                } else {
                    prop_assert!(!old.contains(&entry.id));
                }
            }
        }
    }

    fn herbst() -> (Script, HerbstInput) {
        let script = Script::new();
        let hc = HerbstInput::new(script.source("herbstclient"));
        (script, hc)
    }

    fn tags(wm: &FakeWm, monitor: &str, status: &str) {
        wm.respond(&format!("tag_status {monitor}"), status);
    }

    #[test]
    fn test_reconcile_keeps_identity_by_index() {
        let wm = Rc::new(FakeWm::new());
        tags(&wm, "0", "\t#1\t:2\t.3\t");
        let (_script, mut hc) = herbst();
        let bar = TagBar::new(wm.clone(), &mut hc, 0);
        let before = bar.tag_ids();
        assert_eq!(before.len(), 3);

        tags(&wm, "0", "\t:1\t#2\t.3\t.4\t");
        hc.dispatch("tag_added\t4", &mut LoopContext::new());
        let grown = bar.tag_ids();
        assert_eq!(&grown[..3], &before[..]);
        assert_eq!(grown.len(), 4);
        assert!(bar.statuses()[1].focused());

        tags(&wm, "0", "\t#1\t");
        hc.dispatch("tag_removed\t2", &mut LoopContext::new());
        assert_eq!(bar.tag_ids(), vec![before[0]]);
    }

    #[test]
    fn test_tag_bar_uses_active_color() {
        let wm = Rc::new(FakeWm::new());
        wm.respond("attr theme.tiling.active.color", "#123456\n");
        let (_script, mut hc) = herbst();
        let bar = TagBar::new(wm.clone(), &mut hc, 1);
        assert_eq!(bar.colors().active, "#123456");
        assert_eq!(wm.calls(), vec!["attr theme.tiling.active.color", "tag_status 1"]);
    }

    #[test]
    fn test_tag_click_and_wheel_commands() {
        let wm = Rc::new(FakeWm::new());
        tags(&wm, "1", "#a\t:b");
        let (_script, mut hc) = herbst();
        let mut bar = TagBar::new(wm.clone(), &mut hc, 1);
        let mut cx = LoopContext::new();

        let second = bar.tag_ids()[1];
        assert!(bar.can_handle_input(second, MouseButton::LEFT, &mut cx));
        let own = bar.id();
        bar.can_handle_input(own, MouseButton::WHEEL_UP, &mut cx);
        bar.can_handle_input(own, MouseButton::WHEEL_DOWN, &mut cx);

        let calls = wm.calls();
        assert_eq!(
            &calls[calls.len() - 3..],
            [
                "chain , focus_monitor 1 , use_index 1",
                "chain , focus_monitor 1 , use_index -1 --skip-visible",
                "chain , focus_monitor 1 , use_index +1 --skip-visible",
            ]
        );
    }

    #[test]
    fn test_tag_bar_render_skips_empty_tags() {
        let wm = Rc::new(FakeWm::new());
        tags(&wm, "0", "#a\t.b\t:c");
        let (_script, mut hc) = herbst();
        let bar = TagBar::new(wm.clone(), &mut hc, 0).with_renderer(|tag, _, p| p.text(&tag.name));
        let line = render_line(&bar, PainterStyle::default());
        assert_eq!(
            line,
            "%{A4:0_0_4:}%{A5:0_0_5:}%{A1:0_1_1:}a%{A}%{A1:0_2_1:}c%{A}%{A}%{A}"
        );
    }

    #[test]
    fn test_default_tag_renderer() {
        let colors = TagColors::default();
        let tag = TagStatus {
            name: "web".into(),
            state: barpyrus_source::herbstluft::TagState::FocusedHere,
        };
        let mut p = Painter::new(0, PainterStyle::default());
        default_tag(&tag, &colors, &mut p);
        assert_eq!(
            p.as_str(),
            "%{B#98971a}%{+o}%{F#ebdbb2}%{U#98971a}%{O4}web%{O4}%{B-}%{F-}%{U-}%{-o}"
        );
    }

    #[test]
    fn test_window_title_follows_hooks() {
        let wm = FakeWm::new();
        wm.respond("attr clients.focus.title", "vim");
        let (_script, mut hc) = herbst();
        let title = WindowTitle::new(&wm, &mut hc, None);
        assert_eq!(title.label(), "vim");

        let mut cx = LoopContext::new();
        hc.dispatch("window_title_changed\t0x1\tmutt", &mut cx);
        assert_eq!(title.label(), "mutt");
        hc.dispatch("focus_changed\t0x0", &mut cx);
        assert!(title.is_hidden());
        assert_eq!(render_line(&title, PainterStyle::default()), "");
    }

    #[test]
    fn test_window_title_wheel_ellipsises() {
        let mut state = TitleState {
            title: "abcdef".into(),
            maxlen: None,
        };
        state.scroll(MouseButton::WHEEL_DOWN);
        assert_eq!(state.maxlen, Some(5));
        assert_eq!(state.label(), "abcd…");
        state.scroll(MouseButton::WHEEL_UP);
        assert_eq!(state.maxlen, Some(6));
        assert_eq!(state.label(), "abcdef");
        state.scroll(MouseButton::WHEEL_UP);
        assert_eq!(state.maxlen, None);

        state.maxlen = Some(1);
        state.scroll(MouseButton::WHEEL_DOWN);
        assert_eq!(state.maxlen, Some(1));
        assert_eq!(state.label(), "…");
    }

    #[test]
    fn test_keyboard_layout_switcher() {
        let wm = Rc::new(FakeWm::new());
        let spawner = Rc::new(RecordingSpawner::new());
        let (_script, mut hc) = herbst();
        let layouts = vec![
            KeyboardLayout {
                name: "us".into(),
                label: "US".into(),
                args: vec!["us".into()],
            },
            KeyboardLayout {
                name: "de".into(),
                label: "DE".into(),
                args: vec!["de".into(), "-variant".into(), "nodeadkeys".into()],
            },
        ];
        let mut switcher = keyboard_layout_switcher(
            wm.clone(),
            &mut hc,
            &layouts,
            &["setxkbmap".to_string()],
            spawner.clone(),
        );
        let ids = switcher.choice_ids();
        let mut cx = LoopContext::new();

        assert!(switcher.can_handle_input(ids[1], MouseButton::LEFT, &mut cx));
        assert_eq!(wm.calls(), vec!["emit_hook keyboard_layout de"]);
        assert_eq!(
            spawner.spawned(),
            vec![vec!["setxkbmap", "de", "-variant", "nodeadkeys"]]
        );
        // selection follows the hook, not the click
        assert_eq!(switcher.selection().get(), 0);
        hc.dispatch("keyboard_layout\tde", &mut cx);
        assert_eq!(switcher.selection().get(), 1);
    }

    #[test]
    fn test_monitor_focus_layout() {
        use crate::label::Label;

        let wm = FakeWm::new();
        wm.respond("attr monitors.focus.index", "1");
        let (_script, mut hc) = herbst();
        let layout = monitor_focus_layout(
            &wm,
            &mut hc,
            1,
            Box::new(Label::new("active")),
            Box::new(Label::new("passive")),
        );
        assert_eq!(render_line(&layout, PainterStyle::default()), "active");

        hc.dispatch("tag_changed\tweb\t0", &mut LoopContext::new());
        assert_eq!(render_line(&layout, PainterStyle::default()), "passive");
    }
}
