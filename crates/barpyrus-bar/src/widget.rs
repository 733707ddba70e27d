//! The widget trait and the state every widget shares.
//!
//! Widgets form a tree. Composite widgets expose their children through the
//! visitor methods [`Widget::for_each_child`] and
//! [`Widget::for_each_child_mut`]; timer checks, deadline queries, input
//! collection and click routing are provided on top of them and recurse
//! through the whole subtree.

use std::time::{Duration, Instant};

use barpyrus_core::{LoopContext, MouseButton, WidgetId};
use barpyrus_source::EventInput;

use crate::painter::{Painter, PainterStyle};
use crate::theme::Theme;

/// Identity, timer, click buttons and theme of one widget.
#[derive(Debug, Clone)]
pub struct WidgetBase {
    id: WidgetId,
    created: Instant,
    timer_interval: Option<Duration>,
    last_timeout: Option<Instant>,
    buttons: Vec<MouseButton>,
    theme: Option<Theme>,
}

impl Default for WidgetBase {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetBase {
    pub fn new() -> Self {
        Self {
            id: WidgetId::next(),
            created: Instant::now(),
            timer_interval: None,
            last_timeout: None,
            buttons: Vec::new(),
            theme: None,
        }
    }

    /// Fire [`Widget::on_timeout`] every `interval`.
    pub fn with_timer(mut self, interval: Duration) -> Self {
        self.timer_interval = Some(interval);
        self
    }

    /// React to clicks of `buttons`.
    pub fn with_buttons(mut self, buttons: &[MouseButton]) -> Self {
        self.buttons = buttons.to_vec();
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn buttons(&self) -> &[MouseButton] {
        &self.buttons
    }

    pub fn theme(&self) -> Option<&Theme> {
        self.theme.as_ref()
    }

    pub fn set_theme(&mut self, theme: Option<Theme>) {
        self.theme = theme;
    }

    /// When this widget's own timer fires next.
    ///
    /// A timer that never fired is due immediately.
    pub fn deadline(&self) -> Option<Instant> {
        let interval = self.timer_interval?;
        Some(match self.last_timeout {
            Some(last) => last + interval,
            None => self.created,
        })
    }

    /// Returns true and records `now` if the timer is due.
    fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if deadline <= now => {
                self.last_timeout = Some(now);
                true
            }
            _ => false,
        }
    }
}

/// A node of the render tree.
pub trait Widget {
    fn base(&self) -> &WidgetBase;

    fn base_mut(&mut self) -> &mut WidgetBase;

    /// Emit this widget's content. Children are drawn with
    /// [`Painter::widget`].
    fn render(&self, p: &mut Painter);

    /// Called when the widget's timer is due. Returns true if the displayed
    /// state changed.
    fn on_timeout(&mut self) -> bool {
        false
    }

    /// Called when one of the widget's own click regions was clicked.
    fn on_click(&mut self, _button: MouseButton, _cx: &mut LoopContext) {}

    /// Layouts skip empty widgets when looking for something to show.
    fn is_empty(&self) -> bool {
        false
    }

    /// Hidden widgets draw nothing, not even their theme or click region.
    fn is_hidden(&self) -> bool {
        false
    }

    fn for_each_child(&self, _f: &mut dyn FnMut(&dyn Widget)) {}

    fn for_each_child_mut(&mut self, _f: &mut dyn FnMut(&mut dyn Widget)) {}

    /// Visit the inputs this widget itself owns (not those of its children).
    fn own_inputs(&mut self, _f: &mut dyn FnMut(&mut dyn EventInput)) {}

    fn id(&self) -> WidgetId {
        self.base().id()
    }

    /// Fire due timers in the whole subtree. Returns true if any handler
    /// reported a change.
    fn maybe_timeout(&mut self, now: Instant) -> bool {
        let mut changed = false;
        self.for_each_child_mut(&mut |child| changed |= child.maybe_timeout(now));
        if self.base_mut().take_due(now) {
            changed |= self.on_timeout();
        }
        changed
    }

    /// Earliest timer deadline in the subtree.
    fn next_timeout(&self) -> Option<Instant> {
        let mut next = self.base().deadline();
        self.for_each_child(&mut |child| {
            if let Some(deadline) = child.next_timeout() {
                next = Some(next.map_or(deadline, |n| n.min(deadline)));
            }
        });
        next
    }

    /// Visit every input owned anywhere in the subtree.
    fn event_inputs(&mut self, f: &mut dyn FnMut(&mut dyn EventInput)) {
        self.own_inputs(f);
        self.for_each_child_mut(&mut |child| child.event_inputs(f));
    }

    /// Deliver a click aimed at `target`, children first. Stops at the first
    /// widget that handles it.
    fn can_handle_input(
        &mut self,
        target: WidgetId,
        button: MouseButton,
        cx: &mut LoopContext,
    ) -> bool {
        let mut handled = false;
        self.for_each_child_mut(&mut |child| {
            if !handled {
                handled = child.can_handle_input(target, button, cx);
            }
        });
        if handled {
            return true;
        }
        if self.id() == target {
            self.on_click(button, cx);
            return true;
        }
        false
    }
}

/// Render `root` into a standalone line, without click routing.
pub fn render_line(root: &dyn Widget, style: PainterStyle) -> String {
    let mut p = Painter::new(0, style);
    p.widget(root);
    p.finish().line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Minimal composite used to exercise the provided methods.
    struct Node {
        base: WidgetBase,
        children: Vec<Node>,
        fired: Rc<Cell<u32>>,
        clicks: Rc<Cell<u32>>,
        changes: bool,
    }

    impl Node {
        fn new(base: WidgetBase, children: Vec<Node>) -> Self {
            Self {
                base,
                children,
                fired: Rc::new(Cell::new(0)),
                clicks: Rc::new(Cell::new(0)),
                changes: true,
            }
        }
    }

    impl Widget for Node {
        fn base(&self) -> &WidgetBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut WidgetBase {
            &mut self.base
        }
        fn render(&self, p: &mut Painter) {
            p.text("n");
            for child in &self.children {
                p.widget(child);
            }
        }
        fn on_timeout(&mut self) -> bool {
            self.fired.set(self.fired.get() + 1);
            self.changes
        }
        fn on_click(&mut self, _button: MouseButton, _cx: &mut LoopContext) {
            self.clicks.set(self.clicks.get() + 1);
        }
        fn for_each_child(&self, f: &mut dyn FnMut(&dyn Widget)) {
            for child in &self.children {
                f(child);
            }
        }
        fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Widget)) {
            for child in &mut self.children {
                f(child);
            }
        }
    }

    #[test]
    fn test_next_timeout_is_subtree_minimum() {
        let now = Instant::now();
        let mut fast = Node::new(WidgetBase::new().with_timer(Duration::from_secs(1)), vec![]);
        let mut slow = Node::new(WidgetBase::new().with_timer(Duration::from_secs(30)), vec![]);
        let mut idle = Node::new(WidgetBase::new(), vec![]);
        fast.base.last_timeout = Some(now + Duration::from_secs(5));
        slow.base.last_timeout = Some(now);
        idle.base.last_timeout = Some(now);

        let nested = Node::new(WidgetBase::new(), vec![fast]);
        let root = Node::new(
            WidgetBase::new().with_timer(Duration::from_secs(60)),
            vec![slow, nested, idle],
        );
        // root never fired: its deadline is its creation time, the earliest
        assert_eq!(root.next_timeout(), root.base.deadline());

        let mut root = root;
        root.base.last_timeout = Some(now);
        assert_eq!(root.next_timeout(), Some(now + Duration::from_secs(6)));
    }

    #[test]
    fn test_next_timeout_none_without_timers() {
        let root = Node::new(WidgetBase::new(), vec![Node::new(WidgetBase::new(), vec![])]);
        assert_eq!(root.next_timeout(), None);
    }

    #[test]
    fn test_maybe_timeout_reaches_children() {
        let mut quiet = Node::new(WidgetBase::new().with_timer(Duration::from_secs(1)), vec![]);
        quiet.changes = false;
        let quiet_fired = Rc::clone(&quiet.fired);
        let loud = Node::new(WidgetBase::new().with_timer(Duration::from_secs(1)), vec![]);
        let loud_fired = Rc::clone(&loud.fired);
        let mut root = Node::new(WidgetBase::new(), vec![quiet, loud]);

        let now = Instant::now();
        assert!(root.maybe_timeout(now));
        assert_eq!((quiet_fired.get(), loud_fired.get()), (1, 1));

        // not due again until a full interval has passed
        assert!(!root.maybe_timeout(now + Duration::from_millis(500)));
        assert_eq!(loud_fired.get(), 1);
        assert!(root.maybe_timeout(now + Duration::from_secs(1)));
        assert_eq!(loud_fired.get(), 2);
        assert_eq!(root.fired.get(), 0);
    }

    #[test]
    fn test_click_handled_once_children_first() {
        let leaf = Node::new(WidgetBase::new().with_buttons(&[MouseButton::LEFT]), vec![]);
        let leaf_id = leaf.id();
        let leaf_clicks = Rc::clone(&leaf.clicks);
        let mut root = Node::new(WidgetBase::new().with_buttons(&[MouseButton::LEFT]), vec![leaf]);
        let root_clicks = Rc::clone(&root.clicks);
        let mut cx = LoopContext::new();

        assert!(root.can_handle_input(leaf_id, MouseButton::LEFT, &mut cx));
        assert_eq!((leaf_clicks.get(), root_clicks.get()), (1, 0));

        let root_id = root.id();
        assert!(root.can_handle_input(root_id, MouseButton::LEFT, &mut cx));
        assert_eq!(root_clicks.get(), 1);

        assert!(!root.can_handle_input(WidgetId::next(), MouseButton::LEFT, &mut cx));
    }

    #[test]
    fn test_render_line_brackets_clickable_children() {
        let leaf = Node::new(WidgetBase::new().with_buttons(&[MouseButton::LEFT]), vec![]);
        let root = Node::new(
            WidgetBase::new().with_theme(Theme::new().with_fg("#fff")),
            vec![leaf],
        );
        let line = render_line(&root, Default::default());
        assert_eq!(line, "%{F#fff}n%{A1:0_0_1:}n%{A}%{F-}");
    }
}
