//! Composite widgets: side-by-side lists and switching between children.

use std::cell::Cell;
use std::rc::Rc;

use barpyrus_core::{LoopContext, MouseButton, WidgetId};
use tracing::debug;

use crate::label::Button;
use crate::painter::Painter;
use crate::widget::{Widget, WidgetBase};

/// Children drawn one after another.
pub struct ListLayout {
    base: WidgetBase,
    children: Vec<Box<dyn Widget>>,
}

impl ListLayout {
    pub fn new(children: Vec<Box<dyn Widget>>) -> Self {
        Self {
            base: WidgetBase::new(),
            children,
        }
    }

    pub fn with_base(mut self, base: WidgetBase) -> Self {
        self.base = base;
        self
    }

    pub fn push(&mut self, child: Box<dyn Widget>) {
        self.children.push(child);
    }
}

impl Widget for ListLayout {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        for child in &self.children {
            p.widget(child.as_ref());
        }
    }

    fn is_empty(&self) -> bool {
        self.children.iter().all(|c| c.is_empty())
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&dyn Widget)) {
        for child in &self.children {
            f(child.as_ref());
        }
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Widget)) {
        for child in &mut self.children {
            f(child.as_mut());
        }
    }
}

/// A selection index shared between a layout and the hooks driving it.
#[derive(Debug, Clone, Default)]
pub struct Selection(Rc<Cell<usize>>);

impl Selection {
    pub fn new(index: usize) -> Self {
        Self(Rc::new(Cell::new(index)))
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    pub fn set(&self, index: usize) {
        self.0.set(index);
    }
}

/// Colors of a [`Switcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitcherColors {
    pub normal_fg: String,
    pub normal_bg: String,
    pub focus_fg: String,
    pub focus_bg: String,
}

impl Default for SwitcherColors {
    fn default() -> Self {
        Self {
            normal_fg: "#ffffff".into(),
            normal_bg: "#303030".into(),
            focus_fg: "#000000".into(),
            focus_bg: "#9fbc00".into(),
        }
    }
}

/// Called with the index of the clicked choice.
pub type SwitchHandler = Box<dyn FnMut(usize, &Selection, &mut LoopContext)>;

/// A row of choices with one of them highlighted.
pub struct Switcher {
    base: WidgetBase,
    choices: Vec<Button>,
    selection: Selection,
    colors: SwitcherColors,
    handler: SwitchHandler,
}

impl Switcher {
    /// A switcher whose clicks select the clicked choice.
    pub fn new<S: Into<String>>(choices: impl IntoIterator<Item = S>, selection: usize) -> Self {
        Self {
            base: WidgetBase::new(),
            choices: choices.into_iter().map(Button::new).collect(),
            selection: Selection::new(selection),
            colors: SwitcherColors::default(),
            handler: Box::new(|index, selection, _| selection.set(index)),
        }
    }

    /// Replace what happens on a click. The handler decides whether the
    /// selection changes.
    pub fn on_switch(
        mut self,
        handler: impl FnMut(usize, &Selection, &mut LoopContext) + 'static,
    ) -> Self {
        self.handler = Box::new(handler);
        self
    }

    pub fn with_colors(mut self, colors: SwitcherColors) -> Self {
        self.colors = colors;
        self
    }

    /// Handle for updating the selection from outside.
    pub fn selection(&self) -> Selection {
        self.selection.clone()
    }

    pub fn choice_ids(&self) -> Vec<WidgetId> {
        self.choices.iter().map(|c| c.id()).collect()
    }
}

impl Widget for Switcher {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        let c = &self.colors;
        let selected = self.selection.get();
        p.fg(Some(&c.normal_fg));
        p.bg(Some(&c.normal_bg));
        p.line_color(Some(&c.normal_bg));
        p.set_overline(true);
        p.set_underline(true);
        p.space(3);
        for (i, choice) in self.choices.iter().enumerate() {
            if i == selected {
                p.fg(Some(&c.focus_fg));
                p.bg(Some(&c.focus_bg));
            }
            p.space(3);
            p.widget(choice);
            p.space(3);
            if i == selected {
                p.fg(Some(&c.normal_fg));
                p.bg(Some(&c.normal_bg));
            }
        }
        p.space(3);
        p.bg(None);
        p.fg(None);
        p.line_color(None);
        p.set_overline(false);
        p.set_underline(false);
    }

    fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&dyn Widget)) {
        for choice in &self.choices {
            f(choice);
        }
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Widget)) {
        for choice in &mut self.choices {
            f(choice);
        }
    }

    fn can_handle_input(
        &mut self,
        target: WidgetId,
        _button: MouseButton,
        cx: &mut LoopContext,
    ) -> bool {
        let Some(index) = self.choices.iter().position(|c| c.id() == target) else {
            return false;
        };
        debug!(index, "switcher choice clicked");
        (self.handler)(index, &self.selection, cx);
        true
    }
}

/// Shows one of its children at a time.
pub struct StackedLayout {
    base: WidgetBase,
    children: Vec<Box<dyn Widget>>,
    selection: Selection,
    find_nonempty: bool,
}

impl StackedLayout {
    /// If the selected child is empty, the next non-empty one is shown.
    pub fn new(children: Vec<Box<dyn Widget>>, selection: usize) -> Self {
        Self {
            base: WidgetBase::new(),
            children,
            selection: Selection::new(selection),
            find_nonempty: true,
        }
    }

    /// Always show the selected child, empty or not.
    pub fn strict(mut self) -> Self {
        self.find_nonempty = false;
        self
    }

    pub fn selection(&self) -> Selection {
        self.selection.clone()
    }

    /// Index of the child on display.
    ///
    /// Probes at most once per child starting at the selection and falls
    /// back to the selection when every child is empty.
    pub fn shown(&self) -> Option<usize> {
        let count = self.children.len();
        if count == 0 {
            return None;
        }
        let selected = self.selection.get() % count;
        if !self.find_nonempty {
            return Some(selected);
        }
        let found = (0..count)
            .map(|i| (selected + i) % count)
            .find(|&i| !self.children[i].is_empty());
        Some(found.unwrap_or(selected))
    }
}

impl Widget for StackedLayout {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        if let Some(index) = self.shown() {
            p.widget(self.children[index].as_ref());
        }
    }

    fn is_empty(&self) -> bool {
        self.shown().is_none_or(|i| self.children[i].is_empty())
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&dyn Widget)) {
        for child in &self.children {
            f(child.as_ref());
        }
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Widget)) {
        for child in &mut self.children {
            f(child.as_mut());
        }
    }

    /// Clicks can only come from the child on display.
    fn can_handle_input(
        &mut self,
        target: WidgetId,
        button: MouseButton,
        cx: &mut LoopContext,
    ) -> bool {
        match self.shown() {
            Some(index) => self.children[index].can_handle_input(target, button, cx),
            None => false,
        }
    }
}

/// A [`StackedLayout`] preceded by a title label; clicking the label
/// switches to the next tab.
pub struct TabbedLayout {
    base: WidgetBase,
    titles: Vec<String>,
    label: Button,
    stack: StackedLayout,
}

impl TabbedLayout {
    pub fn new(tabs: Vec<(String, Box<dyn Widget>)>, selection: usize) -> Self {
        let (titles, children): (Vec<String>, Vec<Box<dyn Widget>>) = tabs.into_iter().unzip();
        let selection = if titles.is_empty() {
            0
        } else {
            selection % titles.len()
        };
        let label = Button::new(titles.get(selection).cloned().unwrap_or_default());
        Self {
            base: WidgetBase::new(),
            titles,
            label,
            stack: StackedLayout::new(children, selection),
        }
    }

    /// Toggle between a short and a long rendition of the same content.
    pub fn short_long(short: Box<dyn Widget>, long: Box<dyn Widget>, long_default: bool) -> Self {
        Self::new(
            vec![("< ".to_string(), short), ("> ".to_string(), long)],
            usize::from(long_default),
        )
    }

    pub fn selection(&self) -> usize {
        self.stack.selection.get()
    }

    pub fn label_id(&self) -> WidgetId {
        self.label.id()
    }

    pub fn title(&self) -> &str {
        &self.label.label
    }

    fn next_tab(&mut self) {
        if self.titles.is_empty() {
            return;
        }
        let next = (self.stack.selection.get() + 1) % self.titles.len();
        self.stack.selection.set(next);
        self.label.label = self.titles[next].clone();
        debug!(tab = next, title = %self.label.label, "switched tab");
    }
}

impl Widget for TabbedLayout {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn render(&self, p: &mut Painter) {
        p.widget(&self.label);
        p.widget(&self.stack);
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&dyn Widget)) {
        f(&self.label);
        f(&self.stack);
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Widget)) {
        f(&mut self.label);
        f(&mut self.stack);
    }

    fn can_handle_input(
        &mut self,
        target: WidgetId,
        button: MouseButton,
        cx: &mut LoopContext,
    ) -> bool {
        if target == self.label.id() {
            self.next_tab();
            return true;
        }
        self.stack.can_handle_input(target, button, cx)
    }
}
