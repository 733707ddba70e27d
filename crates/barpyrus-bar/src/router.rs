//! Click tokens and their routing back into the widget tree.
//!
//! Every rendered frame carries its own [`ClickTable`]. Tokens have the form
//! `{frame}_{span}_{button}`, so a token can only ever resolve in the table
//! of the frame that embedded it. Installing a new table drops all earlier
//! tokens.

use std::collections::HashMap;

use barpyrus_core::{LoopContext, MouseButton, WidgetId};
use tracing::{debug, warn};

use crate::widget::Widget;

/// What a click token points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickTarget {
    pub widget: WidgetId,
    pub button: MouseButton,
}

/// Click tokens of one rendered frame.
#[derive(Debug, Default, Clone)]
pub struct ClickTable {
    entries: HashMap<String, ClickTarget>,
}

impl ClickTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for `button` on the `span`-th clickable region of frame `frame`.
    pub fn token(frame: u64, span: u32, button: MouseButton) -> String {
        format!("{frame}_{span}_{button}")
    }

    /// Register `token`. Returns false if it was already present.
    pub fn insert(&mut self, token: String, target: ClickTarget) -> bool {
        self.entries.insert(token, target).is_none()
    }

    pub fn resolve(&self, token: &str) -> Option<ClickTarget> {
        self.entries.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Deliver a click reported by the bar to the widget that owns `token`.
    ///
    /// Unknown tokens and tokens whose widget has been pruned are logged and
    /// ignored. Returns true if a widget handled the click.
    pub fn route(&self, token: &str, root: &mut dyn Widget, cx: &mut LoopContext) -> bool {
        let token = token.trim();
        let Some(target) = self.resolve(token) else {
            warn!(%token, "ignoring unknown click token");
            return false;
        };
        debug!(%token, widget = %target.widget, button = %target.button, "routing click");
        if root.can_handle_input(target.widget, target.button, cx) {
            true
        } else {
            warn!(%token, widget = %target.widget, "click target no longer exists");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        assert_eq!(ClickTable::token(7, 2, MouseButton::RIGHT), "7_2_3");
    }

    #[test]
    fn test_insert_detects_duplicates() {
        let mut table = ClickTable::new();
        let target = ClickTarget {
            widget: WidgetId::next(),
            button: MouseButton::LEFT,
        };
        assert!(table.insert("1_0_1".into(), target));
        assert!(!table.insert("1_0_1".into(), target));
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve("1_0_1"), Some(target));
        assert_eq!(table.resolve("1_0_2"), None);
    }
}
