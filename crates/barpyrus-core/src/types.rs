//! Shared type definitions used across barpyrus crates.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A mouse button number as lemonbar reports it (1 = left ... 5 = wheel down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MouseButton(pub u8);

impl MouseButton {
    pub const LEFT: Self = Self(1);
    pub const MIDDLE: Self = Self(2);
    pub const RIGHT: Self = Self(3);
    pub const WHEEL_UP: Self = Self(4);
    pub const WHEEL_DOWN: Self = Self(5);

    /// Returns true for the two scroll-wheel buttons.
    pub fn is_wheel(self) -> bool {
        self == Self::WHEEL_UP || self == Self::WHEEL_DOWN
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of one widget instance, used to route clicks.
///
/// Ids are never reused within a process, so a click aimed at a pruned
/// widget cannot land on a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(u64);

static NEXT_WIDGET_ID: AtomicU64 = AtomicU64::new(1);

impl WidgetId {
    /// Allocate a fresh identity.
    pub fn next() -> Self {
        Self(NEXT_WIDGET_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_ids_are_unique() {
        let a = WidgetId::next();
        let b = WidgetId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn test_mouse_button_wheel() {
        assert!(MouseButton::WHEEL_UP.is_wheel());
        assert!(MouseButton::WHEEL_DOWN.is_wheel());
        assert!(!MouseButton::RIGHT.is_wheel());
    }
}
