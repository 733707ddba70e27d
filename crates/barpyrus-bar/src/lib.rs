//! # barpyrus-bar
//!
//! The widget tree and everything that turns it into a lemonbar line.
//!
//! - [`Widget`] - render, timer, input and click capabilities of a tree node
//! - [`Painter`] - emits markup for one frame and registers its click tokens
//! - [`ClickTable`] - routes tokens reported by the bar back to widgets
//! - [`Bar`] - the bar process, owning the click table on screen
//! - [`Scheduler`] - the main loop
//!
//! Stock widgets live in [`label`], [`layout`], [`hlwm`] and [`status`].

pub mod bar;
pub mod hlwm;
pub mod label;
pub mod layout;
pub mod mainloop;
pub mod markup;
pub mod painter;
pub mod router;
pub mod status;
pub mod theme;
pub mod widget;


pub use bar::Bar;
pub use label::{Button, ColorLabel, DateTime, Label, RawLabel};
pub use layout::{ListLayout, Selection, StackedLayout, Switcher, TabbedLayout};
pub use mainloop::{Scheduler, ShutdownReason};
pub use painter::{Frame, Painter, PainterStyle};
pub use router::{ClickTable, ClickTarget};
pub use theme::Theme;
pub use widget::{Widget, WidgetBase, render_line};
