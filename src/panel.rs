//! The stock panel: tags on the left, the window title in the middle,
//! status and clocks on the right.

use std::rc::Rc;

use barpyrus_bar::hlwm::{TagBar, WindowTitle, keyboard_layout_switcher, monitor_focus_layout};
use barpyrus_bar::status::{ConkyWidget, PlayerWidget};
use barpyrus_bar::{DateTime, Label, ListLayout, RawLabel, TabbedLayout, Theme, Widget};
use barpyrus_config::Config;
use barpyrus_source::conky::ConkyConfig;
use barpyrus_source::{HerbstInput, Spawner, WmClient};
use tracing::{debug, warn};

fn framed(mut widget: impl Widget + 'static, theme: &Theme) -> Box<dyn Widget> {
    widget.base_mut().set_theme(Some(theme.clone()));
    Box::new(widget)
}

fn conky(text: &str, role: &str) -> Option<Box<dyn Widget>> {
    match ConkyWidget::spawn(&ConkyConfig::new(text)) {
        Ok(widget) => Some(Box::new(widget)),
        Err(e) => {
            warn!(%role, error = %e, "conky unavailable, leaving it out");
            None
        }
    }
}

/// Build the widget tree for `monitor`.
///
/// Window-manager hooks are registered on `hc`. Auxiliary programs that
/// fail to start are left out of the tree.
pub fn build(
    config: &Config,
    monitor: u32,
    wm: Rc<dyn WmClient>,
    hc: &mut HerbstInput,
    spawner: Rc<dyn Spawner>,
) -> Box<dyn Widget> {
    let widgets = &config.widgets;
    let frame = Theme::from(&widgets.frame);

    let title = framed(WindowTitle::new(wm.as_ref(), hc, None), &frame);
    let unfocused = widgets
        .conky_unfocused
        .as_deref()
        .and_then(|text| conky(text, "unfocused"))
        .unwrap_or_else(|| Box::new(Label::new("")));

    let mut panel = ListLayout::new(vec![
        Box::new(RawLabel::new("%{l}")) as Box<dyn Widget>,
        Box::new(TagBar::new(Rc::clone(&wm), hc, monitor)),
        Box::new(RawLabel::new("%{c}")),
        Box::new(monitor_focus_layout(wm.as_ref(), hc, monitor, title, unfocused)),
        Box::new(RawLabel::new("%{r}")),
    ]);

    if let Some(player) = &widgets.player {
        match PlayerWidget::spawn(Some(player.as_str())) {
            Ok(widget) => panel.push(Box::new(widget)),
            Err(e) => warn!(%player, error = %e, "playerctl unavailable, leaving it out"),
        }
    }
    if let Some(status) = widgets.conky_status.as_deref().and_then(|text| conky(text, "status")) {
        panel.push(status);
    }

    let mut long = ListLayout::new(Vec::new());
    if widgets.keyboard_layouts.is_empty() {
        debug!("no keyboard layouts configured");
    } else {
        long.push(Box::new(keyboard_layout_switcher(
            Rc::clone(&wm),
            hc,
            &widgets.keyboard_layouts,
            &widgets.setxkbmap,
            spawner,
        )));
        long.push(Box::new(RawLabel::new(" ")));
    }
    long.push(framed(DateTime::new(&widgets.clock_format), &frame));

    panel.push(Box::new(TabbedLayout::short_long(
        framed(DateTime::new(&widgets.short_clock_format), &frame),
        Box::new(long),
        false,
    )));
    Box::new(panel)
}
