//! barpyrus - a lemonbar status panel for herbstluftwm
//!
//! ## Usage
//!
//! ```bash
//! # Panel on the first monitor
//! barpyrus
//!
//! # Panel on monitor 1 with verbose logging
//! barpyrus 1 -v
//!
//! # Print one frame instead of starting lemonbar
//! barpyrus --dry-run
//!
//! # Custom configuration and log directory
//! barpyrus --config ~/panel.yaml --log-dir /tmp/barpyrus
//! ```

mod panel;

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use barpyrus_bar::{Bar, PainterStyle, Scheduler, Widget, render_line};
use barpyrus_config::Config;
use barpyrus_core::{BarError, LogGuard, LoopContext, init_logging};
use barpyrus_source::lemonbar::LemonbarCommand;
use barpyrus_source::{
    EventInput, HerbstClient, HerbstInput, PollReadiness, ProcessSpawner, Rect, SignalPipe, Spawner,
    WmClient,
};
use clap::Parser;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use tracing::{error, info, warn};

/// lemonbar status panel
///
/// Shows herbstluftwm tags, the focused window title, status text and
/// clocks on one monitor.
#[derive(Parser, Debug)]
#[command(name = "barpyrus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Index of the monitor to put the panel on
    #[arg(default_value_t = 0)]
    monitor: u32,

    /// Configuration file (defaults to ~/.config/barpyrus/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print one rendered frame to stdout and exit
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    info!(monitor = cli.monitor, "starting barpyrus");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("barpyrus failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            if let Some(hint) = e.downcast_ref::<BarError>().and_then(BarError::guidance) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::from(1)
        }
    }
}

fn setup_logging(cli: &Cli) -> barpyrus_core::Result<LogGuard> {
    init_logging(cli.log_dir.clone(), cli.verbose > 0)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load_or_default(cli.config.as_deref()).context("loading configuration")?;

    let flag = Arc::new(AtomicBool::new(false));
    let mut signals = SignalPipe::register(&[SIGINT, SIGTERM, SIGHUP], &flag)
        .context("installing signal handlers")?;
    let mut cx = LoopContext::with_signal_flag(flag);

    let wm: Rc<dyn WmClient> = Rc::new(HerbstClient::new());
    let spawner: Rc<dyn Spawner> = Rc::new(ProcessSpawner::new());
    if cli.dry_run {
        signals.terminate();
        let style = PainterStyle::from(&config.bar);
        return dry_run(&config, cli.monitor, wm, spawner, style);
    }

    let rect = wm.monitor_rect(cli.monitor).context("querying monitor geometry")?;
    let geometry = Rect {
        height: config.bar.height,
        ..rect
    };
    wm.pad(cli.monitor, config.bar.height).context("reserving panel space")?;

    let outcome = run_panel(
        &config,
        cli.monitor,
        Rc::clone(&wm),
        spawner,
        geometry,
        signals,
        &mut cx,
    );

    if let Err(e) = wm.pad(cli.monitor, 0) {
        warn!(error = %e, "cannot release panel space");
    }
    outcome
}

fn run_panel(
    config: &Config,
    monitor: u32,
    wm: Rc<dyn WmClient>,
    spawner: Rc<dyn Spawner>,
    geometry: Rect,
    signals: SignalPipe,
    cx: &mut LoopContext,
) -> anyhow::Result<()> {
    let lemonbar = LemonbarCommand::from_settings(&config.bar, Some(geometry))
        .spawn()
        .context("starting lemonbar")?;
    let bar = Bar::new(lemonbar, PainterStyle::from(&config.bar));

    let mut hc = HerbstInput::connect().context("connecting to herbstluftwm")?;
    let root = panel::build(config, monitor, wm, &mut hc, spawner);

    let reason = Scheduler::new(bar, root, PollReadiness)
        .with_input(hc)
        .with_input(signals)
        .with_timing(&config.timing)
        .run(cx)
        .context("running main loop")?;
    info!(%reason, "barpyrus stopped");
    Ok(())
}

fn dry_run(
    config: &Config,
    monitor: u32,
    wm: Rc<dyn WmClient>,
    spawner: Rc<dyn Spawner>,
    style: PainterStyle,
) -> anyhow::Result<()> {
    let mut hc = HerbstInput::connect().context("connecting to herbstluftwm")?;
    let mut root = panel::build(config, monitor, wm, &mut hc, spawner);
    println!("{}", render_line(root.as_ref(), style));

    root.event_inputs(&mut |input| input.terminate());
    hc.terminate();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["barpyrus"]).unwrap();
        assert_eq!(cli.monitor, 0);
        assert!(cli.config.is_none());
        assert_eq!(cli.verbose, 0);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_monitor_and_flags() {
        let cli =
            Cli::try_parse_from(["barpyrus", "2", "-vv", "--dry-run", "--config", "/tmp/p.yaml"])
                .unwrap();
        assert_eq!(cli.monitor, 2);
        assert_eq!(cli.verbose, 2);
        assert!(cli.dry_run);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.yaml")));
    }

    #[test]
    fn test_cli_rejects_bad_monitor() {
        assert!(Cli::try_parse_from(["barpyrus", "left"]).is_err());
    }
}
