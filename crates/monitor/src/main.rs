//! Sentinel network monitor binary.
//!
//! Runs the terminal dashboard by default; `--quiet` runs headless with
//! structured logging, `--report` writes a one-shot status report and
//! exits.

use sentinel_monitor::{
    ALL_CHART_PANELS, App, ChartRenderer, HeadlessRenderer, MonitorConfig, NetworkMonitor,
    run_tui, tui::PanelRenderer,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Args {
    /// Dashboard API origin override
    base_url: Option<String>,
    /// Optional YAML config file
    config: Option<PathBuf>,
    /// Directory for exported reports
    report_dir: Option<PathBuf>,
    /// Write one report and exit
    report: bool,
    /// Disable TUI (log mode only)
    quiet: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut argv = std::env::args().skip(1);

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--base-url" => {
                if let Some(url) = argv.next() {
                    args.base_url = Some(url);
                }
            }
            "--config" => {
                if let Some(path) = argv.next() {
                    args.config = Some(PathBuf::from(path));
                }
            }
            "--report-dir" => {
                if let Some(path) = argv.next() {
                    args.report_dir = Some(PathBuf::from(path));
                }
            }
            "--report" => args.report = true,
            "-q" | "--quiet" => args.quiet = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
    }

    args
}

fn print_help() {
    println!(
        r#"
Sentinel Network Monitor

Live network health, device inventory, security events and bandwidth
charts, with synthetic fallback data when no dashboard API is reachable.

USAGE:
    sentinel-monitor [OPTIONS]

OPTIONS:
    --base-url <URL>      Dashboard API origin [default: http://127.0.0.1:8080]
    --config <PATH>       YAML configuration file
    --report-dir <PATH>   Directory for exported reports [default: .]
    --report              Write one status report and exit
    -q, --quiet           Disable TUI, log mode only
    -h, --help            Print this help message

EXAMPLES:
    # Monitor the local network with the terminal dashboard
    sentinel-monitor

    # Point at a router's dashboard API
    sentinel-monitor --base-url http://192.168.1.1:8080

    # Headless mode for a service unit
    sentinel-monitor --quiet

    # One-shot report into /tmp
    sentinel-monitor --report --report-dir /tmp
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args();

    let mut config = match &args.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(url) = args.base_url {
        config.base_url = url;
    }
    if let Some(dir) = args.report_dir {
        config.report_dir = dir;
    }

    let use_quiet_mode = args.quiet
        || args.report
        || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    // The TUI owns the terminal; only headless modes log to stderr.
    if use_quiet_mode {
        tracing_subscriber::fmt::init();
    }

    let renderer: Arc<dyn ChartRenderer> = if use_quiet_mode {
        Arc::new(HeadlessRenderer)
    } else {
        Arc::new(PanelRenderer::with_panels(&ALL_CHART_PANELS))
    };

    let (monitor, event_rx) = NetworkMonitor::new(config, renderer);
    let monitor = Arc::new(monitor);
    monitor.init_charts();

    if args.report {
        // One-shot: collect a scan's worth of data, write the report, exit.
        monitor.force_device_scan().await;
        let path = monitor.export_report()?;
        println!("{}", path.display());
        return Ok(());
    }

    monitor.start().await;

    if use_quiet_mode {
        println!("Running in quiet mode (no TUI), press Ctrl+C to quit");

        // Drain the event channel so background loops never block on it.
        tokio::spawn(async move {
            let mut rx = event_rx;
            while rx.recv().await.is_some() {}
        });

        tokio::signal::ctrl_c().await?;
        monitor.stop();
    } else {
        run_tui(App::new(), event_rx, Arc::clone(&monitor)).await?;
        monitor.stop();
    }

    Ok(())
}
