//! Terminal frontend for the network monitor.
//!
//! Consumes the monitor's event stream and renders the visible dashboard
//! section. The layout mirrors the sections of the web dashboard:
//!
//! ```text
//! ╔══════════════════════════════════════════════════════════════════╗
//! ║ Sentinel Network Monitor   Overview│Network│Security│Devices│... ║
//! ╠══════════════════════════════════════════════════════════════════╣
//! ║  PING                      │  PORTS                              ║
//! ║  Google      23 ms  ●      │  22  SSH    open                    ║
//! ║  Cloudflare  19 ms  ●      │  443 HTTPS  open                    ║
//! ╠══════════════════════════════════════════════════════════════════╣
//! ║ [Q] Quit  [Tab] Section  [R] Refresh  [S] Scan  [E] Export       ║
//! ╚══════════════════════════════════════════════════════════════════╝
//! ```

mod app;
mod ui;

pub use app::{App, AppState};

use crate::charts::{ChartRenderer, RedrawMode};
use crate::events::MonitorEvent;
use crate::model::Severity;
use crate::monitor::NetworkMonitor;
use crate::scheduler;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;

/// How long a status banner stays on screen.
const BANNER_TTL: Duration = Duration::from_secs(5);

/// Chart renderer backed by the terminal frontend.
///
/// Panels listed at construction count as mounted; redraw requests bump a
/// generation counter the draw loop can observe. The terminal has no
/// animation, so both redraw modes collapse to the same repaint.
#[derive(Debug, Default)]
pub struct PanelRenderer {
    mounted: RwLock<HashSet<String>>,
    generation: AtomicU64,
}

impl PanelRenderer {
    pub fn with_panels(ids: &[&str]) -> Self {
        Self {
            mounted: RwLock::new(ids.iter().map(|id| id.to_string()).collect()),
            generation: AtomicU64::new(0),
        }
    }

    /// Monotonic counter of redraw requests.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }
}

impl ChartRenderer for PanelRenderer {
    fn is_mounted(&self, id: &str) -> bool {
        self.mounted
            .read()
            .expect("panel set lock poisoned")
            .contains(id)
    }

    fn redraw(&self, _id: &str, _mode: RedrawMode) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    fn resize(&self, _id: &str) {}

    fn release(&self, _id: &str) {}
}

/// Run the terminal UI until the user quits.
pub async fn run_tui(
    mut app: App,
    mut event_rx: mpsc::Receiver<MonitorEvent>,
    monitor: Arc<NetworkMonitor>,
) -> anyhow::Result<()> {
    use std::io::Write;

    // Restore the terminal even if drawing panics.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = io::stdout().flush();
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let tick_rate = Duration::from_millis(250);
    let mut last_tick = std::time::Instant::now();

    // Drain events queued before the first draw so the initial scan shows
    // up immediately.
    while let Ok(event) = event_rx.try_recv() {
        app.handle_event(event);
    }

    loop {
        terminal.draw(|frame| ui::draw(frame, &app, &monitor.state().charts))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let previous_section = app.section;
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                        KeyCode::Tab | KeyCode::Right => app.next_section(),
                        KeyCode::BackTab | KeyCode::Left => app.prev_section(),
                        KeyCode::Char(c @ '1'..='6') => {
                            app.select_section(c as usize - '1' as usize);
                        }
                        KeyCode::Char('r') => {
                            let state = Arc::clone(monitor.state());
                            tokio::spawn(async move {
                                scheduler::refresh_section(&state).await;
                            });
                        }
                        KeyCode::Char('s') => {
                            let monitor = Arc::clone(&monitor);
                            tokio::spawn(async move {
                                monitor.force_device_scan().await;
                            });
                        }
                        KeyCode::Char('e') => match monitor.export_report() {
                            Ok(path) => app.handle_event(MonitorEvent::Status {
                                message: format!("Report written to {}", path.display()),
                                severity: Severity::Info,
                            }),
                            Err(err) => app.handle_event(MonitorEvent::Status {
                                message: format!("Report export failed: {err}"),
                                severity: Severity::Warning,
                            }),
                        },
                        _ => {}
                    }
                    if app.section != previous_section {
                        monitor.state().set_section(app.section);
                    }
                }
                Event::Resize(_, _) => {
                    monitor.state().charts.resize_all();
                }
                _ => {}
            }
        }

        while let Ok(event) = event_rx.try_recv() {
            app.handle_event(event);
        }

        if last_tick.elapsed() >= tick_rate {
            app.clear_stale_banner(BANNER_TTL);
            last_tick = std::time::Instant::now();
        }

        if app.should_quit() {
            break;
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    let _ = io::stdout().flush();

    Ok(())
}
