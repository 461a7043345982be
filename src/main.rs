use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing_subscriber::EnvFilter;

use roomwatch::app::export_aggregator;
use roomwatch::ui::{self, Theme};
use roomwatch::{
    events, Aggregator, App, DashboardConfig, JsonFileStore, ReadingSource, ReplaySource,
    SimulatedSource, ThresholdStore, ThresholdUpdate, View, WebSocketSource,
};

#[derive(Parser, Debug)]
#[command(name = "roomwatch")]
#[command(about = "Terminal dashboard for room temperature, humidity and leak sensors")]
struct Args {
    /// Connect to a feed server (defaults to the configured URL)
    #[arg(short, long, num_args = 0..=1, conflicts_with_all = ["replay", "simulate", "export"])]
    connect: Option<Option<String>>,

    /// Replay a captured feed log (one JSON array per line)
    #[arg(long, conflicts_with = "simulate")]
    replay: Option<PathBuf>,

    /// Run offline with simulated rooms
    #[arg(long)]
    simulate: bool,

    /// Dashboard config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Threshold file to load at startup and save to with `s`
    #[arg(short, long)]
    thresholds: Option<PathBuf>,

    /// Threshold override, e.g. "Kitchen.temp=29.5" (repeatable)
    #[arg(long = "threshold", value_name = "ROOM.FIELD=VALUE")]
    threshold: Vec<ThresholdUpdate>,

    /// Threshold preset: dashboard, settings or none
    #[arg(long)]
    preset: Option<String>,

    /// Readings kept per room
    #[arg(long)]
    history: Option<usize>,

    /// Readings shown in charts
    #[arg(long)]
    chart_window: Option<usize>,

    /// Export state to JSON after draining the source, then exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Write logs to this file (the terminal is reserved for the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = DashboardConfig::load(args.config.as_deref())?;
    if let Some(history) = args.history {
        config.history_size = history;
    }
    if let Some(window) = args.chart_window {
        config.chart_window = window;
    }
    if let Some(ref preset) = args.preset {
        config.threshold_preset = preset.clone();
    }
    if let Some(ref path) = args.thresholds {
        config.thresholds_file = Some(path.clone());
    }
    config.validate()?;

    init_logging(args.log_file.as_deref(), args.export.is_some())?;

    let store = config
        .thresholds_file
        .as_ref()
        .map(|path| JsonFileStore::at(path.clone()));
    let aggregator = build_aggregator(&config, store.as_ref(), &args.threshold)?;

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return export_to_file(&args, &config, aggregator, export_path);
    }

    // Sources spawn their tasks on this runtime
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let source: Box<dyn ReadingSource> = if let Some(ref path) = args.replay {
        Box::new(ReplaySource::new(path).interval(config.replay_interval()))
    } else if args.simulate {
        Box::new(
            SimulatedSource::new()
                .tick(config.simulate_interval())
                .backfill(config.simulate_backfill),
        )
    } else {
        let url = args
            .connect
            .clone()
            .flatten()
            .unwrap_or_else(|| config.connect.clone());
        tracing::info!(%url, "connecting to feed");
        Box::new(WebSocketSource::connect_with_delay(
            &url,
            config.reconnect_delay(),
        ))
    };

    let mut app = App::new(source, aggregator)
        .with_chart_window(config.chart_window)
        .with_theme(Theme::auto_detect());
    if let Some(store) = store {
        app = app.with_store(Box::new(store));
    }

    run_tui(app, config.refresh())
}

/// Logs go to `--log-file`, or to stderr when no UI is drawn.
fn init_logging(log_file: Option<&Path>, headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

/// Preset, then the stored map, then command-line overrides.
fn build_aggregator(
    config: &DashboardConfig,
    store: Option<&JsonFileStore>,
    overrides: &[ThresholdUpdate],
) -> Result<Aggregator> {
    let mut aggregator = Aggregator::new(config.history_size).with_thresholds(config.thresholds());

    if let Some(store) = store {
        match aggregator.load_thresholds(store) {
            Ok(true) => tracing::info!(path = %store.location(), "loaded thresholds"),
            Ok(false) => tracing::debug!(path = %store.location(), "no stored thresholds"),
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable threshold file"),
        }
    }

    for update in overrides {
        aggregator.apply_update(update)?;
    }
    Ok(aggregator)
}

/// Drain a finite source into the aggregator and write the export.
fn export_to_file(
    args: &Args,
    config: &DashboardConfig,
    mut aggregator: Aggregator,
    export_path: &Path,
) -> Result<()> {
    let mut source: Box<dyn ReadingSource> = if let Some(ref path) = args.replay {
        Box::new(ReplaySource::new(path))
    } else if args.simulate {
        Box::new(
            SimulatedSource::new()
                .tick(Duration::from_secs(3600))
                .backfill(config.simulate_backfill),
        )
    } else {
        anyhow::bail!("--export needs a finite source: use --replay or --simulate");
    };

    let mut batches = 0usize;
    let mut rejected = 0usize;
    while let Some(batch) = source.poll() {
        let report = aggregator.ingest_decoded(batch);
        rejected += report.rejected.len();
        batches += 1;
    }
    if let Some(err) = source.error() {
        tracing::warn!(source = source.description(), error = %err, "source reported an error");
    }

    export_aggregator(&aggregator, export_path)?;

    println!(
        "Exported {} batches ({} rejected entries) to: {}",
        batches,
        rejected,
        export_path.display()
    );
    Ok(())
}

/// Run the TUI until the operator quits
fn run_tui(mut app: App, refresh_interval: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    app.reload_data();

    let result = run_app(&mut terminal, &mut app, refresh_interval);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered =
                    ratatui::layout::Rect::new(0, top, area.width, 5u16.min(area.height - top));
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Length(ui::common::notification_height(app)),
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);
            ui::common::render_notification(frame, app, chunks[2]);

            match app.current_view {
                View::Overview => ui::overview::render(frame, app, chunks[3]),
                View::Trends => ui::trends::render(frame, app, chunks[3]),
                View::Alerts => ui::alerts::render(frame, app, chunks[3]),
            }

            ui::common::render_status_bar(frame, app, chunks[4]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Table rows start after header, tabs, banner and table border
                    let content_start = 3 + ui::common::notification_height(app);
                    events::handle_mouse_event(app, mouse, content_start);
                }
                _ => {}
            }
        }

        if last_refresh.elapsed() >= refresh_interval {
            app.reload_data();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}
