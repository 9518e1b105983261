use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use quake_map::app::App;
use quake_map::config::{Config, MapView, TileSource, DEFAULT_TILE_URL};
use quake_map::feed::{load_feed, EarthquakeFeature, FeedSource, USGS_ALL_WEEK_URL};
use quake_map::map::{MapHandle, MapRenderer};
use quake_map::style::Palette;
use quake_map::{build_map, data, html, ui};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quake-map")]
#[command(author, version, about = "Live earthquake map in the terminal or as a Leaflet page", long_about = None)]
struct Cli {
    /// GeoJSON feed to fetch
    #[arg(long, env = "QUAKE_FEED_URL", default_value = USGS_ALL_WEEK_URL, global = true)]
    feed_url: String,

    /// Read the feed from a local file instead of fetching it
    #[arg(long, global = true)]
    feed_file: Option<PathBuf>,

    /// Tile provider access token
    #[arg(long, env = "MAPBOX_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    /// Tile URL template with {id}, {z}, {x}, {y} and {accessToken}
    #[arg(long, default_value = DEFAULT_TILE_URL, global = true)]
    tile_url: String,

    /// Initial center latitude
    #[arg(long, default_value_t = MapView::default().center_lat, allow_negative_numbers = true, global = true)]
    center_lat: f64,

    /// Initial center longitude
    #[arg(long, default_value_t = MapView::default().center_lon, allow_negative_numbers = true, global = true)]
    center_lon: f64,

    /// Initial zoom level
    #[arg(long, default_value_t = MapView::default().zoom, global = true)]
    zoom: u8,

    /// Six comma-separated #rrggbb colors, lowest magnitude bucket first
    #[arg(long, global = true)]
    palette: Option<String>,

    /// Leave the legend off the map
    #[arg(long, global = true)]
    no_legend: bool,

    /// Write logs to this file (the viewer otherwise logs nothing)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Interactive terminal map (default)
    View {
        /// Directory with Natural Earth coastline/border GeoJSON
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Write the map as a standalone Leaflet page
    Export {
        /// Output HTML file
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Cli {
    fn config(&self, command: &Command) -> Result<Config> {
        let feed = match &self.feed_file {
            Some(path) => FeedSource::File(path.clone()),
            None => FeedSource::Url(self.feed_url.clone()),
        };
        let palette = match &self.palette {
            Some(colors) => colors.parse::<Palette>().context("invalid --palette")?,
            None => Palette::default(),
        };
        let data_dir = match command {
            Command::View { data_dir } => data_dir.clone(),
            Command::Export { .. } => PathBuf::from("data"),
        };

        let config = Config {
            feed,
            tiles: TileSource {
                url_template: self.tile_url.clone(),
                access_token: self.access_token.clone(),
            },
            view: MapView {
                center_lat: self.center_lat,
                center_lon: self.center_lon,
                zoom: self.zoom,
            },
            palette,
            show_legend: !self.no_legend,
            data_dir,
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Command::View {
        data_dir: PathBuf::from("data"),
    });

    init_logging(cli.log_file.as_deref(), matches!(command, Command::Export { .. }))?;

    let config = cli.config(&command)?;
    let features = fetch(&config)?;
    let map = build_map(&config, &features)?;
    info!(markers = map.overlay.markers.len(), zoom = config.view.zoom, "map composed");

    match command {
        Command::Export { output } => export(&map, &output),
        Command::View { .. } => view(map, &config),
    }
}

/// Logs go to the file when given, else to stderr for non-interactive runs
fn init_logging(log_file: Option<&Path>, stderr: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

/// Single feed request on a current-thread runtime
fn fetch(config: &Config) -> Result<Vec<EarthquakeFeature>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let client = reqwest::Client::builder()
        .user_agent(concat!("quake-map/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;

    runtime.block_on(load_feed(&client, &config.feed))
}

fn export(map: &MapHandle, output: &Path) -> Result<()> {
    let page = html::render_html(map)?;
    std::fs::write(output, page).with_context(|| format!("writing {}", output.display()))?;
    info!(path = %output.display(), "wrote map page");
    Ok(())
}

fn view(map: MapHandle, config: &Config) -> Result<()> {
    let mut renderer = MapRenderer::new();
    data::load_basemap(&mut renderer, &config.data_dir);

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, map, renderer);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Mouse: wheel zooms at the cursor, drag pans, click opens a popup
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.mouse_up(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, map: MapHandle, renderer: MapRenderer) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(map, renderer, size.width as usize, size.height as usize);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, &app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                KeyCode::Char(c @ '1'..='9') => app.select_base_layer(c as usize - '1' as usize),
                KeyCode::Char('e') | KeyCode::Char('E') => app.toggle_overlay(),

                KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),
                _ => {}
            },
            Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
            Event::Resize(width, height) => app.resize(width as usize, height as usize),
            _ => {}
        }
    }

    Ok(())
}
