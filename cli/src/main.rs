use anyhow::{Result, bail};
use app::client::{TransitApi, TransitClient};
use app::config::Config;
use app::geo::{LatLng, Viewport};
use app::reconcile::SidebarView;
use app::schedule::{ScheduleQuery, load_schedule};
use app::session::MapCommand;
use app::viewer::{SERVICE_WARNING, Viewer};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "transit-cli",
    version,
    about = "Browse a transit API from the terminal",
    long_about = "Drives the same viewer state as the browser map against a live \
                  transit API. Map updates are logged at debug level instead of drawn."
)]
struct Cli {
    /// Transit API base URL (overrides API_SERVER)
    #[arg(long)]
    api_server: Option<String>,

    /// Verbose output (show map commands)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show service dates, default location and page size
    Info,
    /// List every route with its display color
    Routes,
    /// List the stops around a location
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Zoom level; nearby stops need NEARBY_MIN_ZOOM or more
        #[arg(long)]
        zoom: Option<u8>,
        /// Only list stops whose name contains this text
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Show a route and list its stops
    Route {
        route_id: String,
        /// Leave the route's stops off the map
        #[arg(long)]
        hide_stops: bool,
    },
    /// Print the arrivals at a stop
    Schedule {
        stop_id: String,
        /// YYYY-MM-DD, today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn log_commands(commands: Vec<MapCommand>) {
    for command in commands {
        debug!("map: {:?}", command);
    }
}

fn print_sidebar(sidebar: &SidebarView) {
    println!("{}", sidebar.status);
    for entry in &sidebar.entries {
        println!(
            "  {:>8}  {}  [{}]",
            entry.code.as_deref().unwrap_or("-"),
            entry.name,
            entry.color
        );
    }
}

async fn start_viewer(client: TransitClient, config: &Config) -> Result<Viewer<TransitClient>> {
    let mut viewer = Viewer::start(client, config, Local::now().date_naive()).await?;
    if !viewer.has_active_service() {
        println!("{SERVICE_WARNING}");
    }
    log_commands(viewer.drain_commands());
    Ok(viewer)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::from_env()?;
    if let Some(api_server) = cli.api_server {
        config.api_server = api_server;
    }
    info!("Using transit API at {}", config.api_server);
    let client = TransitClient::new(&config)?;

    match cli.command {
        Command::Info => {
            let service = client.fetch_info().await?;
            let [first, last] = service.service_date_range;
            println!("Service dates: {first} - {last}");
            if !service.has_active_service(Local::now().date_naive()) {
                println!("{SERVICE_WARNING}");
            }
            let center = service.default_center();
            println!("Default location: {:.4} lon / {:.4} lat", center.lng, center.lat);
            println!("Max page size: {}", service.max_page_size);
        }
        Command::Routes => {
            let viewer = start_viewer(client, &config).await?;
            for item in viewer.session().route_list() {
                println!("{:>4}  {}  [{}]", item.index, item.name, item.color);
            }
        }
        Command::Nearby {
            lat,
            lon,
            zoom,
            filter,
        } => {
            let mut viewer = start_viewer(client, &config).await?;
            let zoom = zoom.unwrap_or(config.nearby_min_zoom);
            let viewport = Viewport::centered(LatLng::new(lat, lon), zoom);
            viewer.pan_to(viewport).await?;
            viewer.set_filter(&filter);
            log_commands(viewer.drain_commands());

            println!("{}", viewport.describe());
            print_sidebar(viewer.sidebar());
        }
        Command::Route {
            route_id,
            hide_stops,
        } => {
            let mut viewer = start_viewer(client, &config).await?;
            viewer.set_show_route_stops(!hide_stops);
            if !viewer.show_route(&route_id).await? {
                bail!("No route with id {route_id}");
            }
            log_commands(viewer.drain_commands());

            if let Some(route) = viewer.session().route(&route_id) {
                println!("{}", route.full_name());
                println!("{} stops", route.stops().len());
                if route.geometry().is_none() {
                    println!("(no route geometry)");
                }
            }
            print_sidebar(viewer.sidebar());
        }
        Command::Schedule { stop_id, date } => {
            let query = ScheduleQuery::new(stop_id, date);
            let table = load_schedule(&client, &query, Local::now().naive_local()).await?;

            println!("{}", table.title);
            println!("{:>4}  {:<9} {:<40} Headsign", "No.", "Time", "Route");
            for row in &table.rows {
                let marker = if row.upcoming { "  <- upcoming" } else { "" };
                println!(
                    "{:>4}  {:<9} {:<40} {}{marker}",
                    row.number, row.time, row.route, row.headsign
                );
            }
        }
    }

    Ok(())
}
