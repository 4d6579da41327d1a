use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use simplelog::{ConfigBuilder, WriteLogger};
use tokio::sync::mpsc;

use stepnav::core::config::{ResolvedConfig, load_config, resolve};
use stepnav::core::permission::PermissionState;
use stepnav::core::{AdvancePolicy, ChannelSink, NavEvent, Session, SoftwareGeofence};
use stepnav::geo::Coordinate;
use stepnav::replay::{load_track, spawn_replay};
use stepnav::runtime::Runtime;
use stepnav::services::{NominatimGeocoder, OsrmRouter};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    /// Every region entry advances one step
    Permissive,
    /// Only entries for later steps advance, each once
    Strict,
}

impl From<PolicyArg> for AdvancePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Permissive => AdvancePolicy::Permissive,
            PolicyArg::Strict => AdvancePolicy::StrictOrdered,
        }
    }
}

#[derive(Parser)]
#[command(name = "stepnav", about = "Turn-by-turn step tracking")]
struct Args {
    /// Destination address to route to
    #[arg(short, long)]
    destination: String,

    /// Starting position as "lat,lon" (defaults to the first replay point)
    #[arg(short, long, value_parser = parse_coordinate)]
    origin: Option<Coordinate>,

    /// GPX track replayed as the traveler's position; enables navigation
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Milliseconds between replayed positions
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// How region entries advance the step cursor
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
}

fn parse_coordinate(text: &str) -> Result<Coordinate, String> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{text}\""))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    Coordinate::new(lat, lon).map_err(|e| e.to_string())
}

fn init_logging(config: &ResolvedConfig) {
    // File logger: writes to stepnav.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("stepnav.log") {
        let _ = WriteLogger::init(config.log_level, log_config, log_file);
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = load_config().unwrap_or_else(|e| {
        eprintln!("Ignoring config file: {e}");
        Default::default()
    });
    let config = resolve(&file_config, args.policy.map(Into::into));
    init_logging(&config);
    info!("stepnav starting up: {:?}", config);

    let mut replay_points = match &args.replay {
        Some(path) => Some(load_track(path).map_err(io::Error::other)?),
        None => None,
    };
    let origin = args
        .origin
        .or_else(|| replay_points.as_ref().and_then(|p| p.first().copied()))
        .ok_or_else(|| io::Error::other("an --origin or a --replay track is required"))?;

    let geocoder =
        NominatimGeocoder::new(config.nominatim_base_url.clone(), &config.user_agent, config.timeout)
            .map_err(io::Error::other)?;
    let router = OsrmRouter::new(config.osrm_base_url.clone(), &config.user_agent, config.timeout)
        .map_err(io::Error::other)?;

    let geofence = SoftwareGeofence::new();
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let session = Session::new(
        Box::new(geofence.clone()),
        Box::new(ChannelSink::new(event_tx)),
        config.session_settings(),
    );
    let runtime = Runtime::new(session, Arc::new(geocoder), Arc::new(router), config.travel_mode);
    let handle = runtime.handle();
    let mut runtime_task = tokio::spawn(runtime.run());

    // The geofence only sees replayed positions, so the origin still
    // counts as entering the first step's region.
    handle.authorization_changed(PermissionState::AuthorizedWhenInUse);
    handle.begin_trip(origin, args.destination.clone());
    println!("Routing to \"{}\" from {}", args.destination, origin);

    let mut navigating = false;
    let session = loop {
        // Drain pending events before noticing that the runtime stopped
        tokio::select! {
            biased;
            Some(event) = events.recv() => match event {
                NavEvent::Instruction(text) => {
                    println!("> {text}");
                    // The opening announcement follows region registration
                    if let Some(points) = replay_points.take() {
                        let replay = spawn_replay(
                            points,
                            Duration::from_millis(args.interval_ms),
                            geofence.clone(),
                            handle.clone(),
                        );
                        let done = handle.clone();
                        tokio::spawn(async move {
                            if let Err(e) = replay.await {
                                warn!("Replay task failed: {}", e);
                            }
                            done.shutdown();
                        });
                    }
                }
                NavEvent::Recenter(c) => debug!("Recenter on {}", c),
                NavEvent::FitToRoute(bounds) => debug!("Fit to route {:?}", bounds),
                NavEvent::AuthorizationRequested => info!("Location permission requested"),
                NavEvent::RouteReady { steps, distance_m } => {
                    println!("Route ready: {steps} steps, {distance_m:.0} m");
                    if args.replay.is_none() {
                        // Preview only: the steps are printed from the returned session
                        handle.shutdown();
                    } else if !navigating {
                        navigating = true;
                        handle.start_navigating();
                    }
                }
                NavEvent::Arrived => {
                    println!("{}", config.arrival_message);
                    handle.shutdown();
                }
                NavEvent::Error(e) => {
                    eprintln!("Error: {e}");
                    if !navigating {
                        handle.shutdown();
                    }
                }
            },
            result = &mut runtime_task => break result.map_err(io::Error::other)?,
        }
    };

    if !navigating && let Some(route) = session.route() {
        for (i, step) in route.steps().iter().enumerate() {
            println!("{:>3}. {} ({} m)", i + 1, step.instruction, step.distance_m.round());
        }
    }
    info!("stepnav exiting in state {:?}", session.state());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(
            parse_coordinate("48.2, 16.37"),
            Ok(Coordinate { lat: 48.2, lon: 16.37 })
        );
        assert!(parse_coordinate("48.2").is_err());
        assert!(parse_coordinate("91,0").is_err());
        assert!(parse_coordinate("a,b").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "stepnav",
            "--destination",
            "Stephansplatz",
            "--origin",
            "48.2,16.3",
            "--policy",
            "strict",
        ])
        .unwrap();
        assert_eq!(args.destination, "Stephansplatz");
        assert_eq!(args.interval_ms, 1000);
        assert!(matches!(args.policy, Some(PolicyArg::Strict)));
        assert_eq!(AdvancePolicy::from(PolicyArg::Strict), AdvancePolicy::StrictOrdered);
    }
}
