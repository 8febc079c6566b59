/// AMP CLI - terminal music player driving the playback sequencer
use amp_cli::{
    catalog::{demo_catalog, JsonCatalog},
    commands::{describe_event, execute, Command, HELP},
    config::CliConfig,
    renderer::SimulatedRenderer,
    state,
};
use amp_core::{Track, TrackCatalog};
use amp_playback::{ChannelCallback, PlaybackSession};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "amp-cli")]
#[command(about = "Terminal music player driving the AMP playback sequencer", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "AMP_CONFIG")]
    config: Option<PathBuf>,

    /// Track catalog (JSON array of tracks)
    #[arg(long, conflicts_with = "demo")]
    catalog: Option<PathBuf>,

    /// Saved playback state file
    #[arg(long)]
    state: Option<PathBuf>,

    /// Use the built-in five-track demo catalog
    #[arg(long)]
    demo: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(catalog) = cli.catalog {
        config.catalog_file = Some(catalog);
    }
    if let Some(state_file) = cli.state {
        config.state_file = state_file;
    }

    // Initialize tracing (stderr, so it does not mix with command output)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let tracks: Arc<[Track]> = match (&config.catalog_file, cli.demo) {
        (Some(path), false) => {
            tracing::info!("Loading catalog from {}", path.display());
            JsonCatalog::new(path).load_tracks()?.into()
        }
        _ => {
            tracing::info!("Using demo catalog");
            demo_catalog().load_tracks()?.into()
        }
    };
    tracing::info!("{} tracks in catalog", tracks.len());

    let simulator = config.simulator.clone();
    let mut session = PlaybackSession::new(config.playback.clone(), move |events| {
        SimulatedRenderer::spawn(simulator, events)
    })?;

    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    session.with(|seq| {
        seq.attach_callback(Box::new(ChannelCallback::new(event_tx)));
        seq.set_track_list(Arc::clone(&tracks))
    })?;

    match state::load_snapshot(&config.state_file) {
        Ok(Some(snapshot)) => {
            session.lock().restore(snapshot)?;
            tracing::info!(
                "Restored state from {} (track {}, {}s)",
                config.state_file.display(),
                snapshot.track_index + 1,
                snapshot.position_secs
            );
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("Ignoring saved state: {}", e),
    }

    // Print callback events as they arrive
    let printer_tracks = Arc::clone(&tracks);
    let printer = thread::Builder::new()
        .name("amp-events".to_string())
        .spawn(move || {
            for event in event_rx {
                println!("{}", describe_event(&event, &printer_tracks));
            }
        })?;

    println!("{}", HELP);
    run_command_loop(&session)?;

    let snapshot = session.lock().snapshot();
    state::save_snapshot(&config.state_file, &snapshot)?;
    tracing::info!("Saved state to {}", config.state_file.display());

    session.shutdown();
    // Dropping the session drops the sink, which ends the printer
    drop(session);
    if printer.join().is_err() {
        tracing::warn!("Event printer panicked");
    }

    Ok(())
}

fn run_command_loop(session: &PlaybackSession) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    print!("> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            print!("> ");
            stdout.flush()?;
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => match execute(command, &mut session.lock()) {
                Ok(Some(output)) => println!("{}", output),
                Ok(None) => {}
                Err(e) => println!("Error: {}", e),
            },
            Err(e) => println!("{} (type `help` for commands)", e),
        }

        print!("> ");
        stdout.flush()?;
    }

    Ok(())
}
