use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dmxlink_core::{
    ArtNetSocket, Destination, DmxDevice, DmxFrame, OverflowPolicy, PatchConfig, TickReport,
    UniverseDevices, allocate_channels, resolve_destination,
};

mod devices;

use devices::MonitorDevice;

#[derive(Parser, Debug)]
#[command(name = "dmxlink")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (build ",
    env!("DMXLINK_BUILD_COMMIT"),
    ")"
))]
#[command(
    about = "Art-Net DMX node: routes per-universe channel data to patched devices.",
    long_about = None,
    after_help = "Examples:\n  dmxlink check rig.json\n  dmxlink run rig.json --bind 0.0.0.0:6454 --fps 44\n  dmxlink send -u 1 -c 255,0,128 --target 192.168.0.20"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a patch file and print the channel allocation table.
    Check {
        /// Path to a JSON patch file
        patch: PathBuf,

        /// Reject universes that exceed 512 channels instead of warning
        #[arg(long)]
        strict: bool,
    },
    /// Receive Art-Net frames and dispatch them to monitor devices.
    Run {
        /// Path to a JSON patch file
        patch: PathBuf,

        /// Socket bind address
        #[arg(long, default_value = "0.0.0.0:6454")]
        bind: String,

        /// Dispatch ticks per second
        #[arg(long, default_value_t = 44.0)]
        fps: f64,

        /// Stop after this many seconds (runs until interrupted if absent)
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Reject universes that exceed 512 channels instead of warning
        #[arg(long)]
        strict: bool,

        /// Print dispatch totals as JSON on stdout before exiting
        #[arg(long)]
        json: bool,
    },
    /// Encode and transmit a single ArtDMX frame.
    Send {
        /// Universe (port-address) to address
        #[arg(short, long)]
        universe: u16,

        /// Comma-separated channel values, channel 1 first
        #[arg(short, long, value_delimiter = ',', required = true)]
        channels: Vec<u8>,

        /// Destination node, HOST or HOST:PORT
        #[arg(long, required_unless_present = "broadcast", conflicts_with = "broadcast")]
        target: Option<String>,

        /// Broadcast on the local network instead of unicasting
        #[arg(long)]
        broadcast: bool,

        /// Frame sequence number (0 disables sequencing)
        #[arg(long, default_value_t = 0)]
        sequence: u8,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { patch, strict } => cmd_check(patch, policy_for(strict)),
        Commands::Run {
            patch,
            bind,
            fps,
            duration_secs,
            strict,
            json,
        } => cmd_run(patch, bind, fps, duration_secs, policy_for(strict), json),
        Commands::Send {
            universe,
            channels,
            target,
            broadcast,
            sequence,
        } => cmd_send(universe, channels, target, broadcast, sequence),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn policy_for(strict: bool) -> OverflowPolicy {
    if strict {
        OverflowPolicy::Strict
    } else {
        OverflowPolicy::Permissive
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn load_patch(path: &PathBuf) -> Result<PatchConfig, CliError> {
    if !path.exists() {
        return Err(CliError::new(
            format!("patch file not found: {}", path.display()),
            Some("pass a JSON patch file; see `dmxlink check --help`".to_string()),
        ));
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read patch file: {}", path.display()))?;
    PatchConfig::from_json_str(&json).map_err(|err| {
        CliError::new(
            format!("invalid patch file {}: {err}", path.display()),
            Some("expected JSON like {\"universes\": [{\"universe\": 0, \"devices\": [...]}]}".to_string()),
        )
    })
}

fn validated(patch: PatchConfig, policy: OverflowPolicy) -> Result<PatchConfig, CliError> {
    patch.validate(policy).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("fix the patch file, or drop --strict to keep an overflowing rig".to_string()),
        )
    })?;
    Ok(patch)
}

fn cmd_check(path: PathBuf, policy: OverflowPolicy) -> Result<(), CliError> {
    let patch = validated(load_patch(&path)?, policy)?;

    for entry in &patch.universes {
        let widths: Vec<usize> = entry
            .devices
            .iter()
            .map(|device| device.channels as usize)
            .collect();
        let (starts, total) = allocate_channels(&widths);

        match &entry.name {
            Some(name) => println!(
                "universe {} ({name}): {total}/{} channels",
                entry.universe,
                dmxlink_core::UNIVERSE_CHANNELS
            ),
            None => println!(
                "universe {}: {total}/{} channels",
                entry.universe,
                dmxlink_core::UNIVERSE_CHANNELS
            ),
        }
        for (device, start) in entry.devices.iter().zip(starts) {
            println!(
                "  {:<16} start {:>3}  width {:>3}",
                device.name, start, device.channels
            );
        }
    }

    eprintln!("OK: patch valid ({} universes)", patch.universes.len());
    Ok(())
}

fn cmd_run(
    path: PathBuf,
    bind: String,
    fps: f64,
    duration_secs: Option<u64>,
    policy: OverflowPolicy,
    json: bool,
) -> Result<(), CliError> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(CliError::new(
            format!("invalid tick rate: {fps}"),
            Some("pass a positive --fps".to_string()),
        ));
    }

    let patch = validated(load_patch(&path)?, policy)?;
    let universes = patch
        .universes
        .iter()
        .map(|entry| UniverseDevices {
            universe: entry.universe,
            devices: entry
                .devices
                .iter()
                .map(|device| {
                    Box::new(MonitorDevice::new(&device.name, device.channels as usize))
                        as Box<dyn DmxDevice>
                })
                .collect(),
        })
        .collect();
    let mut router = dmxlink_core::Router::configure(universes, policy)
        .map_err(|err| CliError::new(err.to_string(), None))?;

    let socket = ArtNetSocket::bind(&bind)
        .map_err(|err| CliError::new(format!("cannot bind {bind}: {err}"), None))?;
    let receiver = socket
        .spawn_receiver(router.buffer())
        .map_err(|err| CliError::new(format!("cannot start receiver: {err}"), None))?;
    tracing::info!(%bind, fps, "listening for ArtDMX frames");

    let interval = Duration::from_secs_f64(1.0 / fps);
    let deadline = duration_secs.map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut ticks = 0u64;
    let mut totals = TickReport::default();
    loop {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }
        std::thread::sleep(interval);
        totals.merge(&router.tick());
        ticks += 1;
    }
    receiver.stop();

    if json {
        let report = serde_json::to_string_pretty(&totals).context("JSON serialization failed")?;
        println!("{report}");
    }
    eprintln!(
        "OK: {ticks} ticks, {} universes dispatched, {} device updates, {} unrouted frames",
        totals.universes_dispatched, totals.devices_updated, totals.unrouted
    );
    Ok(())
}

fn cmd_send(
    universe: u16,
    channels: Vec<u8>,
    target: Option<String>,
    broadcast: bool,
    sequence: u8,
) -> Result<(), CliError> {
    let count = channels.len();
    let frame = DmxFrame::new(universe, channels)
        .map_err(|err| {
            CliError::new(
                err.to_string(),
                Some("a universe carries at most 512 channels".to_string()),
            )
        })?
        .with_sequence(sequence);

    let destination = if broadcast {
        Destination::Broadcast
    } else {
        let target = target.expect("clap requires --target without --broadcast");
        Destination::Unicast(resolve_destination(&target).map_err(|err| {
            CliError::new(
                err.to_string(),
                Some("use HOST, HOST:PORT, or --broadcast".to_string()),
            )
        })?)
    };

    let socket = ArtNetSocket::bind("0.0.0.0:0")
        .map_err(|err| CliError::new(format!("cannot open socket: {err}"), None))?;
    socket
        .send_dmx(&frame, &destination)
        .map_err(|err| CliError::new(format!("send failed: {err}"), None))?;

    match destination {
        Destination::Broadcast => {
            eprintln!("OK: sent {count} channels to universe {universe} (broadcast)");
        }
        Destination::Unicast(addr) => {
            eprintln!("OK: sent {count} channels to universe {universe} -> {addr}");
        }
    }
    Ok(())
}
