use std::path::PathBuf;

use ampctl_blackstar::{control_table, BlackstarAmp};
use ampctl_core::{
    list_ports, AmpDevice, CommandDispatcher, ControlMap, ControlTable, EventInterpreter,
    ListenSession,
};
use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;

const AFTER_HELP: &str = "\
ampctl is for setting a value every now and then, not for tracking continuous
control signals; expect latency in the 40ms range.

--preset, --volume and --control are conveniences to quickly set a control and
exit. They can be used together.

--list-buses, --list-map, --list-controls and --list-limits print useful
information and exit. They can be used together.";

/// Control a Blackstar ID guitar amplifier with MIDI Program Change and
/// Control Change messages.
#[derive(Parser, Debug)]
#[command(name = "ampctl", version, about, after_help = AFTER_HELP)]
struct Args {
    /// Number or name of the MIDI bus to listen on
    #[arg(long, default_value = "blackstar")]
    bus: String,

    /// MIDI channel 1-16 to listen on, 0 = all
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=16))]
    channel: u8,

    /// File of "ccNumber,controlName" rows replacing the default mapping
    #[arg(long, value_name = "FILE")]
    map: Option<PathBuf>,

    /// Suppress operational messages
    #[arg(long)]
    quiet: bool,

    /// Send a preset select 1-128 and exit
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=128))]
    preset: Option<u8>,

    /// Set the amp's volume and exit
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    volume: Option<u8>,

    /// Set the named control to the value and exit
    #[arg(long, num_args = 2, value_names = ["NAME", "VALUE"])]
    control: Option<Vec<String>>,

    /// List MIDI input busses and exit
    #[arg(long)]
    list_buses: bool,

    /// List the default control mapping and exit
    #[arg(long)]
    list_map: bool,

    /// List the amp's controls and exit
    #[arg(long)]
    list_controls: bool,

    /// List the amp's controls with their limits and exit
    #[arg(long)]
    list_limits: bool,
}

/// A validated name/value pair from --control.
#[derive(Debug)]
struct ControlRequest {
    name: String,
    value: i32,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let controls = control_table();

    // Informational flags print and exit without touching the amp.
    if args.list_buses || args.list_map || args.list_controls || args.list_limits {
        return print_listings(&args, &controls);
    }

    let request = control_request(&args, &controls);
    let mut amp = BlackstarAmp::new();

    if args.preset.is_some() || args.volume.is_some() || request.is_some() {
        return run_one_shot(&args, request, &mut amp);
    }

    run_listener(&args, &controls, &mut amp).await
}

/// Validate the two --control values against the control table, or exit with
/// a usage error.
fn control_request(args: &Args, controls: &ControlTable) -> Option<ControlRequest> {
    let pair = args.control.as_ref()?;
    let name = pair[0].to_ascii_lowercase();

    let Some((low, high)) = controls.limits(&name) else {
        arg_error(format!("invalid control name \"{}\"", pair[0]));
    };
    let Ok(value) = pair[1].parse::<i32>() else {
        arg_error(format!(
            "invalid value for {} \"{}\", should be an integer",
            name, pair[1]
        ));
    };
    if value < low || value > high {
        arg_error(format!(
            "invalid value for {}, {} not in range {}-{}",
            name, value, low, high
        ));
    }

    Some(ControlRequest { name, value })
}

fn arg_error(message: String) -> ! {
    Args::command()
        .error(ErrorKind::ValueValidation, message)
        .exit()
}

fn print_listings(args: &Args, controls: &ControlTable) -> Result<()> {
    if args.list_buses {
        for (index, name) in list_ports()?.iter().enumerate() {
            println!("{} \"{}\"", index, name);
        }
    }
    if args.list_map {
        for (cc, name) in ControlMap::builtin().iter() {
            println!("{:3} -> {}", cc, name);
        }
    }
    if args.list_controls {
        println!("{}", controls.names().collect::<Vec<_>>().join(", "));
    }
    if args.list_limits {
        for (name, (low, high)) in controls.iter() {
            println!("{}: {}-{}", name, low, high);
        }
    }
    Ok(())
}

fn run_one_shot(
    args: &Args,
    request: Option<ControlRequest>,
    amp: &mut BlackstarAmp,
) -> Result<()> {
    amp.connect()?;
    println!("Connected to {}", amp.model());

    if let Some(preset) = args.preset {
        println!("Requesting preset {}", preset);
        amp.select_preset(preset)?;
    }
    if let Some(volume) = args.volume {
        println!("Setting volume {}", volume);
        amp.set_control("volume", i32::from(volume))?;
    }
    if let Some(request) = request {
        println!("Setting control {} to {}", request.name, request.value);
        amp.set_control(&request.name, request.value)?;
    }

    amp.disconnect()
}

async fn run_listener(args: &Args, controls: &ControlTable, amp: &mut BlackstarAmp) -> Result<()> {
    let map = load_map(args, controls);
    let interpreter = EventInterpreter::new(map, args.channel, controls.clone());
    let dispatcher = CommandDispatcher::new(args.quiet);
    let session = ListenSession::new(interpreter, dispatcher, args.quiet);

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(()).await;
        }
    });

    session.run(amp, &args.bus, shutdown_rx).await?;
    if !args.quiet {
        println!("Quitting");
    }
    Ok(())
}

/// The map to listen with: the --map file when given and valid, otherwise the
/// built-in default. A bad file is reported but not fatal.
fn load_map(args: &Args, controls: &ControlTable) -> ControlMap {
    let Some(path) = &args.map else {
        return ControlMap::builtin();
    };
    match ControlMap::from_path(path, controls) {
        Ok(map) => map,
        Err(e) => {
            println!("{}", e);
            println!(
                "Problem with --map {}, using default mapping",
                path.display()
            );
            ControlMap::builtin()
        }
    }
}
