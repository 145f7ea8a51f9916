//! Teamlink Bridge
//!
//! Routes `<team>:<payload>` lines from a console serial link to one of two
//! radio links, learning which radio serves which team from the radios'
//! own announcements.

mod logging;
mod port_info;
mod serial_io;
mod settings;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use link_mux::{ConsoleSource, RadioLink, RadioPair, Router, RouterContext};
use link_sim::{VirtualConsole, VirtualRadio};
use tracing::{info, warn};

use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::serial_io::{SerialConsole, SerialRadio};
use crate::settings::BridgeSettings;

/// How often the main thread checks for shutdown
const SUPERVISE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "teamlink", version, about = "Console-to-radio team message router")]
struct Cli {
    /// Settings file (defaults to the user config directory).
    #[arg(long, value_name = "PATH", global = true, env = "TEAMLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr); overrides RUST_LOG.
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the router until Ctrl-C
    Run(RunArgs),
    /// Print the effective settings as JSON
    Config(ConfigArgs),
    /// List serial ports
    Ports,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Console serial port
    #[arg(long)]
    console: Option<String>,

    /// Radio A serial port
    #[arg(long)]
    radio_a: Option<String>,

    /// Radio B serial port
    #[arg(long)]
    radio_b: Option<String>,

    /// Baud rate for all three ports
    #[arg(long)]
    baud: Option<u32>,

    /// Use simulated links; console lines are read from stdin
    #[arg(long)]
    simulate: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Write the effective settings back to the settings file
    #[arg(long)]
    save: bool,
}

impl RunArgs {
    fn apply(&self, settings: &mut BridgeSettings) {
        if let Some(port) = &self.console {
            settings.console.port = port.clone();
        }
        if let Some(port) = &self.radio_a {
            settings.radio_a.port = port.clone();
        }
        if let Some(port) = &self.radio_b {
            settings.radio_b.port = port.clone();
        }
        if let Some(baud) = self.baud {
            settings.console.baud_rate = baud;
            settings.radio_a.baud_rate = baud;
            settings.radio_b.baud_rate = baud;
        }
        if self.simulate {
            settings.simulate = true;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let settings = BridgeSettings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => {
            let mut settings = settings;
            args.apply(&mut settings);
            run(settings)
        }
        Command::Config(args) => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if args.save {
                let path = settings.save(cli.config.as_deref())?;
                info!("Saved settings to {}", path.display());
            }
            Ok(())
        }
        Command::Ports => {
            let ports = port_info::available_ports().context("Failed to enumerate serial ports")?;
            if ports.is_empty() {
                info!("No serial ports found");
            }
            for port in ports {
                println!("{}", port.display_label());
            }
            Ok(())
        }
    }
}

type Links = (Box<dyn ConsoleSource>, Box<dyn RadioLink>, Box<dyn RadioLink>);

fn open_serial_links(settings: &BridgeSettings) -> anyhow::Result<Links> {
    let console = SerialConsole::open(&settings.console)
        .with_context(|| format!("Failed to open console port {}", settings.console.port))?;
    let radio_a = SerialRadio::open(&settings.radio_a)
        .with_context(|| format!("Failed to open radio A port {}", settings.radio_a.port))?;
    let radio_b = SerialRadio::open(&settings.radio_b)
        .with_context(|| format!("Failed to open radio B port {}", settings.radio_b.port))?;

    Ok((Box::new(console), Box::new(radio_a), Box::new(radio_b)))
}

fn open_simulated_links(settings: &BridgeSettings) -> anyhow::Result<Links> {
    let console = VirtualConsole::new();
    let [config_a, config_b] = settings.virtual_radios.clone();
    let radio_a = VirtualRadio::from_config(config_a);
    let radio_b = VirtualRadio::from_config(config_b);

    let feeder = console.clone();
    thread::Builder::new()
        .name("teamlink-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => feeder.push_line(&line),
                    Err(e) => {
                        warn!("stdin closed: {}", e);
                        break;
                    }
                }
            }
        })
        .context("Failed to start stdin reader")?;

    info!(
        "Simulating radios '{}' and '{}'; type <team>:<payload> lines on stdin",
        radio_a.id(),
        radio_b.id()
    );

    Ok((Box::new(console), Box::new(radio_a), Box::new(radio_b)))
}

fn run(settings: BridgeSettings) -> anyhow::Result<()> {
    info!("Starting teamlink router");

    let (console, radio_a, radio_b) = if settings.simulate {
        open_simulated_links(&settings)?
    } else {
        open_serial_links(&settings)?
    };

    let ctx = Arc::new(RouterContext::new(settings.router.clone())?);

    {
        let ctx = ctx.clone();
        ctrlc::set_handler(move || {
            info!("Shutdown requested");
            ctx.stop();
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    let handle = Router::spawn(ctx.clone(), console, RadioPair::new(radio_a, radio_b))?;

    while ctx.is_running() && !handle.is_finished() {
        thread::sleep(SUPERVISE_INTERVAL);
    }

    if ctx.is_running() {
        warn!("A router thread exited unexpectedly");
    }

    handle.shutdown()?;
    info!("teamlink stopped");
    Ok(())
}
