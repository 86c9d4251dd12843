// at-stream -- send AT commands to a modem or radio module exposed over TCP
// (for example by a serial-to-TCP bridge) and print each response.
//
// Usage:
//   at-stream --connect 127.0.0.1:5000 VERSION
//   at-stream --connect 127.0.0.1:5000 SETVER '"version"' 2
//   at-stream --connect 127.0.0.1:5000 --script setup.yaml --timeout-ms 3000
//   RUST_LOG=at_stream_protocol=trace at-stream --connect 127.0.0.1:5000 CSQ

mod error;
mod runner;
mod script;

use std::net::TcpStream;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use at_stream_protocol::{SessionConfig, StreamTransport};
use clap::{ArgAction, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::CliAppError;
use crate::runner::{run_commands, ExchangeReport};
use crate::script::{Script, ScriptCommand};

/// Send AT commands over a TCP-bridged serial link.
#[derive(Parser, Debug)]
#[command(name = "at-stream", version, about)]
struct Cli {
    /// Address of the serial bridge (e.g. 127.0.0.1:5000).
    #[arg(long)]
    connect: String,

    /// YAML script of commands to run before any command given on the line.
    #[arg(long)]
    script: Option<PathBuf>,

    /// How long to wait for each response, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,

    /// Override the maximum response body size in bytes.
    #[arg(long)]
    max_response_len: Option<usize>,

    /// Override the maximum line size in bytes.
    #[arg(long)]
    max_line_len: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Command name (without `AT+`) followed by its arguments.
    /// Integers are sent bare, `null` as an empty field, anything else quoted.
    #[arg(allow_negative_numbers = true)]
    command: Vec<String>,
}

impl Cli {
    fn session_config(&self, script: &Script) -> SessionConfig {
        let mut config = script.session.unwrap_or_default();
        if let Some(len) = self.max_response_len {
            config = config.with_max_response_len(len);
        }
        if let Some(len) = self.max_line_len {
            config = config.with_max_line_len(len);
        }
        config
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<Vec<ExchangeReport>, CliAppError> {
    let script = match &cli.script {
        Some(path) => Script::load(path)?,
        None => Script::default(),
    };

    let mut commands = script.commands.clone();
    if let Some((name, args)) = cli.command.split_first() {
        commands.push(ScriptCommand::from_cli(name, args));
    }
    if commands.is_empty() {
        return Err(CliAppError::NoCommands);
    }

    let config = cli.session_config(&script);

    info!(address = %cli.connect, "connecting");
    let stream = TcpStream::connect(&cli.connect)?;
    stream.set_nodelay(true)?;
    stream.set_nonblocking(true)?;
    let mut transport = StreamTransport::new(stream);

    run_commands(
        &mut transport,
        config,
        &commands,
        Duration::from_millis(cli.timeout_ms),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let reports = match run(&cli) {
        Ok(reports) => reports,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut all_ok = true;
    for report in &reports {
        match report.outcome {
            Some(outcome) => println!("AT+{}: {}", report.command, outcome),
            None => println!("AT+{}: no response", report.command),
        }
        for line in report.body.lines() {
            println!("  {}", line);
        }
        all_ok &= report.succeeded();
    }

    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
