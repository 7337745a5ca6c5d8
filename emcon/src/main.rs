//! # EMCON Binary
//!
//! Emergency lighting control: status checks, compliance reports and control
//! commands for DALI emergency gear.
//!
//! # Usage
//!
//! ```bash
//! # List configured gear
//! emcon -c config.toml list
//!
//! # Check every site, with per-gear detail
//! emcon -c config.toml check -v
//!
//! # HTML report for one site
//! emcon -c config.toml -s hq report --format html -o hq.html
//!
//! # Start a function test on one unit
//! emcon -c config.toml start-function-test hq/ground/3
//! ```

use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand};
use emcon::{Dispatcher, DriverRegistry, ReportFormat, SiteMonitor, TextReport, render};
use emcon_common::command::GearCommand;
use emcon_common::config::{ConfigLoader, EmconConfig, LogLevel};
use emcon_common::consts::DEFAULT_CONFIG_PATH;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Emergency lighting control
#[derive(Parser, Debug)]
#[command(name = "emcon")]
#[command(version)]
#[command(about = "Emergency lighting control and compliance reporting")]
#[command(long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Only work on this site (can be specified multiple times)
    #[arg(short, long = "site", action = clap::ArgAction::Append)]
    sites: Vec<String>,

    /// Display progress and per-gear detail while working
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct TargetArg {
    /// Target of this command: sitename[/busname[/address]]
    target: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all configured emergency gear
    List,
    /// Check all configured emergency gear and output a status summary
    Check,
    /// Render status reports for all selected sites
    Report {
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: ReportFormat,
        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Start or restart a ten-second identification procedure
    Identify(TargetArg),
    /// Start or restart the 15 minute Inhibit timer
    Inhibit(TargetArg),
    /// Enter Rest mode if currently in emergency mode
    Rest(TargetArg),
    /// Cancel the Inhibit timer, re-light if possible if power not present
    Reset(TargetArg),
    /// Request a function test
    StartFunctionTest(TargetArg),
    /// Request a duration test
    StartDurationTest(TargetArg),
    /// Cancel pending tests and stop any test currently in progress
    StopTest(TargetArg),
    /// Reset the "function test done and result valid" flag
    ResetFunctionTestDone(TargetArg),
    /// Reset the "duration test done and result valid" flag
    ResetDurationTestDone(TargetArg),
    /// Reset the lamp emergency time and lamp total operation time counters
    ResetLampTime(TargetArg),
}

impl Command {
    /// Bus command and its target, for the control subcommands.
    fn gear_command(&self) -> Option<(GearCommand, &str)> {
        let (command, arg) = match self {
            Self::List | Self::Check | Self::Report { .. } => return None,
            Self::Identify(t) => (GearCommand::Identify, t),
            Self::Inhibit(t) => (GearCommand::Inhibit, t),
            Self::Rest(t) => (GearCommand::Rest, t),
            Self::Reset(t) => (GearCommand::Reset, t),
            Self::StartFunctionTest(t) => (GearCommand::StartFunctionTest, t),
            Self::StartDurationTest(t) => (GearCommand::StartDurationTest, t),
            Self::StopTest(t) => (GearCommand::StopTest, t),
            Self::ResetFunctionTestDone(t) => (GearCommand::ResetFunctionTestDone, t),
            Self::ResetDurationTestDone(t) => (GearCommand::ResetDurationTestDone, t),
            Self::ResetLampTime(t) => (GearCommand::ResetLampTime, t),
        };
        Some((command, arg.target.as_str()))
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("emcon: error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the command ran but something is not passing.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = EmconConfig::load(&args.config);
    setup_tracing(&args, loaded.as_ref().ok().map(|c| c.shared.log_level));

    let config = loaded
        .map_err(|e| format!("Could not open config file '{}': {}", args.config.display(), e))?;
    config.validate()?;
    info!(
        "EMCON v{} loaded {} sites from {}",
        env!("CARGO_PKG_VERSION"),
        config.sites.len(),
        args.config.display()
    );

    let config_dir = args
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let registry = DriverRegistry::with_builtin();
    let sites = config.select_sites(&args.sites)?;

    if let Some((command, target)) = args.command.gear_command() {
        let dispatcher = Dispatcher::new(&config, &registry, config_dir);
        let buses = dispatcher.send_to(command, target)?;
        info!("Sent {} on {} bus(es)", command, buses);
        return Ok(true);
    }

    match &args.command {
        Command::List => {
            for site in &sites {
                for gear in &site.gear {
                    println!("{}/{}/{}: {}", site.id, gear.bus, gear.address, gear.name);
                }
            }
            Ok(true)
        }
        Command::Check => {
            let monitor = SiteMonitor::new(&registry, config_dir);
            let run = monitor.check_all(&sites, Utc::now());
            for report in &run.reports {
                print!("{}", TextReport::new(report).verbose(args.verbose));
            }
            for (site, e) in &run.skipped {
                println!("Site: {site}");
                println!("  - Skipped: {e}");
            }
            Ok(run.all_pass())
        }
        Command::Report { format, output } => {
            let monitor = SiteMonitor::new(&registry, config_dir);
            let run = monitor.check_all(&sites, Utc::now());
            let rendered = render(&run.reports, *format)?;
            match output {
                Some(path) => {
                    fs::write(path, rendered)?;
                    info!("Report written to {}", path.display());
                }
                None => print!("{rendered}"),
            }
            Ok(run.skipped.is_empty())
        }
        _ => Ok(true),
    }
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, configured: Option<LogLevel>) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.map(Level::from).unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_after_subcommand() {
        let args = Args::try_parse_from(["emcon", "-c", "demos/config.toml", "check", "-v"]).unwrap();
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Check));
        assert_eq!(args.config, PathBuf::from("demos/config.toml"));

        let args = Args::try_parse_from(["emcon", "-v", "list"]).unwrap();
        assert!(args.verbose);
    }

    #[test]
    fn control_command_target() {
        let args = Args::try_parse_from(["emcon", "-s", "hq", "start-function-test", "hq/ground/3"])
            .unwrap();
        assert_eq!(args.sites, vec!["hq".to_string()]);
        assert_eq!(
            args.command.gear_command(),
            Some((GearCommand::StartFunctionTest, "hq/ground/3"))
        );
        assert_eq!(Args::try_parse_from(["emcon", "check"]).unwrap().command.gear_command(), None);
    }

    #[test]
    fn report_format_defaults_to_text() {
        let args = Args::try_parse_from(["emcon", "report", "--format", "html"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Report { format: ReportFormat::Html, output: None }
        ));
        let args = Args::try_parse_from(["emcon", "report"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Report { format: ReportFormat::Text, .. }
        ));
    }
}
