mod commands;
mod dispatch;
mod helpers;

use clap::Parser;
use dispatch::command_alias_from_program_name;
use febpost_core::domain::PostError;

pub fn run_from_env() -> i32 {
    helpers::init_tracing();

    let mut args = std::env::args();
    let program_name = args.next().unwrap_or_else(|| "febpost".to_string());
    let remaining: Vec<String> = args.collect();

    match run_with_program_name(&program_name, remaining) {
        Ok(code) => code,
        Err(error) => {
            let stage_error = error.as_post_error();
            eprintln!("{}", stage_error.diagnostic_line());
            if let Some(summary_line) = stage_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            stage_error.exit_code()
        }
    }
}

fn run_with_program_name(program_name: &str, args: Vec<String>) -> Result<i32, CliError> {
    if let Some(alias_command) = command_alias_from_program_name(program_name) {
        let full_args = std::iter::once("febpost".to_string())
            .chain(std::iter::once(alias_command.to_string()))
            .chain(args)
            .collect::<Vec<_>>();
        return parse_and_dispatch(full_args);
    }

    let full_args = std::iter::once("febpost".to_string())
        .chain(args)
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "febpost", about = "FEBio bending-simulation post-processing")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Parse a raw FEBio step report into a delimited table
    Extract(commands::ExtractArgs),
    /// Append the force-magnitude column to an extracted table
    Force(commands::ForceArgs),
    /// Append the relative-displacement column to an extracted table
    Displacement(commands::DisplacementArgs),
    /// Append work-increment columns derived from force and displacement
    Work(commands::WorkArgs),
    /// Sum work increments into fixed-width bending cycles
    Hysteresis(commands::HysteresisArgs),
    /// Fit cycle work against period and report the period of maximal work
    #[command(name = "max-period")]
    MaxPeriod(commands::MaxPeriodArgs),
    /// Run the extract, displacement, force, and work stages in sequence
    Chain(commands::ChainArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Extract(args) => commands::run_extract_command(args),
        CliCommand::Force(args) => commands::run_force_command(args),
        CliCommand::Displacement(args) => commands::run_displacement_command(args),
        CliCommand::Work(args) => commands::run_work_command(args),
        CliCommand::Hysteresis(args) => commands::run_hysteresis_command(args),
        CliCommand::MaxPeriod(args) => commands::run_max_period_command(args),
        CliCommand::Chain(args) => commands::run_chain_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Stage(PostError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_post_error(&self) -> PostError {
        match self {
            Self::Usage(message) => {
                PostError::configuration("INPUT.CLI_USAGE", message.clone())
            }
            Self::Stage(error) => error.clone(),
            Self::Internal(error) => PostError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
