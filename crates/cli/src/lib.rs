pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::permissions::PermissionsArgs;

#[derive(Debug, Parser)]
#[command(
    name = "portico",
    about = "Portico operator CLI",
    long_about = "Inspect Portico gateway configuration, run readiness checks, and evaluate request capabilities.",
    after_help = "Examples:\n  portico doctor --json\n  portico config\n  portico permissions --role mentor --actor-id u1 --status approved"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, backend URL shape, and backend reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Evaluate the capability set for an actor against a request from the command line"
    )]
    Permissions(PermissionsArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Permissions(args) => commands::permissions::run(args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
