//! cfgmeta CLI
//!
//! Inspect a configuration manifest: describe definitions, check property
//! values and map managed object paths to directory names.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cfgmeta")]
#[command(about = "cfgmeta - Configuration metamodel inspection", long_about = None)]
struct Cli {
    #[command(flatten)]
    session: commands::SessionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Describe a managed object definition
    Describe(commands::describe::DescribeArgs),
    /// Decode and validate property values
    Check(commands::check::CheckArgs),
    /// Parse a managed object path and show its DN
    Path(commands::path::PathArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = commands::Session::open(&cli.session).and_then(|session| match cli.command {
        Commands::Describe(args) => commands::describe::execute(&session, args),
        Commands::Check(args) => commands::check::execute(&session, args),
        Commands::Path(args) => commands::path::execute(&session, args),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
