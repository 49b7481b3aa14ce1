use clap::Parser;
use tracing_subscriber::EnvFilter;

use keepsake::cli::{Cli, Commands};
use keepsake::KeepsakeError;

fn main() {
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Register => keepsake::cli::commands::auth::execute_register(&cli),
        Commands::Login => keepsake::cli::commands::auth::execute_login(&cli),
        Commands::List => keepsake::cli::commands::list::execute(&cli),
        Commands::Get {
            id,
            copy,
            ref output,
        } => keepsake::cli::commands::get::execute(&cli, id, copy, output.as_deref()),
        Commands::Add { ref kind } => keepsake::cli::commands::add::execute(&cli, kind),
        Commands::Update {
            id,
            ref title,
            ref metadata,
            contents,
            ref file,
        } => keepsake::cli::commands::update::execute(
            &cli,
            id,
            title.as_deref(),
            metadata.as_deref(),
            contents,
            file.as_deref(),
        ),
        Commands::Delete { id, force } => keepsake::cli::commands::delete::execute(&cli, id, force),
        Commands::Completions { ref shell } => keepsake::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by `KEEPSAKE_LOG` (default: warn).
fn init_logging() {
    let filter = EnvFilter::try_from_env("KEEPSAKE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(e: &KeepsakeError) {
    keepsake::cli::output::error(&e.to_string());
    let cause = e.root_cause();
    if !std::ptr::eq(cause, e) {
        keepsake::cli::output::error(&format!("caused by: {cause}"));
    }
}
