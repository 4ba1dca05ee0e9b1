use clap::Parser;
use tracing_subscriber::EnvFilter;

use credvault::cli::commands;
use credvault::cli::{output, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(if cli.verbose { "debug" } else { "warn" });

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli).await,
        Commands::Add {
            ref domain,
            ref username,
            ref password,
            generate,
            length,
        } => {
            commands::add::execute(
                &cli,
                domain,
                username,
                password.as_deref(),
                generate,
                length,
            )
            .await
        }
        Commands::List { show_passwords } => commands::list::execute(&cli, show_passwords).await,
        Commands::Remove { index, force } => commands::remove::execute(&cli, index, force).await,
        Commands::Generate { length } => commands::generate::execute(&cli, length),
        Commands::RotateKey => commands::rotate::execute(&cli).await,
        #[cfg(feature = "audit-log")]
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Logs go to stderr so `generate` output stays pipeable.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
