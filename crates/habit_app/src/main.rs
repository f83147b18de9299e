use clap::Parser;
use habit_app::{
    cli::{run, Cli},
    config::AppConfig,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().unwrap_or_default();
    cli.apply_to(&mut config);

    let mut stdout = std::io::stdout().lock();
    if let Err(err) = run(cli.command, &config, &mut stdout) {
        eprintln!("habit_tracker: {err:#}");
        std::process::exit(1);
    }
}
