mod cli;
mod orchestrator;

use clap::Parser;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();
    let cli = cli::Cli::parse();

    match orchestrator::run(&cli.config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("infobserver: fatal error: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}
