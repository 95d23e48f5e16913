use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use scratch_converter_lib::{config, ChatCompletionClient, Relay, RelayConfig};

#[derive(Parser)]
#[command(
    name = "scratch-relay",
    version,
    about = "Serve a chat page that relays messages to the completion endpoint"
)]
struct Cli {
    /// Address to listen on (overrides RELAY_ADDR)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

async fn run(cli: Cli) -> Result<()> {
    config::load_dotenv();
    let relay_config = RelayConfig::from_env()?;
    let bind = cli.bind.unwrap_or(relay_config.bind);

    let client = ChatCompletionClient::new(relay_config.completion)?;
    let relay = Arc::new(Relay::new(Arc::new(client), relay_config.system_prompt));

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("cannot listen on {bind}"))?;
    println!("Chat relay running on http://{bind}/");
    scratch_converter_lib::serve(listener, relay).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    scratch_converter_lib::init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
