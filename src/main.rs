use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use scratch_converter_lib::output::OUTPUT_FILE;
use scratch_converter_lib::util::expand_tilde;
use scratch_converter_lib::{config, ChatCompletionClient, CompletionConfig};

#[derive(Parser)]
#[command(
    name = "convert",
    version,
    about = "Convert Scratch 3 (.sb3) files to Pygame projects using AI"
)]
struct Cli {
    /// Path to the input .sb3 file
    archive: PathBuf,

    /// Output directory for the generated project
    #[arg(short, long, default_value = "output_pygame_project")]
    output: PathBuf,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

async fn run(cli: Cli) -> Result<()> {
    config::load_dotenv();
    let completion_config = CompletionConfig::from_env()?;
    let client = ChatCompletionClient::new(completion_config)?;

    let archive = expand_tilde(&cli.archive);
    let output = expand_tilde(&cli.output);

    println!(
        "Converting {} with {}...",
        archive.display(),
        client.model()
    );
    let conversion = scratch_converter_lib::convert(&archive, &output, &client).await?;

    println!(
        "Conversion successful! Pygame project saved in: {}",
        conversion.output_dir.display()
    );
    println!("To run, navigate to the directory and execute: python {OUTPUT_FILE}");
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
