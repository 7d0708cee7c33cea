//! pcb-inspect - single-shot PCB defect inspection
//!
//! This binary:
//! 1. Loads gateway configuration from the environment (and optional file)
//! 2. Submits one image to the remote defect-inspection workflow
//! 3. Normalizes the response (visualization, verdict, class tally)
//! 4. Prints the inspection report (or JSON with `--json`)
//!
//! A failed gateway call still produces a report (with an `Error:` verdict)
//! and exit code 0; the process never crashes on a degraded inspection.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use pcb_inspect::{render_report, summary_line, GatewayClient, GatewayConfig};

#[derive(Parser, Debug)]
#[command(
    name = "pcb-inspect",
    about = "Submit a PCB photograph to the remote defect-inspection workflow"
)]
struct Args {
    /// Path to the PCB image to inspect
    #[arg(long, value_name = "FILE")]
    image: PathBuf,

    /// Where to save the annotated visualization (overrides configuration)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the normalized result as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = GatewayConfig::load()?;
    if let Some(output) = args.output {
        config.visualization_path = output;
    }

    log::info!(
        "inspecting {} (workspace={}, workflow={})",
        args.image.display(),
        config.workspace,
        config.workflow
    );

    let client = GatewayClient::new(&config);
    let result = client.inspect(&args.image);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_report(&result, &config.visualization_path));
    }
    log::info!("{}", summary_line(&result));

    Ok(())
}
