use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use log::info;
use kpmqt::{ model::Model, observables };

/// Linear-scaling quantum transport: DOS, VAC, and MSD by the kernel
/// polynomial method.
#[derive(Parser, Debug)]
#[command(name = "kpmqt")]
struct Cli {
    /// Directory holding para.in, energy.in, neighbor.in, and friends.
    input_dir: PathBuf,
    /// Directory for dos.out, vac.out, and msd.out [default: the input
    /// directory].
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Seed for the random-phase vectors, overriding para.in.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"))
        .init();
    let cli = Cli::parse();

    let mut model = Model::from_dir(&cli.input_dir)
        .with_context(|| format!("failed to load model from {}", cli.input_dir.display()))?;
    if let Some(seed) = cli.seed { model.reseed(seed); }
    let output_dir = cli.output_dir.unwrap_or_else(|| cli.input_dir.clone());
    observables::run(&mut model, &output_dir)?;
    info!("results written to {}", output_dir.display());
    Ok(())
}
