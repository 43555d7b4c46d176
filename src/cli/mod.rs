// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with `clap` and routes each
// subcommand to its Layer 2 use case:
//
//   1. `train` — train (and optionally validate / test) a model
//   2. `test`  — evaluate a checkpoint on labelled pairs
//   3. `infer` — score unlabelled pairs with a checkpoint

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InferArgs, TestArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "simnet",
    version,
    about = "Train, test and run SimNet text-similarity models."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case; the CLI layer only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Test(args)  => run_test(args),
            Commands::Infer(args) => run_infer(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::debug!("arguments: {:#?}", args);
    tracing::info!("Training on: {}", args.train_data_dir);

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete after {} steps. Final model: {}",
        summary.global_step,
        summary.final_checkpoint.display()
    );
    Ok(())
}

fn run_test(args: TestArgs) -> Result<()> {
    use crate::application::test_use_case::TestUseCase;

    tracing::debug!("arguments: {:#?}", args);

    let report = TestUseCase::new(args.into()).execute()?;

    match report.accuracy {
        Some(acc) => println!("AUC: {:.6}  Accuracy: {:.6}", report.auc, acc),
        None      => println!("AUC: {:.6}", report.auc),
    }
    Ok(())
}

fn run_infer(args: InferArgs) -> Result<()> {
    use crate::application::infer_use_case::InferUseCase;

    tracing::debug!("arguments: {:#?}", args);

    let path = InferUseCase::new(args.into()).execute()?;

    println!("Predictions written to {}", path.display());
    Ok(())
}
