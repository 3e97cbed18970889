use clap::{Args, Subcommand};
use serde::Serialize;

use slnshift::{MigrationEngine, MigrationPlan, MigrationStep, PlanOutcome};

use super::CmdResult;

#[derive(Args)]
pub struct PlanArgs {
    #[command(subcommand)]
    command: PlanCommand,
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Execute a plan file step by step
    Run {
        /// Path to the plan JSON file
        path: String,
        /// Workspace root paths are resolved against
        #[arg(long, default_value = ".")]
        workspace: String,
        /// Check preconditions and report without touching anything
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Write step statuses back to the plan file afterwards
        #[arg(long)]
        save: bool,
    },
    /// Show the steps of a plan file without executing
    Show {
        /// Path to the plan JSON file
        path: String,
    },
}

#[derive(Serialize)]
pub struct PlanRunOutput {
    command: String,
    plan: String,
    dry_run: bool,
    #[serde(flatten)]
    outcome: PlanOutcome,
    steps: Vec<MigrationStep>,
}

#[derive(Serialize)]
pub struct PlanShowOutput {
    command: String,
    plan: String,
    step_count: usize,
    steps: Vec<MigrationStep>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum PlanOutput {
    Run(PlanRunOutput),
    Show(PlanShowOutput),
}

pub fn run(args: PlanArgs) -> CmdResult<PlanOutput> {
    match args.command {
        PlanCommand::Run {
            path,
            workspace,
            dry_run,
            save,
        } => {
            let mut plan = MigrationPlan::load(&path)?;
            let engine = MigrationEngine::new(&workspace, dry_run);
            let outcome = plan.execute(&engine);

            if save && !dry_run {
                plan.save(&path)?;
            }

            let exit_code = if outcome.success { 0 } else { 1 };
            Ok((
                PlanOutput::Run(PlanRunOutput {
                    command: "plan.run".to_string(),
                    plan: path,
                    dry_run,
                    outcome,
                    steps: plan.steps,
                }),
                exit_code,
            ))
        }
        PlanCommand::Show { path } => {
            let plan = MigrationPlan::load(&path)?;

            Ok((
                PlanOutput::Show(PlanShowOutput {
                    command: "plan.show".to_string(),
                    plan: path,
                    step_count: plan.steps.len(),
                    steps: plan.steps,
                }),
                0,
            ))
        }
    }
}
