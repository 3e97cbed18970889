use clap::Args;
use serde::Serialize;

use slnshift::core::index::ReferenceIndex;

use super::CmdResult;

#[derive(Args)]
pub struct AffectedArgs {
    /// Project name to look up
    project_name: String,
    /// Workspace root to search under
    #[arg(long, default_value = ".")]
    workspace: String,
}

#[derive(Args)]
pub struct SolutionsArgs {
    /// Workspace root to search under
    #[arg(long, default_value = ".")]
    workspace: String,
}

#[derive(Serialize)]
pub struct AffectedOutput {
    command: String,
    project_name: String,
    workspace: String,
    affected: Vec<String>,
    affected_count: usize,
}

#[derive(Serialize)]
pub struct SolutionsOutput {
    command: String,
    workspace: String,
    solutions: Vec<String>,
    solution_count: usize,
}

pub fn run_affected(args: AffectedArgs) -> CmdResult<AffectedOutput> {
    let index = ReferenceIndex::new(&args.workspace);
    let affected: Vec<String> = index
        .find_referencing_projects(&args.project_name)
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let affected_count = affected.len();

    Ok((
        AffectedOutput {
            command: "affected".to_string(),
            project_name: args.project_name,
            workspace: args.workspace,
            affected,
            affected_count,
        },
        0,
    ))
}

pub fn run_solutions(args: SolutionsArgs) -> CmdResult<SolutionsOutput> {
    let index = ReferenceIndex::new(&args.workspace);
    let solutions: Vec<String> = index
        .find_all_solutions()
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let solution_count = solutions.len();

    Ok((
        SolutionsOutput {
            command: "solutions".to_string(),
            workspace: args.workspace,
            solutions,
            solution_count,
        },
        0,
    ))
}
