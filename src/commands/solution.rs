use clap::{Args, Subcommand};
use serde::Serialize;

use slnshift::{Solution, SolutionParser};

use super::CmdResult;

#[derive(Args)]
pub struct SolutionArgs {
    #[command(subcommand)]
    command: SolutionCommand,
}

#[derive(Subcommand)]
enum SolutionCommand {
    /// Parse a solution file with full project metadata
    Parse {
        /// Path to the .sln file
        path: String,
        /// Parse each member project file as well
        #[arg(long)]
        deep: bool,
    },
    /// List member project names and paths only
    Paths {
        /// Path to the .sln file
        path: String,
    },
}

#[derive(Serialize)]
pub struct SolutionParseOutput {
    command: String,
    project_count: usize,
    test_project_count: usize,
    #[serde(flatten)]
    solution: Solution,
}

#[derive(Serialize)]
pub struct SolutionPathsOutput {
    command: String,
    solution: String,
    projects: Vec<SolutionPathEntry>,
}

#[derive(Serialize)]
pub struct SolutionPathEntry {
    name: String,
    path: String,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum SolutionOutput {
    Parse(SolutionParseOutput),
    Paths(SolutionPathsOutput),
}

pub fn run(args: SolutionArgs) -> CmdResult<SolutionOutput> {
    match args.command {
        SolutionCommand::Parse { path, deep } => {
            let mut solution = SolutionParser::new().parse(&path)?;

            if deep {
                let parser = slnshift::ProjectParser::new();
                for project in &mut solution.projects {
                    parser.enrich(project)?;
                }
            }

            let test_project_count = solution.test_projects().len();
            Ok((
                SolutionOutput::Parse(SolutionParseOutput {
                    command: "solution.parse".to_string(),
                    project_count: solution.project_count(),
                    test_project_count,
                    solution,
                }),
                0,
            ))
        }
        SolutionCommand::Paths { path } => {
            let pairs = SolutionParser::new().project_paths(&path)?;
            let projects = pairs
                .into_iter()
                .map(|(name, path)| SolutionPathEntry {
                    name,
                    path: path.display().to_string(),
                })
                .collect();

            Ok((
                SolutionOutput::Paths(SolutionPathsOutput {
                    command: "solution.paths".to_string(),
                    solution: path,
                    projects,
                }),
                0,
            ))
        }
    }
}
