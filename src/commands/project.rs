use clap::{Args, Subcommand};
use serde::Serialize;

use slnshift::{Project, ProjectParser};

use super::CmdResult;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    command: ProjectCommand,
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Parse a project file
    Parse {
        /// Path to the .csproj file
        path: String,
    },
}

#[derive(Serialize)]
pub struct ProjectOutput {
    command: String,
    is_test_project: bool,
    #[serde(flatten)]
    project: Project,
}

pub fn run(args: ProjectArgs) -> CmdResult<ProjectOutput> {
    match args.command {
        ProjectCommand::Parse { path } => {
            let project = ProjectParser::new().parse(&path)?;

            Ok((
                ProjectOutput {
                    command: "project.parse".to_string(),
                    is_test_project: project.is_test_project(),
                    project,
                },
                0,
            ))
        }
    }
}
