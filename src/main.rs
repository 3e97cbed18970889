use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{migrate, plan, project, scan, solution, workspace};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "slnshift")]
#[command(version = VERSION)]
#[command(about = "Static analysis and migration tooling for .NET workspaces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse solution files
    Solution(solution::SolutionArgs),
    /// Parse project files
    Project(project::ProjectArgs),
    /// Scan source files for namespaces, types and tests
    Scan(scan::ScanArgs),
    /// List projects that reference a given project
    Affected(workspace::AffectedArgs),
    /// List solution files under a workspace
    Solutions(workspace::SolutionsArgs),
    /// Run a single migration operation
    Migrate(migrate::MigrateArgs),
    /// Execute or inspect persisted migration plans
    Plan(plan::PlanArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = commands::run_json(cli.command);

    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
