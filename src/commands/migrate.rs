use clap::{Args, Subcommand};
use serde::Serialize;

use slnshift::{MigrationEngine, MigrationResult};
use std::path::Path;

use super::CmdResult;

#[derive(Args)]
pub struct MigrateArgs {
    /// Workspace root paths are resolved against
    #[arg(long, default_value = ".")]
    workspace: String,
    /// Check preconditions and report without touching anything
    #[arg(short = 'n', long)]
    dry_run: bool,
    #[command(subcommand)]
    command: MigrateCommand,
}

#[derive(Subcommand)]
enum MigrateCommand {
    /// Move a single file
    MoveFile {
        /// Current path, relative to the workspace
        source: String,
        /// New path, relative to the workspace
        target: String,
    },
    /// Move a folder and its contents
    MoveFolder {
        /// Current path, relative to the workspace
        source: String,
        /// New path, relative to the workspace
        target: String,
    },
    /// Rewrite a reference path inside a project file
    UpdateRef {
        /// Project file to edit
        path: String,
        /// Reference fragment to replace
        #[arg(long)]
        old: String,
        /// Replacement fragment
        #[arg(long)]
        new: String,
    },
    /// Rewrite a project path inside a solution file
    UpdateSln {
        /// Solution file to edit
        path: String,
        /// Project path to replace
        #[arg(long)]
        old: String,
        /// Replacement project path
        #[arg(long)]
        new: String,
    },
    /// Rename a namespace in a source file
    RenameNs {
        /// Source file to edit
        path: String,
        /// Namespace to rename
        #[arg(long)]
        old: String,
        /// New namespace
        #[arg(long)]
        new: String,
    },
}

#[derive(Serialize)]
pub struct MigrateOutput {
    command: String,
    workspace: String,
    dry_run: bool,
    #[serde(flatten)]
    result: MigrationResult,
}

pub fn run(args: MigrateArgs) -> CmdResult<MigrateOutput> {
    let engine = MigrationEngine::new(&args.workspace, args.dry_run);

    let (command, result) = match &args.command {
        MigrateCommand::MoveFile { source, target } => (
            "migrate.move-file",
            engine.move_file(Path::new(source), Path::new(target)),
        ),
        MigrateCommand::MoveFolder { source, target } => (
            "migrate.move-folder",
            engine.move_folder(Path::new(source), Path::new(target)),
        ),
        MigrateCommand::UpdateRef { path, old, new } => (
            "migrate.update-ref",
            engine.update_project_reference(Path::new(path), old, new),
        ),
        MigrateCommand::UpdateSln { path, old, new } => (
            "migrate.update-sln",
            engine.update_solution_project_path(Path::new(path), old, new),
        ),
        MigrateCommand::RenameNs { path, old, new } => (
            "migrate.rename-ns",
            engine.rename_namespace(Path::new(path), old, new),
        ),
    };

    let exit_code = if result.success { 0 } else { 1 };
    Ok((
        MigrateOutput {
            command: command.to_string(),
            workspace: args.workspace,
            dry_run: args.dry_run,
            result,
        },
        exit_code,
    ))
}
