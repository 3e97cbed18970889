use clap::{Args, Subcommand};
use serde::Serialize;

use slnshift::{FileInfo, LexicalScanner, SourceAnalyzer};
use std::path::Path;

use super::CmdResult;

#[derive(Args)]
pub struct ScanArgs {
    #[command(subcommand)]
    command: ScanCommand,
}

#[derive(Subcommand)]
enum ScanCommand {
    /// Scan a single source file
    File {
        /// Path to the .cs file
        path: String,
    },
    /// Scan every source file under a directory
    Dir {
        /// Directory to scan
        path: String,
        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// Only report files that contain tests
        #[arg(long)]
        tests_only: bool,
    },
}

#[derive(Serialize)]
pub struct ScanFileOutput {
    command: String,
    test_count: usize,
    #[serde(flatten)]
    file: FileInfo,
}

#[derive(Serialize)]
pub struct ScanDirOutput {
    command: String,
    directory: String,
    file_count: usize,
    class_count: usize,
    test_count: usize,
    files: Vec<FileInfo>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ScanOutput {
    File(ScanFileOutput),
    Dir(ScanDirOutput),
}

pub fn run(args: ScanArgs) -> CmdResult<ScanOutput> {
    let scanner = LexicalScanner::new();

    match args.command {
        ScanCommand::File { path } => {
            let file = scanner.scan(Path::new(&path));

            Ok((
                ScanOutput::File(ScanFileOutput {
                    command: "scan.file".to_string(),
                    test_count: file.test_count(),
                    file,
                }),
                0,
            ))
        }
        ScanCommand::Dir {
            path,
            recursive,
            tests_only,
        } => {
            let mut files = scanner.scan_directory(Path::new(&path), recursive);
            if tests_only {
                files.retain(FileInfo::is_test_file);
            }

            let class_count = files.iter().map(FileInfo::class_count).sum();
            let test_count = files.iter().map(FileInfo::test_count).sum();

            Ok((
                ScanOutput::Dir(ScanDirOutput {
                    command: "scan.dir".to_string(),
                    directory: path,
                    file_count: files.len(),
                    class_count,
                    test_count,
                    files,
                }),
                0,
            ))
        }
    }
}
