//! Workspace-wide reference queries.
//!
//! Reference lookup is a deliberately coarse textual containment check over
//! raw project-file text: it survives both project-file reference dialects
//! and tolerates hand-edited markup, at the cost of substring false
//! positives. Queries never fail; an empty list is the only "nothing found".

use crate::utils::io;
use std::path::{Path, PathBuf};

/// Query layer over every build/solution file under a workspace root.
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    workspace_root: PathBuf,
}

impl ReferenceIndex {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        ReferenceIndex {
            workspace_root: workspace_root.into(),
        }
    }

    /// Every .csproj whose raw text contains `project_name` as a substring,
    /// relative to the workspace root. Unreadable files are skipped.
    pub fn find_referencing_projects(&self, project_name: &str) -> Vec<PathBuf> {
        let mut affected = Vec::new();

        for csproj in io::find_files(&self.workspace_root, "csproj", true) {
            let Some(content) = io::read_file_lossy(&csproj) else {
                continue;
            };
            if content.contains(project_name) {
                affected.push(self.relativize(&csproj));
            }
        }

        affected
    }

    /// Every .sln under the workspace root, relative to it.
    pub fn find_all_solutions(&self) -> Vec<PathBuf> {
        io::find_files(&self.workspace_root, "sln", true)
            .iter()
            .map(|p| self.relativize(p))
            .collect()
    }

    fn relativize(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.workspace_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
