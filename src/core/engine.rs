//! Migration engine — filesystem moves and cross-file reference rewrites.
//!
//! Every operation returns a [`MigrationResult`]; underlying I/O errors are
//! captured into failed results and never raised past the engine boundary.
//! Dry-run mode performs the same precondition checks as a live run and
//! produces identical verdicts, but never touches the filesystem.

use crate::core::index::ReferenceIndex;
use crate::core::project::file_stem;
use crate::core::renamer::{DelegateRenamer, DelegateTool, NamespaceRenamer, TextRenamer};
use crate::utils::io;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of one migration operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl MigrationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        MigrationResult {
            success: true,
            message: message.into(),
            details: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        MigrationResult {
            success: false,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Executes migration operations against one workspace tree.
pub struct MigrationEngine {
    workspace_root: PathBuf,
    dry_run: bool,
    renamer: Box<dyn NamespaceRenamer>,
    index: ReferenceIndex,
}

impl MigrationEngine {
    /// The rename capability is chosen once here: delegate-backed when the
    /// external tool resolves, plain text substitution otherwise.
    pub fn new(workspace_root: impl Into<PathBuf>, dry_run: bool) -> Self {
        let workspace_root = workspace_root.into();
        let renamer: Box<dyn NamespaceRenamer> = match DelegateTool::resolve(&workspace_root) {
            Some(tool) => {
                log_status!("engine", "Using external rename delegate: {:?}", tool);
                Box::new(DelegateRenamer::new(tool, workspace_root.clone()))
            }
            None => Box::new(TextRenamer),
        };

        let index = ReferenceIndex::new(workspace_root.clone());
        MigrationEngine {
            workspace_root,
            dry_run,
            renamer,
            index,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Move a folder. Fails when the source is missing or the target exists.
    pub fn move_folder(&self, source: &Path, target: &Path) -> MigrationResult {
        self.move_entry(source, target, "folder")
    }

    /// Move a file. Fails when the source is missing or the target exists.
    pub fn move_file(&self, source: &Path, target: &Path) -> MigrationResult {
        self.move_entry(source, target, "file")
    }

    fn move_entry(&self, source: &Path, target: &Path, kind: &str) -> MigrationResult {
        let source_abs = self.absolute(source);
        let target_abs = self.absolute(target);

        log_status!(
            "engine",
            "Moving {}: {} -> {}",
            kind,
            source.display(),
            target.display()
        );

        if !source_abs.exists() {
            return MigrationResult::failed(format!(
                "Source {} does not exist: {}",
                kind,
                source.display()
            ));
        }

        if target_abs.exists() {
            return MigrationResult::failed(format!(
                "Target {} already exists: {}",
                kind,
                target.display()
            ));
        }

        if self.dry_run {
            return MigrationResult::ok(format!(
                "[dry run] Would move: {} -> {}",
                source.display(),
                target.display()
            ));
        }

        if let Some(parent) = target_abs.parent() {
            if let Err(e) = io::ensure_directory(parent) {
                return MigrationResult::failed(format!("Failed to move {}: {}", kind, e));
            }
        }

        match fs::rename(&source_abs, &target_abs) {
            Ok(()) => MigrationResult::ok(format!(
                "Moved: {} -> {}",
                source.display(),
                target.display()
            )),
            Err(e) => MigrationResult::failed(format!("Failed to move {}: {}", kind, e)),
        }
    }

    /// Replace every literal occurrence of `old_ref` with `new_ref` in a
    /// project file. No match is still success, with an informational message.
    pub fn update_project_reference(
        &self,
        project_path: &Path,
        old_ref: &str,
        new_ref: &str,
    ) -> MigrationResult {
        let project_abs = self.absolute(project_path);

        log_status!(
            "engine",
            "Updating reference in {}: {} -> {}",
            project_path.display(),
            old_ref,
            new_ref
        );

        if !project_abs.exists() {
            return MigrationResult::failed(format!(
                "Project file does not exist: {}",
                project_path.display()
            ));
        }

        if self.dry_run {
            return MigrationResult::ok(format!(
                "[dry run] Would update reference in {}",
                project_path.display()
            ));
        }

        let content = match io::read_file(&project_abs) {
            Ok(content) => content,
            Err(e) => {
                return MigrationResult::failed(format!("Failed to update reference: {}", e))
            }
        };

        let updated = content.replace(old_ref, new_ref);
        if updated == content {
            return MigrationResult::ok(format!(
                "No changes needed in {}",
                project_path.display()
            ));
        }

        match io::write_file(&project_abs, &updated) {
            Ok(()) => MigrationResult::ok(format!(
                "Updated reference in {}",
                project_path.display()
            )),
            Err(e) => MigrationResult::failed(format!("Failed to update reference: {}", e)),
        }
    }

    /// Rewrite a project path inside a solution file. The solution format
    /// favors backslashes, so both fragments are normalized to backslashes
    /// first; when nothing matches, the forward-slash forms are retried.
    pub fn update_solution_project_path(
        &self,
        solution_path: &Path,
        old_path: &str,
        new_path: &str,
    ) -> MigrationResult {
        let solution_abs = self.absolute(solution_path);

        log_status!(
            "engine",
            "Updating solution {}: {} -> {}",
            solution_path.display(),
            old_path,
            new_path
        );

        if !solution_abs.exists() {
            return MigrationResult::failed(format!(
                "Solution file does not exist: {}",
                solution_path.display()
            ));
        }

        if self.dry_run {
            return MigrationResult::ok(format!(
                "[dry run] Would update solution {}",
                solution_path.display()
            ));
        }

        let content = match io::read_file(&solution_abs) {
            Ok(content) => content,
            Err(e) => return MigrationResult::failed(format!("Failed to update solution: {}", e)),
        };

        let mut updated = content.replace(
            &old_path.replace('/', "\\"),
            &new_path.replace('/', "\\"),
        );
        if updated == content {
            updated = content.replace(
                &old_path.replace('\\', "/"),
                &new_path.replace('\\', "/"),
            );
        }

        if updated == content {
            return MigrationResult::ok(format!(
                "No changes needed in {}",
                solution_path.display()
            ));
        }

        match io::write_file(&solution_abs, &updated) {
            Ok(()) => MigrationResult::ok(format!(
                "Updated project path in {}",
                solution_path.display()
            )),
            Err(e) => MigrationResult::failed(format!("Failed to update solution: {}", e)),
        }
    }

    /// Rename a namespace in one source file through the configured rename
    /// capability (delegate when available, text substitution otherwise).
    pub fn rename_namespace(
        &self,
        file_path: &Path,
        old_namespace: &str,
        new_namespace: &str,
    ) -> MigrationResult {
        let file_abs = self.absolute(file_path);

        log_status!(
            "engine",
            "Renaming namespace in {}: {} -> {}",
            file_path.display(),
            old_namespace,
            new_namespace
        );

        if !file_abs.exists() {
            return MigrationResult::failed(format!(
                "File does not exist: {}",
                file_path.display()
            ));
        }

        if self.dry_run {
            return MigrationResult::ok(format!(
                "[dry run] Would rename namespace in {}",
                file_path.display()
            ));
        }

        self.renamer.rename(&file_abs, old_namespace, new_namespace)
    }

    /// Projects whose text references the moved project's file stem.
    pub fn find_affected_projects(&self, moved_project_path: &Path) -> Vec<PathBuf> {
        self.index
            .find_referencing_projects(&file_stem(moved_project_path))
    }

    /// Every solution file under the workspace root.
    pub fn find_solution_files(&self) -> Vec<PathBuf> {
        self.index.find_all_solutions()
    }

    /// Workspace-relative paths are resolved against the root; absolute
    /// paths pass through.
    fn absolute(&self, path: &Path) -> PathBuf {
        self.workspace_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn read(root: &Path, rel: &str) -> String {
        std::fs::read_to_string(root.join(rel)).unwrap()
    }

    #[test]
    fn move_folder_moves_contents() {
        let dir = tempdir().unwrap();
        write(dir.path(), "test/Old/Old.csproj", "<Project/>");

        let engine = MigrationEngine::new(dir.path(), false);
        let result = engine.move_folder(Path::new("test/Old"), Path::new("test/Unit/Old"));

        assert!(result.success, "{}", result.message);
        assert!(!dir.path().join("test/Old").exists());
        assert!(dir.path().join("test/Unit/Old/Old.csproj").exists());
    }

    #[test]
    fn move_folder_fails_when_source_missing() {
        let dir = tempdir().unwrap();
        let engine = MigrationEngine::new(dir.path(), false);

        let result = engine.move_folder(Path::new("gone"), Path::new("elsewhere"));
        assert!(!result.success);
        assert!(result.message.contains("does not exist"));
    }

    #[test]
    fn move_folder_fails_when_target_exists() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/x.txt", "x");
        write(dir.path(), "b/y.txt", "y");

        let engine = MigrationEngine::new(dir.path(), false);
        let result = engine.move_folder(Path::new("a"), Path::new("b"));
        assert!(!result.success);
        assert!(result.message.contains("already exists"));
    }

    #[test]
    fn repeating_a_move_fails_with_missing_source() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/f.txt", "f");

        let engine = MigrationEngine::new(dir.path(), false);
        assert!(engine.move_folder(Path::new("src"), Path::new("dst")).success);

        let again = engine.move_folder(Path::new("src"), Path::new("dst"));
        assert!(!again.success);
        assert!(again.message.contains("does not exist"));
    }

    #[test]
    fn dry_run_checks_preconditions_without_mutating() {
        let dir = tempdir().unwrap();
        write(dir.path(), "test/Old/Old.csproj", "<Project/>");

        let engine = MigrationEngine::new(dir.path(), true);
        let result = engine.move_folder(Path::new("test/Old"), Path::new("test/Unit/Old"));

        assert!(result.success);
        assert!(result.message.contains("[dry run]"));
        assert!(dir.path().join("test/Old").exists());
        assert!(!dir.path().join("test/Unit").exists());
    }

    #[test]
    fn dry_run_and_live_agree_on_failing_preconditions() {
        let dir = tempdir().unwrap();
        write(dir.path(), "occupied/x.txt", "x");
        write(dir.path(), "source/y.txt", "y");

        let live = MigrationEngine::new(dir.path(), false);
        let dry = MigrationEngine::new(dir.path(), true);

        // Missing source: identical verdicts.
        let live_missing = live.move_folder(Path::new("gone"), Path::new("dst"));
        let dry_missing = dry.move_folder(Path::new("gone"), Path::new("dst"));
        assert_eq!(live_missing.success, dry_missing.success);
        assert!(dry_missing.message.contains("does not exist"));

        // Existing target: identical verdicts, nothing mutated by dry run.
        let live_collision = live.move_folder(Path::new("source"), Path::new("occupied"));
        let dry_collision = dry.move_folder(Path::new("source"), Path::new("occupied"));
        assert_eq!(live_collision.success, dry_collision.success);
        assert!(dir.path().join("source/y.txt").exists());
    }

    #[test]
    fn move_file_moves_a_single_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/Program.cs", "class P { }");

        let engine = MigrationEngine::new(dir.path(), false);
        let result = engine.move_file(Path::new("a/Program.cs"), Path::new("b/Program.cs"));

        assert!(result.success);
        assert!(dir.path().join("b/Program.cs").exists());
        assert!(!dir.path().join("a/Program.cs").exists());
    }

    #[test]
    fn update_project_reference_end_to_end() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "A/A.csproj",
            "<Project>\n  <ItemGroup>\n    <ProjectReference Include=\"..\\B\\B.csproj\" />\n  </ItemGroup>\n</Project>\n",
        );

        let engine = MigrationEngine::new(dir.path(), false);
        let result = engine.update_project_reference(
            Path::new("A/A.csproj"),
            "..\\B\\B.csproj",
            "..\\sub\\B\\B.csproj",
        );

        assert!(result.success);
        let content = read(dir.path(), "A/A.csproj");
        assert!(content.contains("..\\sub\\B\\B.csproj"));
        assert!(!content.contains("Include=\"..\\B\\B.csproj\""));
    }

    #[test]
    fn update_project_reference_no_match_is_success() {
        let dir = tempdir().unwrap();
        write(dir.path(), "A/A.csproj", "<Project/>");

        let engine = MigrationEngine::new(dir.path(), false);
        let result =
            engine.update_project_reference(Path::new("A/A.csproj"), "missing", "whatever");

        assert!(result.success);
        assert!(result.message.contains("No changes needed"));
    }

    #[test]
    fn update_solution_path_normalizes_to_backslashes_first() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "App.sln",
            "Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"B\", \"test\\B\\B.csproj\", \"{AAAAAAAA-1111-2222-3333-BBBBBBBBBBBB}\"\nEndProject\n",
        );

        let engine = MigrationEngine::new(dir.path(), false);
        // Caller passes forward slashes; the backslash-normalized form matches.
        let result = engine.update_solution_project_path(
            Path::new("App.sln"),
            "test/B/B.csproj",
            "test/Unit/B/B.csproj",
        );

        assert!(result.success);
        let content = read(dir.path(), "App.sln");
        assert!(content.contains("test\\Unit\\B\\B.csproj"));
        assert!(!content.contains("\"test\\B\\B.csproj\""));
    }

    #[test]
    fn update_solution_path_retries_forward_slashes() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "App.sln",
            "Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"B\", \"test/B/B.csproj\", \"{AAAAAAAA-1111-2222-3333-BBBBBBBBBBBB}\"\nEndProject\n",
        );

        let engine = MigrationEngine::new(dir.path(), false);
        let result = engine.update_solution_project_path(
            Path::new("App.sln"),
            "test\\B\\B.csproj",
            "test\\Unit\\B\\B.csproj",
        );

        assert!(result.success);
        assert!(read(dir.path(), "App.sln").contains("test/Unit/B/B.csproj"));
    }

    #[test]
    fn rename_namespace_text_fallback_end_to_end() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "src/Widget.cs",
            "using Old.Utils;\n\nnamespace Old;\n\npublic class Widget { }\n",
        );

        let engine = MigrationEngine::new(dir.path(), false);
        let result = engine.rename_namespace(Path::new("src/Widget.cs"), "Old", "New");

        assert!(result.success, "{}", result.message);
        let content = read(dir.path(), "src/Widget.cs");
        assert!(content.contains("namespace New;"));
        assert!(content.contains("using New.Utils;"));
        assert!(!content.contains("namespace Old"));
        assert!(!content.contains("using Old"));
    }

    #[test]
    fn rename_namespace_missing_file_fails() {
        let dir = tempdir().unwrap();
        let engine = MigrationEngine::new(dir.path(), false);
        let result = engine.rename_namespace(Path::new("gone.cs"), "Old", "New");
        assert!(!result.success);
        assert!(result.message.contains("does not exist"));
    }

    #[cfg(unix)]
    #[test]
    fn delegate_json_output_becomes_details() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let bin_dir = dir.path().join("tools/Deploy/bin/migration-tool-cli");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let exe = bin_dir.join("migration-tool-cli");
        std::fs::write(&exe, "#!/bin/sh\necho '{\"renamed\": 1}'\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        write(dir.path(), "src/A.cs", "namespace Old;\n");

        let engine = MigrationEngine::new(dir.path(), false);
        let result = engine.rename_namespace(Path::new("src/A.cs"), "Old", "New");

        assert!(result.success);
        assert_eq!(result.details.unwrap()["renamed"], 1);
        // The delegate was trusted, so the file was left to it.
        assert_eq!(read(dir.path(), "src/A.cs"), "namespace Old;\n");
    }

    #[cfg(unix)]
    #[test]
    fn failing_delegate_falls_back_to_text_substitution() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let bin_dir = dir.path().join("tools/Deploy/bin/migration-tool-cli");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let exe = bin_dir.join("migration-tool-cli");
        std::fs::write(&exe, "#!/bin/sh\necho 'boom' >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        write(dir.path(), "src/A.cs", "namespace Old;\n");

        let engine = MigrationEngine::new(dir.path(), false);
        let result = engine.rename_namespace(Path::new("src/A.cs"), "Old", "New");

        assert!(result.success);
        assert_eq!(read(dir.path(), "src/A.cs"), "namespace New;\n");
    }

    #[test]
    fn find_affected_projects_uses_the_file_stem() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "A/A.csproj",
            "<Project><ItemGroup><ProjectReference Include=\"..\\B\\B.csproj\" /></ItemGroup></Project>",
        );
        write(dir.path(), "B/B.csproj", "<Project/>");

        let engine = MigrationEngine::new(dir.path(), false);
        let affected = engine.find_affected_projects(Path::new("B/B.csproj"));

        assert!(affected.contains(&PathBuf::from("A/A.csproj")));
    }

    #[test]
    fn find_solution_files_enumerates_workspace() {
        let dir = tempdir().unwrap();
        write(dir.path(), "App.sln", "");
        write(dir.path(), "tools/Legacy.sln", "");

        let engine = MigrationEngine::new(dir.path(), false);
        assert_eq!(engine.find_solution_files().len(), 2);
    }
}
