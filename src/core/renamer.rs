//! Namespace-rename capability.
//!
//! Two implementations sit behind [`NamespaceRenamer`]: a delegate-backed
//! renamer that shells out to an external tool for higher-fidelity renames,
//! and a token-boundary text substitution fallback. The engine selects one at
//! construction time; the delegate renamer itself falls back to text
//! substitution when the tool fails or produces unreadable output.

use crate::core::engine::MigrationResult;
use crate::utils::io;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Subcommand the external delegate understands.
const DELEGATE_COMMAND: &str = "update-namespace";

/// Capability interface for renaming a namespace within one file.
pub trait NamespaceRenamer {
    fn rename(&self, file: &Path, old_namespace: &str, new_namespace: &str) -> MigrationResult;
}

/// Captured output of a delegate invocation.
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

/// Where the external delegate lives: a deployed binary, or a development
/// source project run through `dotnet run`.
#[derive(Debug, Clone)]
pub enum DelegateTool {
    Binary(PathBuf),
    Project(PathBuf),
}

impl DelegateTool {
    /// Resolve the delegate once: deployed binary first, then the
    /// development source project. `None` when neither exists.
    pub fn resolve(workspace_root: &Path) -> Option<Self> {
        let deployed = workspace_root
            .join("tools")
            .join("Deploy")
            .join("bin")
            .join("migration-tool-cli");
        let exe_name = if cfg!(windows) {
            "migration-tool-cli.exe"
        } else {
            "migration-tool-cli"
        };
        let exe = deployed.join(exe_name);
        if exe.exists() {
            return Some(DelegateTool::Binary(exe));
        }

        let dev_project = workspace_root
            .join("tools")
            .join("src")
            .join("MigrationTool.Cli");
        if dev_project.exists() {
            return Some(DelegateTool::Project(dev_project));
        }

        None
    }

    /// Run the delegate with the given arguments from the workspace root.
    pub fn run(&self, args: &[&str], workspace_root: &Path) -> CommandOutput {
        let mut cmd = match self {
            DelegateTool::Binary(exe) => Command::new(exe),
            DelegateTool::Project(dir) => {
                let mut cmd = Command::new("dotnet");
                cmd.args(["run", "--project"]).arg(dir).arg("--");
                cmd
            }
        };
        cmd.args(args).current_dir(workspace_root);

        match cmd.output() {
            Ok(out) => CommandOutput {
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                success: out.status.success(),
                exit_code: out.status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput {
                stdout: String::new(),
                stderr: e.to_string(),
                success: false,
                exit_code: -1,
            },
        }
    }
}

/// Delegate-backed renamer. Trusts the delegate on success; anything else
/// falls through to the text-substitution fallback.
pub struct DelegateRenamer {
    tool: DelegateTool,
    workspace_root: PathBuf,
    fallback: TextRenamer,
}

impl DelegateRenamer {
    pub fn new(tool: DelegateTool, workspace_root: PathBuf) -> Self {
        DelegateRenamer {
            tool,
            workspace_root,
            fallback: TextRenamer,
        }
    }
}

impl NamespaceRenamer for DelegateRenamer {
    fn rename(&self, file: &Path, old_namespace: &str, new_namespace: &str) -> MigrationResult {
        let file_arg = file.to_string_lossy();
        let output = self.tool.run(
            &[
                DELEGATE_COMMAND,
                "--file",
                &file_arg,
                "--old",
                old_namespace,
                "--new",
                new_namespace,
            ],
            &self.workspace_root,
        );

        if output.success {
            // JSON stdout becomes structured details; plain text becomes the message.
            return match serde_json::from_str::<serde_json::Value>(output.stdout.trim()) {
                Ok(details) => MigrationResult::ok("Delegate command succeeded").with_details(details),
                Err(_) => MigrationResult::ok(output.stdout.trim().to_string()),
            };
        }

        log_status!(
            "renamer",
            "Delegate failed (exit {}): {} — falling back to text substitution",
            output.exit_code,
            output.stderr.trim()
        );
        self.fallback.rename(file, old_namespace, new_namespace)
    }
}

/// Text-substitution renamer: two independent token-boundary substitutions,
/// one over `namespace` declarations and one over `using` directives.
pub struct TextRenamer;

impl TextRenamer {
    /// Rewrite namespace tokens in `content`. Exact-token boundary matching:
    /// `Old` rewrites `namespace Old;` and `using Old.Utils;` but never
    /// `namespace OldStuff`.
    pub fn rename_in_text(content: &str, old_namespace: &str, new_namespace: &str) -> String {
        let escaped = regex::escape(old_namespace);

        let ns_pattern =
            Regex::new(&format!(r"(?m)(namespace\s+){}([^A-Za-z0-9_]|$)", escaped)).unwrap();
        let using_pattern = Regex::new(&format!(
            r"(?m)(using\s+(?:static\s+)?){}([^A-Za-z0-9_]|$)",
            escaped
        ))
        .unwrap();

        let replacement = format!("${{1}}{}${{2}}", new_namespace);
        let updated = ns_pattern.replace_all(content, replacement.as_str());
        using_pattern
            .replace_all(&updated, replacement.as_str())
            .to_string()
    }
}

impl NamespaceRenamer for TextRenamer {
    fn rename(&self, file: &Path, old_namespace: &str, new_namespace: &str) -> MigrationResult {
        let content = match io::read_file(file) {
            Ok(content) => content,
            Err(e) => return MigrationResult::failed(format!("Failed to read {}: {}", file.display(), e)),
        };

        let updated = Self::rename_in_text(&content, old_namespace, new_namespace);

        if updated == content {
            return MigrationResult::ok(format!("No changes needed in {}", file.display()));
        }

        if let Err(e) = io::write_file(file, &updated) {
            return MigrationResult::failed(format!("Failed to write {}: {}", file.display(), e));
        }

        MigrationResult::ok(format!("Renamed namespace in {}", file.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_declaration_and_usings() {
        let content = "using Old.Utils;\nusing System;\n\nnamespace Old;\n\npublic class A { }\n";
        let updated = TextRenamer::rename_in_text(content, "Old", "New");
        assert!(updated.contains("namespace New;"));
        assert!(updated.contains("using New.Utils;"));
        assert!(!updated.contains("namespace Old"));
        assert!(!updated.contains("using Old"));
    }

    #[test]
    fn token_boundary_protects_longer_names() {
        let content = "namespace OldStuff;\nusing OldStuff.Utils;\n";
        let updated = TextRenamer::rename_in_text(content, "Old", "New");
        assert_eq!(updated, content);
    }

    #[test]
    fn block_scoped_declaration_is_rewritten() {
        let content = "namespace Old\n{\n    public class A { }\n}\n";
        let updated = TextRenamer::rename_in_text(content, "Old", "New");
        assert!(updated.contains("namespace New\n"));
    }

    #[test]
    fn using_static_is_rewritten() {
        let content = "using static Old.Helpers;\n";
        let updated = TextRenamer::rename_in_text(content, "Old", "New");
        assert_eq!(updated, "using static New.Helpers;\n");
    }

    #[test]
    fn dotted_namespace_renames_whole_token() {
        let content = "namespace Contoso.Legacy;\nusing Contoso.Legacy.IO;\n";
        let updated = TextRenamer::rename_in_text(content, "Contoso.Legacy", "Contoso.Modern");
        assert!(updated.contains("namespace Contoso.Modern;"));
        assert!(updated.contains("using Contoso.Modern.IO;"));
    }
}
