//! Parser for .NET solution (.sln) files.
//!
//! The solution format is line-oriented text. Project entries look like:
//! `Project("{TYPE-GUID}") = "Name", "Rel\Path\Name.csproj", "{PROJECT-GUID}"`.
//! Entries whose type GUID is the reserved solution-folder identifier are
//! organizational only and never become projects.

use crate::core::error::{Error, Result};
use crate::core::project::{file_stem, has_extension, Project};
use crate::utils::io;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Type GUID marking a solution folder (non-buildable entry).
pub const SOLUTION_FOLDER_GUID: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

/// A .NET solution and its member projects, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub name: String,
    pub path: PathBuf,
    pub projects: Vec<Project>,
}

impl Solution {
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn get_project_by_name(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn get_project_by_path(&self, path: &Path) -> Option<&Project> {
        self.projects.iter().find(|p| p.path == path)
    }

    pub fn test_projects(&self) -> Vec<&Project> {
        self.projects.iter().filter(|p| p.is_test_project()).collect()
    }

    pub fn source_projects(&self) -> Vec<&Project> {
        self.projects.iter().filter(|p| !p.is_test_project()).collect()
    }
}

/// Parser for .sln files.
///
/// Usage:
/// ```ignore
/// let solution = SolutionParser::new().parse("path/to/App.sln")?;
/// ```
#[derive(Debug)]
pub struct SolutionParser {
    project_pattern: Regex,
}

impl Default for SolutionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SolutionParser {
    pub fn new() -> Self {
        // Project("{GUID}") = "Name", "Path", "{ProjectGUID}"
        let project_pattern = Regex::new(
            r#"(?i)Project\("\{([A-F0-9-]+)\}"\)\s*=\s*"([^"]+)"\s*,\s*"([^"]+)"\s*,\s*"\{([A-F0-9-]+)\}""#,
        )
        .expect("solution project pattern is valid");

        SolutionParser { project_pattern }
    }

    /// Parse a .sln file into a [`Solution`].
    ///
    /// Fails with `NotFound` if the file is absent and `InvalidFormat` for a
    /// wrong extension. Dangling project entries are dropped with a warning,
    /// not treated as parse errors.
    pub fn parse(&self, path: impl AsRef<Path>) -> Result<Solution> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::NotFound(format!(
                "Solution file not found: {}",
                path.display()
            )));
        }

        if !has_extension(path, "sln") {
            return Err(Error::InvalidFormat(format!(
                "Not a solution file: {}",
                path.display()
            )));
        }

        let content = io::read_file(path)?;
        let solution_dir = path.parent().unwrap_or(Path::new(""));
        let projects = self.parse_projects(&content, solution_dir);

        log_status!(
            "solution",
            "Parsed {} projects from {}",
            projects.len(),
            path.display()
        );

        Ok(Solution {
            name: file_stem(path),
            path: path.to_path_buf(),
            projects,
        })
    }

    /// Lightweight enumeration: (name, path) pairs without deep metadata.
    pub fn project_paths(&self, path: impl AsRef<Path>) -> Result<Vec<(String, PathBuf)>> {
        let solution = self.parse(path)?;
        Ok(solution
            .projects
            .into_iter()
            .map(|p| (p.name, p.path))
            .collect())
    }

    fn parse_projects(&self, content: &str, solution_dir: &Path) -> Vec<Project> {
        let mut projects = Vec::new();

        for caps in self.project_pattern.captures_iter(content) {
            let type_guid = &caps[1];
            let name = &caps[2];
            let relative_path = &caps[3];
            let project_guid = &caps[4];

            if type_guid.eq_ignore_ascii_case(SOLUTION_FOLDER_GUID) {
                log_status!("solution", "Skipping solution folder: {}", name);
                continue;
            }

            let Some(project_path) = resolve_project_path(solution_dir, relative_path) else {
                log_status!(
                    "solution",
                    "Could not resolve path for project: {} ({})",
                    name,
                    relative_path
                );
                continue;
            };

            let mut project = Project::new(name, project_path);
            project.guid = Some(project_guid.to_string());
            projects.push(project);
        }

        projects
    }
}

/// Resolve a solution-relative project path, normalizing Windows separators.
/// Extensionless entries are retried with the `.csproj` suffix.
fn resolve_project_path(solution_dir: &Path, relative: &str) -> Option<PathBuf> {
    let normalized = relative.replace('\\', "/");
    let full = solution_dir.join(normalized);

    if full.exists() {
        return Some(full.canonicalize().unwrap_or(full));
    }

    if full.extension().is_none() {
        let with_suffix = full.with_extension("csproj");
        if with_suffix.exists() {
            return Some(with_suffix.canonicalize().unwrap_or(with_suffix));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CSPROJ: &str = "<Project Sdk=\"Microsoft.NET.Sdk\"></Project>\n";

    fn write_solution(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("App.sln");
        let content = format!(
            "Microsoft Visual Studio Solution File, Format Version 12.00\n{}Global\nEndGlobal\n",
            body
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    fn write_csproj(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, CSPROJ).unwrap();
    }

    #[test]
    fn parses_projects_in_declaration_order() {
        let dir = tempdir().unwrap();
        write_csproj(dir.path(), "Core/Core.csproj");
        write_csproj(dir.path(), "App/App.csproj");

        let sln = write_solution(
            dir.path(),
            "Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"Core\", \"Core\\Core.csproj\", \"{AAAAAAAA-1111-2222-3333-BBBBBBBBBBBB}\"\nEndProject\n\
             Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"App\", \"App\\App.csproj\", \"{CCCCCCCC-1111-2222-3333-DDDDDDDDDDDD}\"\nEndProject\n",
        );

        let solution = SolutionParser::new().parse(&sln).unwrap();
        assert_eq!(solution.name, "App");
        assert_eq!(solution.project_count(), 2);
        assert_eq!(solution.projects[0].name, "Core");
        assert_eq!(solution.projects[1].name, "App");
        assert_eq!(
            solution.projects[0].guid.as_deref(),
            Some("AAAAAAAA-1111-2222-3333-BBBBBBBBBBBB")
        );
    }

    #[test]
    fn solution_folders_are_excluded() {
        let dir = tempdir().unwrap();
        write_csproj(dir.path(), "Core/Core.csproj");

        let sln = write_solution(
            dir.path(),
            "Project(\"{2150E333-8FDC-42A3-9474-1A3956D46DE8}\") = \"src\", \"src\", \"{EEEEEEEE-1111-2222-3333-FFFFFFFFFFFF}\"\nEndProject\n\
             Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"Core\", \"Core\\Core.csproj\", \"{AAAAAAAA-1111-2222-3333-BBBBBBBBBBBB}\"\nEndProject\n",
        );

        let solution = SolutionParser::new().parse(&sln).unwrap();
        assert_eq!(solution.project_count(), 1);
        assert!(solution
            .projects
            .iter()
            .all(|p| p.guid.as_deref() != Some("EEEEEEEE-1111-2222-3333-FFFFFFFFFFFF")));
    }

    #[test]
    fn dangling_project_entry_is_dropped_not_fatal() {
        let dir = tempdir().unwrap();
        write_csproj(dir.path(), "Core/Core.csproj");

        let sln = write_solution(
            dir.path(),
            "Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"Core\", \"Core\\Core.csproj\", \"{AAAAAAAA-1111-2222-3333-BBBBBBBBBBBB}\"\nEndProject\n\
             Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"Gone\", \"Gone\\Gone.csproj\", \"{CCCCCCCC-1111-2222-3333-DDDDDDDDDDDD}\"\nEndProject\n",
        );

        let solution = SolutionParser::new().parse(&sln).unwrap();
        assert_eq!(solution.project_count(), 1);
        assert_eq!(solution.projects[0].name, "Core");
    }

    #[test]
    fn extensionless_entry_resolves_with_csproj_suffix() {
        let dir = tempdir().unwrap();
        write_csproj(dir.path(), "Core/Core.csproj");

        let sln = write_solution(
            dir.path(),
            "Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"Core\", \"Core\\Core\", \"{AAAAAAAA-1111-2222-3333-BBBBBBBBBBBB}\"\nEndProject\n",
        );

        let solution = SolutionParser::new().parse(&sln).unwrap();
        assert_eq!(solution.project_count(), 1);
        assert!(solution.projects[0].path.ends_with("Core/Core.csproj"));
    }

    #[test]
    fn bom_prefixed_solution_parses() {
        let dir = tempdir().unwrap();
        write_csproj(dir.path(), "Core/Core.csproj");

        let path = dir.path().join("Bom.sln");
        std::fs::write(
            &path,
            "\u{feff}Microsoft Visual Studio Solution File, Format Version 12.00\n\
             Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"Core\", \"Core\\Core.csproj\", \"{AAAAAAAA-1111-2222-3333-BBBBBBBBBBBB}\"\nEndProject\n",
        )
        .unwrap();

        let solution = SolutionParser::new().parse(&path).unwrap();
        assert_eq!(solution.project_count(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = SolutionParser::new().parse("/nonexistent/App.sln").unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn wrong_extension_is_invalid_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("App.txt");
        std::fs::write(&path, "not a solution").unwrap();
        let err = SolutionParser::new().parse(&path).unwrap_err();
        assert_eq!(err.code(), "INVALID_FORMAT");
    }

    #[test]
    fn project_paths_returns_name_path_pairs() {
        let dir = tempdir().unwrap();
        write_csproj(dir.path(), "Core/Core.csproj");

        let sln = write_solution(
            dir.path(),
            "Project(\"{9A19103F-16F7-4668-BE54-9A1E7A4F7556}\") = \"Core\", \"Core\\Core.csproj\", \"{AAAAAAAA-1111-2222-3333-BBBBBBBBBBBB}\"\nEndProject\n",
        );

        let pairs = SolutionParser::new().project_paths(&sln).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "Core");
        assert!(pairs[0].1.ends_with("Core/Core.csproj"));
    }
}
