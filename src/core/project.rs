//! Parser for .NET project (.csproj) files.
//!
//! Project files are MSBuild XML and come in two historical dialects: the
//! SDK-style form (unqualified elements, `Sdk` attribute on the root) and the
//! legacy form, where every element is qualified by the MSBuild namespace.
//! One parse routine probes both spellings for every lookup.

use crate::core::error::{Error, Result};
use crate::utils::io;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// MSBuild XML namespace used by legacy-dialect project files.
pub const MSBUILD_NS: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

/// Package names that mark a project as a test project (lowercase).
const TEST_PACKAGES: &[&str] = &[
    "xunit",
    "xunit.runner.visualstudio",
    "nunit",
    "nunit3testadapter",
    "mstest.testframework",
    "mstest.testadapter",
    "microsoft.net.test.sdk",
];

/// Classification of a project by output kind and package set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    Library,
    Console,
    GuiDesktop,
    Test,
    #[default]
    Unknown,
}

/// Reference to another project in the workspace. Identity is the resolved path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectReference {
    pub name: String,
    pub path: PathBuf,
}

impl PartialEq for ProjectReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ProjectReference {}

/// Reference to a NuGet package. Identity is the name as declared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReference {
    pub name: String,
    pub version: Option<String>,
}

impl PartialEq for PackageReference {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PackageReference {}

/// A .NET project as declared by its .csproj file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub guid: Option<String>,
    pub target_framework: Option<String>,
    pub root_namespace: Option<String>,
    pub output_type: Option<String>,
    pub project_type: ProjectType,
    pub project_references: Vec<ProjectReference>,
    pub package_references: Vec<PackageReference>,
    /// Populated only by an explicit source scan, never by `parse`.
    pub source_files: Vec<PathBuf>,
}

impl Project {
    /// Create a shell project with identity only (used by the solution parser).
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Project {
            name: name.into(),
            path: path.into(),
            guid: None,
            target_framework: None,
            root_namespace: None,
            output_type: None,
            project_type: ProjectType::Unknown,
            project_references: Vec::new(),
            package_references: Vec::new(),
            source_files: Vec::new(),
        }
    }

    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    pub fn is_test_project(&self) -> bool {
        if self.project_type == ProjectType::Test {
            return true;
        }
        self.package_references
            .iter()
            .any(|p| TEST_PACKAGES.contains(&p.name.to_lowercase().as_str()))
    }

    pub fn file_count(&self) -> usize {
        self.source_files.len()
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Project {}

/// Parser for .csproj files.
///
/// Usage:
/// ```ignore
/// let project = ProjectParser::new().parse("path/to/Project.csproj")?;
/// ```
#[derive(Debug, Default)]
pub struct ProjectParser;

impl ProjectParser {
    pub fn new() -> Self {
        ProjectParser
    }

    /// Parse a .csproj file into a [`Project`].
    ///
    /// Fails with `NotFound` if the file is absent and `InvalidFormat` for a
    /// wrong extension or malformed XML.
    pub fn parse(&self, path: impl AsRef<Path>) -> Result<Project> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::NotFound(format!(
                "Project file not found: {}",
                path.display()
            )));
        }

        if !has_extension(path, "csproj") {
            return Err(Error::InvalidFormat(format!(
                "Not a project file: {}",
                path.display()
            )));
        }

        let content = io::read_file(path)?;
        let doc = roxmltree::Document::parse(&content).map_err(|e| {
            Error::InvalidFormat(format!("Invalid XML in {}: {}", path.display(), e))
        })?;

        let dialect = if is_sdk_style(&doc) { "sdk" } else { "legacy" };

        let target_framework =
            get_property(&doc, "TargetFramework").or_else(|| get_property(&doc, "TargetFrameworks"));
        let root_namespace = get_property(&doc, "RootNamespace");
        let output_type = get_property(&doc, "OutputType");

        let project_dir = path.parent().unwrap_or(Path::new(""));
        let project_references = parse_project_references(&doc, project_dir);
        let package_references = parse_package_references(&doc);

        let project_type = determine_project_type(output_type.as_deref(), &package_references);

        let stem = file_stem(path);
        let project = Project {
            name: stem.clone(),
            path: path.to_path_buf(),
            guid: None,
            target_framework,
            root_namespace: root_namespace.or(Some(stem)),
            output_type,
            project_type,
            project_references,
            package_references,
            source_files: Vec::new(),
        };

        log_status!(
            "project",
            "Parsed {} ({} dialect, {:?})",
            project.name,
            dialect,
            project.project_type
        );

        Ok(project)
    }

    /// Re-parse the file at `project.path` and fill metadata onto an existing
    /// project in place. Identity (name, path) is left untouched.
    pub fn enrich(&self, project: &mut Project) -> Result<()> {
        if !project.path.exists() {
            log_status!("project", "Project file not found: {}", project.path.display());
            return Ok(());
        }

        let parsed = self.parse(&project.path)?;
        project.target_framework = parsed.target_framework;
        project.root_namespace = parsed.root_namespace;
        project.output_type = parsed.output_type;
        project.project_type = parsed.project_type;
        project.project_references = parsed.project_references;
        project.package_references = parsed.package_references;
        Ok(())
    }
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn is_sdk_style(doc: &roxmltree::Document) -> bool {
    let root = doc.root_element();
    if root.attribute("Sdk").is_some() {
        return true;
    }
    doc.descendants()
        .any(|n| n.is_element() && n.tag_name().name() == "Import" && n.attribute("Sdk").is_some())
}

fn tag_matches(node: &roxmltree::Node, name: &str, ns: Option<&str>) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == ns
}

/// Look up a property value, trying the unqualified (SDK-style) spelling
/// first and the namespace-qualified (legacy) spelling second. The first
/// non-empty trimmed text wins.
fn get_property(doc: &roxmltree::Document, name: &str) -> Option<String> {
    for ns in [None, Some(MSBUILD_NS)] {
        for group in doc
            .descendants()
            .filter(|n| tag_matches(n, "PropertyGroup", ns))
        {
            for child in group.children().filter(|n| tag_matches(n, name, ns)) {
                if let Some(text) = child.text() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
        }
    }
    None
}

fn parse_project_references(doc: &roxmltree::Document, project_dir: &Path) -> Vec<ProjectReference> {
    let mut references = Vec::new();

    for ns in [None, Some(MSBUILD_NS)] {
        for elem in doc
            .descendants()
            .filter(|n| tag_matches(n, "ProjectReference", ns))
        {
            let Some(include) = elem.attribute("Include") else {
                continue;
            };
            if let Some(ref_path) = resolve_reference_path(project_dir, include) {
                references.push(ProjectReference {
                    name: file_stem(&ref_path),
                    path: ref_path,
                });
            }
        }
    }

    references
}

fn parse_package_references(doc: &roxmltree::Document) -> Vec<PackageReference> {
    let mut references = Vec::new();

    for ns in [None, Some(MSBUILD_NS)] {
        for elem in doc
            .descendants()
            .filter(|n| tag_matches(n, "PackageReference", ns))
        {
            let Some(name) = elem.attribute("Include") else {
                continue;
            };

            // Version may be an attribute or a nested element.
            let version = elem.attribute("Version").map(str::to_string).or_else(|| {
                elem.children()
                    .find(|n| tag_matches(n, "Version", ns))
                    .and_then(|n| n.text())
                    .map(|t| t.trim().to_string())
            });

            references.push(PackageReference {
                name: name.to_string(),
                version,
            });
        }
    }

    references
}

/// Resolve a reference path relative to the project directory, normalizing
/// Windows separators. Dangling references resolve to `None`.
fn resolve_reference_path(project_dir: &Path, relative: &str) -> Option<PathBuf> {
    let normalized = relative.replace('\\', "/");
    let full = project_dir.join(normalized);
    if full.exists() {
        Some(full.canonicalize().unwrap_or(full))
    } else {
        None
    }
}

/// Classification rule, first match wins: test packages beat output kind.
fn determine_project_type(output_type: Option<&str>, packages: &[PackageReference]) -> ProjectType {
    if packages
        .iter()
        .any(|p| TEST_PACKAGES.contains(&p.name.to_lowercase().as_str()))
    {
        return ProjectType::Test;
    }

    match output_type.map(|s| s.to_lowercase()).as_deref() {
        Some("exe") => ProjectType::Console,
        Some("winexe") => ProjectType::GuiDesktop,
        Some("library") => ProjectType::Library,
        _ => ProjectType::Unknown,
    }
}
