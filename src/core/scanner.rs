//! Lexical scanner for C# source files.
//!
//! Extracts namespaces, type declarations, using directives, and test methods
//! using line/regex heuristics only — there is no grammar behind this. The
//! scanner is a pure function over text producing a best-effort model; the
//! [`SourceAnalyzer`] trait is the seam where a grammar-based backend could be
//! swapped in without touching callers.
//!
//! Known heuristic limits (accepted, not bugs): test attributes accumulate
//! until the next matched method line, so an attribute separated from its
//! method by unrelated matching lines can attach to the wrong method.

use crate::utils::io;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Kinds of C# type declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Class,
    Interface,
    Struct,
    Enum,
    Record,
    Delegate,
}

/// Test frameworks recognized by attribute family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestFramework {
    Xunit,
    Nunit,
    Mstest,
    #[default]
    Unknown,
}

/// A test method discovered inside a class body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestInfo {
    pub name: String,
    pub class_name: String,
    pub framework: TestFramework,
    /// xUnit `[Theory]` or NUnit `[TestCase]`.
    pub is_theory: bool,
    /// `[Trait("Key", "Value")]` pairs as `key:value` strings.
    pub traits: Vec<String>,
    pub line_number: usize,
}

impl TestInfo {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.class_name, self.name)
    }
}

impl PartialEq for TestInfo {
    fn eq(&self, other: &Self) -> bool {
        self.full_name() == other.full_name()
    }
}

impl Eq for TestInfo {}

/// A type declaration discovered in a source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub namespace: Option<String>,
    pub member_type: MemberType,
    pub base_class: Option<String>,
    pub interfaces: Vec<String>,
    pub is_public: bool,
    pub is_abstract: bool,
    pub is_static: bool,
    pub is_partial: bool,
    pub is_sealed: bool,
    pub line_number: usize,
    pub tests: Vec<TestInfo>,
}

impl ClassInfo {
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    pub fn is_test_class(&self) -> bool {
        !self.tests.is_empty()
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }
}

impl PartialEq for ClassInfo {
    fn eq(&self, other: &Self) -> bool {
        self.full_name() == other.full_name()
    }
}

impl Eq for ClassInfo {}

/// Everything extracted from one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub namespace: Option<String>,
    pub classes: Vec<ClassInfo>,
    pub using_directives: BTreeSet<String>,
    pub line_count: usize,
}

impl FileInfo {
    /// An empty record for a file that could not be read.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        FileInfo {
            path: path.into(),
            namespace: None,
            classes: Vec::new(),
            using_directives: BTreeSet::new(),
            line_count: 0,
        }
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn test_count(&self) -> usize {
        self.classes.iter().map(|c| c.test_count()).sum()
    }

    pub fn is_test_file(&self) -> bool {
        self.test_count() > 0
    }

    pub fn get_class_by_name(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// The first public class, falling back to the first class.
    pub fn primary_class(&self) -> Option<&ClassInfo> {
        self.classes
            .iter()
            .find(|c| c.is_public)
            .or_else(|| self.classes.first())
    }
}

impl PartialEq for FileInfo {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FileInfo {}

/// The extraction seam: scan one file into a [`FileInfo`].
///
/// `scan` never fails — unreadable input yields an empty record.
pub trait SourceAnalyzer {
    fn scan(&self, path: &Path) -> FileInfo;

    fn scan_directory(&self, directory: &Path, recursive: bool) -> Vec<FileInfo> {
        let files = io::find_files(directory, "cs", recursive);
        let scanned: Vec<FileInfo> = files.iter().map(|p| self.scan(p)).collect();
        log_status!(
            "scanner",
            "Scanned {} files in {}",
            scanned.len(),
            directory.display()
        );
        scanned
    }
}

/// Pending test attribute: the framework family and whether it is the
/// parameterized variant of that family.
#[derive(Debug, Clone, Copy)]
struct TestAttribute {
    framework: TestFramework,
    is_theory: bool,
}

/// Regex-based [`SourceAnalyzer`] implementation.
pub struct LexicalScanner {
    file_scoped_ns: Regex,
    block_ns: Regex,
    using: Regex,
    type_decl: Regex,
    generic_args: Regex,
    xunit_fact: Regex,
    xunit_theory: Regex,
    nunit_test: Regex,
    nunit_testcase: Regex,
    mstest: Regex,
    method: Regex,
    trait_marker: Regex,
}

impl Default for LexicalScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalScanner {
    pub fn new() -> Self {
        LexicalScanner {
            // File-scoped namespace (C# 10+): namespace Foo.Bar;
            file_scoped_ns: Regex::new(r"(?m)^\s*namespace\s+([\w.]+)\s*;").unwrap(),
            block_ns: Regex::new(r"(?m)^\s*namespace\s+([\w.]+)\s*[;{]").unwrap(),
            using: Regex::new(r"(?m)^\s*using\s+(?:static\s+)?([\w.]+)\s*;").unwrap(),
            // Matches: public abstract class Foo<T> : Bar, IFoo
            // Leading whitespace must stay within the line: `\s` would let a
            // match start on a preceding blank line and skew line numbers.
            type_decl: Regex::new(
                r"(?m)^[ \t]*(?:(?:public|private|protected|internal)\s+)?(?:(?:abstract|sealed|static|partial)\s+)*(class|interface|struct|enum|record)\s+(\w+)(?:<[^>]+>)?(?:\s*:\s*([^{]+))?",
            )
            .unwrap(),
            generic_args: Regex::new(r"<[^>]+>").unwrap(),
            xunit_fact: Regex::new(r"\[Fact(?:\([^)]*\))?\]").unwrap(),
            xunit_theory: Regex::new(r"\[Theory(?:\([^)]*\))?\]").unwrap(),
            nunit_test: Regex::new(r"\[Test(?:\([^)]*\))?\]").unwrap(),
            nunit_testcase: Regex::new(r"\[TestCase(?:\([^)]*\))?\]").unwrap(),
            mstest: Regex::new(r"\[TestMethod(?:\([^)]*\))?\]").unwrap(),
            method: Regex::new(
                r"^\s*(?:(?:public|private|protected|internal)\s+)?(?:(?:async|virtual|override|static|abstract)\s+)*(?:Task\s+|void\s+|[\w<>\[\],\s]+\s+)(\w+)\s*\(",
            )
            .unwrap(),
            trait_marker: Regex::new(r#"\[Trait\s*\(\s*"([^"]+)"\s*,\s*"([^"]+)"\s*\)\]"#).unwrap(),
        }
    }

    /// Scan source text. Pure over the content; the path is recorded as-is.
    pub fn scan_text(&self, path: &Path, content: &str) -> FileInfo {
        let line_count = content.matches('\n').count() + 1;
        let namespace = self.extract_namespace(content);
        let using_directives = self.extract_usings(content);
        let classes = self.extract_classes(content, namespace.as_deref());

        FileInfo {
            path: path.to_path_buf(),
            namespace,
            classes,
            using_directives,
            line_count,
        }
    }

    fn extract_namespace(&self, content: &str) -> Option<String> {
        // File-scoped form wins; fall back to the block-scoped form.
        if let Some(caps) = self.file_scoped_ns.captures(content) {
            return Some(caps[1].to_string());
        }
        self.block_ns
            .captures(content)
            .map(|caps| caps[1].to_string())
    }

    fn extract_usings(&self, content: &str) -> BTreeSet<String> {
        self.using
            .captures_iter(content)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    fn extract_classes(&self, content: &str, namespace: Option<&str>) -> Vec<ClassInfo> {
        let mut classes = Vec::new();

        for caps in self.type_decl.captures_iter(content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let kind = &caps[1];
            let name = caps[2].to_string();
            let inheritance = caps.get(3).map(|m| m.as_str());

            let member_type = match kind {
                "class" => MemberType::Class,
                "interface" => MemberType::Interface,
                "struct" => MemberType::Struct,
                "enum" => MemberType::Enum,
                _ => MemberType::Record,
            };

            let (base_class, interfaces) = self.split_inheritance(inheritance, member_type);

            let decl = whole.as_str();
            let line_number = content[..whole.start()].matches('\n').count() + 1;

            let tests = self.extract_tests_for_class(content, &name, line_number);

            classes.push(ClassInfo {
                name,
                namespace: namespace.map(str::to_string),
                member_type,
                base_class,
                interfaces,
                is_public: decl.contains("public"),
                is_abstract: decl.contains("abstract"),
                is_static: decl.contains("static"),
                is_partial: decl.contains("partial"),
                is_sealed: decl.contains("sealed"),
                line_number,
                tests,
            });
        }

        classes
    }

    /// Split an inheritance clause into (base class, interfaces).
    ///
    /// A part is an interface when its generics-stripped name starts with `I`
    /// followed by an uppercase letter. Only class kinds take a base class,
    /// and only the first non-interface part; later non-interface parts are
    /// dropped as a design simplification.
    fn split_inheritance(
        &self,
        inheritance: Option<&str>,
        member_type: MemberType,
    ) -> (Option<String>, Vec<String>) {
        let Some(clause) = inheritance else {
            return (None, Vec::new());
        };

        let mut base_class = None;
        let mut interfaces = Vec::new();

        for part in clause.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let simple = self.generic_args.replace_all(part, "").trim().to_string();
            let is_interface = simple.starts_with('I')
                && simple.chars().nth(1).is_some_and(|c| c.is_ascii_uppercase());

            if is_interface {
                interfaces.push(part.to_string());
            } else if base_class.is_none() && member_type == MemberType::Class {
                base_class = Some(part.to_string());
            }
        }

        (base_class, interfaces)
    }

    /// Walk the class body line by line, tracking brace depth from the line
    /// after the class header and stopping when the depth goes negative.
    fn extract_tests_for_class(
        &self,
        content: &str,
        class_name: &str,
        class_line: usize,
    ) -> Vec<TestInfo> {
        let mut tests = Vec::new();
        let mut brace_depth: i32 = 0;
        let mut pending_attributes: Vec<TestAttribute> = Vec::new();
        let mut pending_traits: Vec<String> = Vec::new();

        for (i, line) in content.lines().enumerate() {
            let line_num = i + 1;
            if line_num <= class_line {
                continue;
            }

            brace_depth += line.matches('{').count() as i32;
            brace_depth -= line.matches('}').count() as i32;
            if brace_depth < 0 {
                break;
            }

            if self.xunit_fact.is_match(line) {
                pending_attributes.push(TestAttribute {
                    framework: TestFramework::Xunit,
                    is_theory: false,
                });
            }
            if self.xunit_theory.is_match(line) {
                pending_attributes.push(TestAttribute {
                    framework: TestFramework::Xunit,
                    is_theory: true,
                });
            }
            if self.nunit_test.is_match(line) {
                pending_attributes.push(TestAttribute {
                    framework: TestFramework::Nunit,
                    is_theory: false,
                });
            }
            if self.nunit_testcase.is_match(line) {
                pending_attributes.push(TestAttribute {
                    framework: TestFramework::Nunit,
                    is_theory: true,
                });
            }
            if self.mstest.is_match(line) {
                pending_attributes.push(TestAttribute {
                    framework: TestFramework::Mstest,
                    is_theory: false,
                });
            }

            for trait_caps in self.trait_marker.captures_iter(line) {
                pending_traits.push(format!("{}:{}", &trait_caps[1], &trait_caps[2]));
            }

            if let Some(method_caps) = self.method.captures(line) {
                if !pending_attributes.is_empty() {
                    // Last-seen attribute family wins.
                    let last = pending_attributes[pending_attributes.len() - 1];

                    tests.push(TestInfo {
                        name: method_caps[1].to_string(),
                        class_name: class_name.to_string(),
                        framework: last.framework,
                        is_theory: last.is_theory,
                        traits: std::mem::take(&mut pending_traits),
                        line_number: line_num,
                    });

                    pending_attributes.clear();
                }
            }
        }

        tests
    }
}

impl SourceAnalyzer for LexicalScanner {
    fn scan(&self, path: &Path) -> FileInfo {
        match io::read_file_lossy(path) {
            Some(content) => self.scan_text(path, &content),
            None => {
                log_status!("scanner", "Failed to read {}", path.display());
                FileInfo::empty(path)
            }
        }
    }
}
