// Public modules
pub mod engine;
pub mod error;
pub mod index;
pub mod plan;
pub mod project;
pub mod renamer;
pub mod scanner;
pub mod solution;

// Re-export common types for convenience
pub use engine::{MigrationEngine, MigrationResult};
pub use error::{Error, Result};
pub use plan::{
    execute_batch, BatchOutcome, MigrationAction, MigrationPlan, MigrationStep, PlanOutcome,
    StepStatus,
};
pub use project::{PackageReference, Project, ProjectParser, ProjectReference, ProjectType};
pub use scanner::{
    ClassInfo, FileInfo, LexicalScanner, MemberType, SourceAnalyzer, TestFramework, TestInfo,
};
pub use solution::{Solution, SolutionParser};
