//! Persisted migration plans and batch execution.
//!
//! A plan is an ordered list of steps stored as JSON. Execution is fail-fast:
//! the first failed step aborts the run and every remaining pending step is
//! marked skipped. Batch moves are the opposite discipline, continuing past
//! failures and tallying the outcome.

use crate::core::engine::{MigrationEngine, MigrationResult};
use crate::core::error::{Error, Result};
use crate::utils::io;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationAction {
    MoveFile,
    MoveFolder,
    CreateProject,
    DeleteProject,
    RenameNamespace,
    AddReference,
    RemoveReference,
    UpdateSolution,
}

/// Lifecycle of a step within one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

/// One unit of migration work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStep {
    pub id: u32,
    pub action: MigrationAction,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MigrationStep {
    pub fn new(
        id: u32,
        action: MigrationAction,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        MigrationStep {
            id,
            action,
            source: source.into(),
            target: target.into(),
            metadata: BTreeMap::new(),
            status: StepStatus::default(),
            error: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Result of executing a whole plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub success: bool,
}

/// Tally of a batch move that keeps going past failures.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub moved: usize,
    pub failed: usize,
    pub items: Vec<MigrationResult>,
}

/// An ordered, persistable list of migration steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationPlan {
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    pub fn new(steps: Vec<MigrationStep>) -> Self {
        MigrationPlan { steps }
    }

    /// Load a plan from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "Plan file not found: {}",
                path.display()
            )));
        }
        let content = io::read_file(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the plan, statuses included, as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        io::write_file(path.as_ref(), &content)
    }

    /// Run every step in order, fail-fast. The first failure records its
    /// error on the step and skips everything after it. Steps whose action
    /// has no engine operation are marked skipped and do not abort the run.
    pub fn execute(&mut self, engine: &MigrationEngine) -> PlanOutcome {
        let mut aborted = false;

        for step in &mut self.steps {
            if aborted {
                step.status = StepStatus::Skipped;
                continue;
            }

            step.status = StepStatus::InProgress;
            let Some(result) = execute_step(engine, step) else {
                step.status = StepStatus::Skipped;
                log_status!(
                    "plan",
                    "Step {} skipped: action not automated, apply manually",
                    step.id
                );
                continue;
            };

            if result.success {
                step.status = StepStatus::Completed;
            } else {
                step.status = StepStatus::Failed;
                step.error = Some(result.message.clone());
                log_status!("plan", "Step {} failed: {}", step.id, result.message);
                aborted = true;
            }
        }

        let completed = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();
        let failed = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .count();
        let skipped = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Skipped)
            .count();

        PlanOutcome {
            completed,
            failed,
            skipped,
            success: failed == 0,
        }
    }
}

/// Dispatch one step to the engine. `None` means the action has no engine
/// operation; the caller marks such steps skipped without aborting the plan.
fn execute_step(engine: &MigrationEngine, step: &MigrationStep) -> Option<MigrationResult> {
    match step.action {
        MigrationAction::MoveFile => {
            Some(engine.move_file(Path::new(&step.source), Path::new(&step.target)))
        }
        MigrationAction::MoveFolder => {
            Some(engine.move_folder(Path::new(&step.source), Path::new(&step.target)))
        }
        MigrationAction::RenameNamespace => Some(match step.metadata.get("file") {
            Some(file) => engine.rename_namespace(Path::new(file), &step.source, &step.target),
            None => MigrationResult::failed(format!(
                "Step {} has no 'file' metadata for namespace rename",
                step.id
            )),
        }),
        MigrationAction::UpdateSolution => Some(match step.metadata.get("solution") {
            Some(solution) => engine.update_solution_project_path(
                Path::new(solution),
                &step.source,
                &step.target,
            ),
            None => MigrationResult::failed(format!(
                "Step {} has no 'solution' metadata for solution update",
                step.id
            )),
        }),
        MigrationAction::CreateProject
        | MigrationAction::DeleteProject
        | MigrationAction::AddReference
        | MigrationAction::RemoveReference => None,
    }
}

/// Move several folders in one pass, continuing past failures.
pub fn execute_batch(engine: &MigrationEngine, moves: &[(PathBuf, PathBuf)]) -> BatchOutcome {
    let mut items = Vec::with_capacity(moves.len());
    let mut moved = 0;
    let mut failed = 0;

    for (source, target) in moves {
        let result = engine.move_folder(source, target);
        if result.success {
            moved += 1;
        } else {
            failed += 1;
        }
        items.push(result);
    }

    log_status!("plan", "Batch move: {} moved, {} failed", moved, failed);

    BatchOutcome {
        moved,
        failed,
        items,
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

    #[test]
    fn plan_round_trips_through_json_with_statuses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.json");

        let mut step = MigrationStep::new(1, MigrationAction::MoveFolder, "a", "b");
        step.status = StepStatus::Completed;
        let plan = MigrationPlan::new(vec![
            step,
            MigrationStep::new(2, MigrationAction::RenameNamespace, "Old", "New")
                .with_metadata("file", "src/A.cs"),
        ]);

        plan.save(&path).unwrap();
        let loaded = MigrationPlan::load(&path).unwrap();

        assert_eq!(loaded.steps.len(), 2);
        assert_eq!(loaded.steps[0].status, StepStatus::Completed);
        assert_eq!(loaded.steps[1].status, StepStatus::Pending);
        assert_eq!(loaded.steps[1].metadata["file"], "src/A.cs");
    }

    #[test]
    fn handwritten_plan_json_deserializes() {
        let json = r#"[
            {"id": 1, "action": "move_folder", "source": "test/Old", "target": "test/Unit/Old"},
            {"id": 2, "action": "update_solution", "source": "test\\Old\\Old.csproj",
             "target": "test\\Unit\\Old\\Old.csproj", "metadata": {"solution": "App.sln"}}
        ]"#;

        let plan: MigrationPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].action, MigrationAction::MoveFolder);
        assert_eq!(plan.steps[0].status, StepStatus::Pending);
        assert_eq!(plan.steps[1].metadata["solution"], "App.sln");
    }

    #[test]
    fn missing_plan_file_is_not_found() {
        let err = MigrationPlan::load("/nonexistent/plan.json").unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn execution_is_fail_fast() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/x.txt", "x");
        write(dir.path(), "c/z.txt", "z");

        let engine = MigrationEngine::new(dir.path(), false);
        let mut plan = MigrationPlan::new(vec![
            MigrationStep::new(1, MigrationAction::MoveFolder, "a", "moved-a"),
            // Source never existed, so this fails.
            MigrationStep::new(2, MigrationAction::MoveFolder, "gone", "moved-gone"),
            MigrationStep::new(3, MigrationAction::MoveFolder, "c", "moved-c"),
        ]);

        let outcome = plan.execute(&engine);

        assert!(!outcome.success);
        assert_eq!(outcome.completed, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(plan.steps[0].status, StepStatus::Completed);
        assert_eq!(plan.steps[1].status, StepStatus::Failed);
        assert!(plan.steps[1].error.as_deref().unwrap().contains("does not exist"));
        assert_eq!(plan.steps[2].status, StepStatus::Skipped);
        // Fail-fast means step 3 never ran.
        assert!(dir.path().join("c/z.txt").exists());
    }

    #[test]
    fn unsupported_actions_are_skipped_without_aborting() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/x.txt", "x");

        let engine = MigrationEngine::new(dir.path(), false);
        let mut plan = MigrationPlan::new(vec![
            MigrationStep::new(1, MigrationAction::CreateProject, "New.csproj", ""),
            MigrationStep::new(2, MigrationAction::MoveFolder, "a", "b"),
        ]);

        let outcome = plan.execute(&engine);

        assert!(outcome.success);
        assert_eq!(outcome.completed, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.failed, 0);
        assert_eq!(plan.steps[0].status, StepStatus::Skipped);
        assert!(plan.steps[0].error.is_none());
        assert_eq!(plan.steps[1].status, StepStatus::Completed);
        assert!(dir.path().join("b/x.txt").exists());
    }

    #[test]
    fn rename_step_without_file_metadata_fails() {
        let dir = tempdir().unwrap();
        let engine = MigrationEngine::new(dir.path(), false);
        let mut plan = MigrationPlan::new(vec![MigrationStep::new(
            1,
            MigrationAction::RenameNamespace,
            "Old",
            "New",
        )]);

        let outcome = plan.execute(&engine);
        assert!(!outcome.success);
        assert!(plan.steps[0].error.as_deref().unwrap().contains("metadata"));
    }

    #[test]
    fn batch_move_continues_past_failures() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/x.txt", "x");
        write(dir.path(), "c/z.txt", "z");

        let engine = MigrationEngine::new(dir.path(), false);
        let moves = vec![
            (PathBuf::from("a"), PathBuf::from("moved-a")),
            (PathBuf::from("gone"), PathBuf::from("moved-gone")),
            (PathBuf::from("c"), PathBuf::from("moved-c")),
        ];

        let outcome = execute_batch(&engine, &moves);

        assert_eq!(outcome.moved, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.items.len(), 3);
        assert!(dir.path().join("moved-a/x.txt").exists());
        assert!(dir.path().join("moved-c/z.txt").exists());
    }
}
