pub type CmdResult<T> = slnshift::Result<(T, i32)>;

pub mod migrate;
pub mod plan;
pub mod project;
pub mod scan;
pub mod solution;
pub mod workspace;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (slnshift::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Solution(args) => dispatch!(args, solution),
        crate::Commands::Project(args) => dispatch!(args, project),
        crate::Commands::Scan(args) => dispatch!(args, scan),
        crate::Commands::Affected(args) => {
            crate::output::map_cmd_result_to_json(workspace::run_affected(args))
        }
        crate::Commands::Solutions(args) => {
            crate::output::map_cmd_result_to_json(workspace::run_solutions(args))
        }
        crate::Commands::Migrate(args) => dispatch!(args, migrate),
        crate::Commands::Plan(args) => dispatch!(args, plan),
    }
}
