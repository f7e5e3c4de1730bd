//! Plain recursive copy of one item into `<dest>/<run>`.

use crate::capability::{Copier, DirCreator};
use crate::error::ItemError;
use crate::plan::ResolvedPlan;
use crate::report::{Action, ExecutionResult};
use tracing::{error, info, warn};

/// Copies `plan`'s source into its run folder.
///
/// Entries the copier had to skip do not turn the item into a failure; they are
/// counted in the summary and logged.
pub fn copy(plan: &ResolvedPlan, copier: &dyn Copier, dirs: &dyn DirCreator) -> ExecutionResult {
    let dest = plan.run_dir();
    let attempted = dest.display().to_string();
    let fail = |err: ItemError| {
        error!(item = %plan.item_name, error = %err, "copy failed");
        ExecutionResult::failure(&plan.item_name, Action::Copy, &attempted, err)
    };

    if let Err(cause) = dirs.ensure_exists(&plan.dest_dir) {
        return fail(ItemError::DirectoryCreation {
            path: plan.dest_dir.clone(),
            cause,
        });
    }

    let report = match copier.copy_tree(&plan.source_path, &dest) {
        Ok(report) => report,
        Err(cause) => return fail(ItemError::Copy { dest, cause }),
    };

    let mut summary = format!(
        "Copied '{}' to '{}' ({} files, {} directories, no archive produced)",
        plan.source_path.display(),
        dest.display(),
        report.files,
        report.dirs,
    );
    if report.skipped > 0 {
        warn!(item = %plan.item_name, skipped = report.skipped, "some entries were not copied");
        summary.push_str(&format!("; {} entries skipped", report.skipped));
    }
    info!(item = %plan.item_name, dest = %dest.display(), "copy finished");
    ExecutionResult::success(&plan.item_name, Action::Copy, summary)
}
