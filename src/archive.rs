//! Zipping one item into `<dest>/<run>/<run>.zip`.

use crate::capability::{ArchiveFormat, ArchiveInvocation, Archiver, DirCreator};
use crate::error::ItemError;
use crate::plan::ResolvedPlan;
use crate::report::{Action, ExecutionResult};
use tracing::{debug, error, info};

/// Archives `plan` with `archiver` and classifies the result.
///
/// The run folder is created first; if that fails the archiver is never called.
/// Success means the archiver completed with exit status 0, anything else is a
/// failure carrying the raw status where there is one.
pub fn archive(
    plan: &ResolvedPlan,
    archiver: &dyn Archiver,
    dirs: &dyn DirCreator,
) -> ExecutionResult {
    let output = plan.archive_path();
    let attempted = output.display().to_string();
    let fail = |err: ItemError| {
        error!(item = %plan.item_name, error = %err, "archive failed");
        ExecutionResult::failure(&plan.item_name, Action::Archive, &attempted, err)
    };

    let run_dir = plan.run_dir();
    if let Err(cause) = dirs.ensure_exists(&run_dir) {
        return fail(ItemError::DirectoryCreation {
            path: run_dir,
            cause,
        });
    }

    let invocation = ArchiveInvocation {
        format: ArchiveFormat::Zip,
        output_path: output.clone(),
        source_path: plan.source_path.clone(),
        compression_level: plan.compression_level,
        password: plan.password.clone(),
    };
    debug!(item = %plan.item_name, archiver = archiver.name(), ?invocation, "invoking archiver");

    let report = match archiver.invoke(&invocation) {
        Ok(report) => report,
        Err(cause) => return fail(ItemError::ArchiveLaunch { output, cause }),
    };
    if !report.completed {
        return fail(ItemError::ArchiveIncomplete { output });
    }
    match report.exit_status {
        Some(0) => {}
        Some(status) => return fail(ItemError::ArchiveExit { output, status }),
        None => return fail(ItemError::ArchiveIncomplete { output }),
    }

    let protection = if plan.is_password_protected() {
        "with password protection"
    } else {
        "without password protection"
    };
    let summary = format!(
        "Archived '{}' to '{}' ({} compression, level {}, {})",
        plan.source_path.display(),
        output.display(),
        invocation.format.as_str(),
        plan.compression_level,
        protection,
    );
    info!(item = %plan.item_name, output = %output.display(), "archive written");
    ExecutionResult::success(&plan.item_name, Action::Archive, summary)
}
