//! Drives every configured item through resolve, name, and archive or copy.

use crate::archive::archive;
use crate::capability::{Archiver, Copier, DirCreator, LocalDirs, TreeCopier};
use crate::copy::copy;
use crate::error::{ConfigError, Result};
use crate::item::{BackupItemConfig, GlobalDefaults};
use crate::naming::{Clock, NameClock, SystemClock, derive_run_name};
use crate::plan::resolve;
use crate::report::{Action, ExecutionResult};
use tracing::{error, info};

/// Owns the collaborators one run needs. Items are processed one at a time.
pub struct Orchestrator {
    archiver: Box<dyn Archiver>,
    copier: Box<dyn Copier>,
    dirs: Box<dyn DirCreator>,
    clock: Box<dyn Clock>,
    name_clock: NameClock,
}

impl Orchestrator {
    /// Uses `archiver` with the local filesystem, the tree copier and the system clock.
    pub fn new(archiver: Box<dyn Archiver>) -> Self {
        Self {
            archiver,
            copier: Box::new(TreeCopier),
            dirs: Box::new(LocalDirs),
            clock: Box::new(SystemClock),
            name_clock: NameClock::default(),
        }
    }

    pub fn with_copier(mut self, copier: Box<dyn Copier>) -> Self {
        self.copier = copier;
        self
    }

    pub fn with_dirs(mut self, dirs: Box<dyn DirCreator>) -> Self {
        self.dirs = dirs;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_name_clock(mut self, name_clock: NameClock) -> Self {
        self.name_clock = name_clock;
        self
    }

    /// Runs all `items` in order and returns one result per item.
    ///
    /// # Errors
    /// [`ConfigError::Empty`] when there is nothing to run. No item is touched then.
    pub fn run(
        &self,
        items: &[BackupItemConfig],
        defaults: &GlobalDefaults,
    ) -> Result<Vec<ExecutionResult>> {
        let mut results = Vec::with_capacity(items.len());
        self.run_each(items, defaults, |res| results.push(res))?;
        Ok(results)
    }

    /// Like [`Orchestrator::run`], but hands each result to `on_result` as soon
    /// as its item is done. A failed item never stops the ones after it.
    pub fn run_each<F>(
        &self,
        items: &[BackupItemConfig],
        defaults: &GlobalDefaults,
        mut on_result: F,
    ) -> Result<()>
    where
        F: FnMut(ExecutionResult),
    {
        if items.is_empty() {
            return Err(ConfigError::Empty);
        }
        info!(items = items.len(), "starting backup run");
        for item in items {
            on_result(self.run_item(item, defaults));
        }
        Ok(())
    }

    fn run_item(&self, item: &BackupItemConfig, defaults: &GlobalDefaults) -> ExecutionResult {
        info!(item = %item.name, "processing item");
        let run_name = derive_run_name(&item.name, self.clock.now(), self.name_clock);
        let plan = match resolve(item, defaults, run_name) {
            Ok(plan) => plan,
            Err(err) => {
                error!(item = %item.name, error = %err, "could not resolve item");
                let action = if item.should_zip {
                    Action::Archive
                } else {
                    Action::Copy
                };
                let attempted = attempted_dir(item, defaults);
                return ExecutionResult::failure(&item.name, action, &attempted, err);
            }
        };

        match plan.action() {
            Action::Archive => archive(&plan, self.archiver.as_ref(), self.dirs.as_ref()),
            Action::Copy => copy(&plan, self.copier.as_ref(), self.dirs.as_ref()),
        }
    }
}

/// Best-effort destination for an item that failed to resolve.
fn attempted_dir(item: &BackupItemConfig, defaults: &GlobalDefaults) -> String {
    let dir = if item.use_default_path {
        Some(&defaults.default_backup_path)
    } else {
        item.dest_path.as_ref()
    };
    match dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir.display().to_string(),
        _ => "<unset>".to_string(),
    }
}

/// Keeps the items named in `only`, in their configured order.
///
/// # Errors
/// [`ConfigError::UnknownItem`] for a name that matches no item.
pub fn select(items: &[BackupItemConfig], only: &[String]) -> Result<Vec<BackupItemConfig>> {
    if let Some(unknown) = only.iter().find(|n| !items.iter().any(|i| &i.name == *n)) {
        return Err(ConfigError::UnknownItem(unknown.clone()));
    }
    Ok(items
        .iter()
        .filter(|i| only.contains(&i.name))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ArchiveInvocation, ArchiverReport};
    use crate::error::{ItemError, LaunchError};
    use crate::file_util::CopyReport;
    use crate::item::Password;
    use crate::report::Outcome;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::cell::RefCell;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(9, 7, 2)
                .unwrap()
        }
    }

    /// Fails the first invocation, succeeds afterwards.
    struct FlakyArchiver {
        calls: Rc<RefCell<Vec<ArchiveInvocation>>>,
    }

    impl Archiver for FlakyArchiver {
        fn name(&self) -> &str {
            "flaky"
        }

        fn invoke(&self, args: &ArchiveInvocation) -> std::result::Result<ArchiverReport, LaunchError> {
            let mut calls = self.calls.borrow_mut();
            calls.push(args.clone());
            if calls.len() == 1 {
                Ok(ArchiverReport::exited(2))
            } else {
                Ok(ArchiverReport::ok())
            }
        }
    }

    struct NullCopier {
        calls: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl Copier for NullCopier {
        fn copy_tree(&self, _: &Path, dest: &Path) -> io::Result<CopyReport> {
            self.calls.borrow_mut().push(dest.to_path_buf());
            Ok(CopyReport::default())
        }
    }

    struct NullDirs;

    impl DirCreator for NullDirs {
        fn ensure_exists(&self, _: &Path) -> io::Result<()> {
            Ok(())
        }
    }

    struct Fakes {
        archived: Rc<RefCell<Vec<ArchiveInvocation>>>,
        copied: Rc<RefCell<Vec<PathBuf>>>,
    }

    fn orchestrator() -> (Orchestrator, Fakes) {
        let archived = Rc::new(RefCell::new(vec![]));
        let copied = Rc::new(RefCell::new(vec![]));
        let orch = Orchestrator::new(Box::new(FlakyArchiver {
            calls: Rc::clone(&archived),
        }))
        .with_copier(Box::new(NullCopier {
            calls: Rc::clone(&copied),
        }))
        .with_dirs(Box::new(NullDirs))
        .with_clock(Box::new(FixedClock));
        (orch, Fakes { archived, copied })
    }

    fn defaults() -> GlobalDefaults {
        GlobalDefaults {
            default_backup_path: PathBuf::from("/backups"),
            default_password: Password::new("global"),
        }
    }

    fn zip_item(name: &str) -> BackupItemConfig {
        let mut item = BackupItemConfig::new(name, format!("/data/{name}"));
        item.use_default_path = true;
        item.should_zip = true;
        item
    }

    #[test]
    fn test_empty_config_is_error() {
        let (orch, fakes) = orchestrator();
        let err = orch.run(&[], &defaults()).unwrap_err();
        assert!(matches!(err, ConfigError::Empty));
        assert!(fakes.archived.borrow().is_empty());
    }

    #[test]
    fn test_continue_on_error_keeps_order() {
        let (orch, _) = orchestrator();
        let items = vec![zip_item("First"), zip_item("Second")];
        let results = orch.run(&items, &defaults()).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].item_name, "First");
        assert!(matches!(
            results[0].outcome,
            Outcome::Failure(ItemError::ArchiveExit { status: 2, .. })
        ));
        assert_eq!(results[1].item_name, "Second");
        assert!(results[1].is_success());
    }

    #[test]
    fn test_dispatch_by_should_zip() {
        let (orch, fakes) = orchestrator();
        let mut copy_item = BackupItemConfig::new("Photos", "/data/photos");
        copy_item.dest_path = Some(PathBuf::from("/mnt/usb"));
        let items = vec![copy_item, zip_item("Docs")];

        let results = orch.run(&items, &defaults()).unwrap();
        assert_eq!(results[0].action, Action::Copy);
        assert_eq!(results[1].action, Action::Archive);
        assert_eq!(
            fakes.copied.borrow()[0],
            PathBuf::from("/mnt/usb/Photos-2024-03-05-09-07-02")
        );
        assert_eq!(
            fakes.archived.borrow()[0].output_path,
            PathBuf::from("/backups/Docs-2024-03-05-09-07-02/Docs-2024-03-05-09-07-02.zip")
        );
    }

    #[test]
    fn test_resolution_failure_does_not_stop_run() {
        let (orch, fakes) = orchestrator();
        let mut broken = zip_item("Broken");
        broken.source_path = PathBuf::new();
        let items = vec![broken, zip_item("Docs")];

        let results = orch.run(&items, &defaults()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].outcome,
            Outcome::Failure(ItemError::Resolution { .. })
        ));
        assert!(results[0].summary.contains("/backups"));
        // the broken item never reached the archiver
        assert_eq!(fakes.archived.borrow().len(), 1);
    }

    #[test]
    fn test_escaping_name_fails_without_copying() {
        let (orch, fakes) = orchestrator();
        let mut escaping = BackupItemConfig::new("../escaped", "/data/x");
        escaping.use_default_path = true;
        let mut photos = BackupItemConfig::new("Photos", "/data/photos");
        photos.use_default_path = true;
        let items = vec![escaping, photos];

        let results = orch.run(&items, &defaults()).unwrap();
        assert!(matches!(
            results[0].outcome,
            Outcome::Failure(ItemError::InvalidName(_))
        ));
        assert!(results[1].is_success());
        assert_eq!(
            *fakes.copied.borrow(),
            [PathBuf::from("/backups/Photos-2024-03-05-09-07-02")]
        );
    }

    #[test]
    fn test_password_never_reaches_unprotected_invocation() {
        let (orch, fakes) = orchestrator();
        let mut item = zip_item("Docs");
        item.use_default_password = true;
        item.password = Some(Password::new("own"));
        orch.run(&[item], &defaults()).unwrap();
        assert!(fakes.archived.borrow()[0].password.is_none());
    }

    #[test]
    fn test_same_name_same_second_collides() {
        let (orch, fakes) = orchestrator();
        let items = vec![zip_item("Docs"), zip_item("Docs")];
        orch.run(&items, &defaults()).unwrap();
        let archived = fakes.archived.borrow();
        assert_eq!(archived[0].output_path, archived[1].output_path);
    }

    #[test]
    fn test_run_each_streams_results() {
        let (orch, _) = orchestrator();
        let items = vec![zip_item("A"), zip_item("B"), zip_item("C")];
        let mut names = vec![];
        orch.run_each(&items, &defaults(), |res| names.push(res.item_name))
            .unwrap();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn test_select_keeps_declared_order() {
        let items = vec![zip_item("A"), zip_item("B"), zip_item("C")];
        let picked = select(&items, &["C".to_string(), "A".to_string()]).unwrap();
        let names: Vec<_> = picked.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["A", "C"]);
    }

    #[test]
    fn test_select_unknown_name() {
        let items = vec![zip_item("A")];
        let err = select(&items, &["Z".to_string()]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownItem(name) if name == "Z"));
    }
}
