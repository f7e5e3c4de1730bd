//! Interfaces to the archiver, the recursive copier and the filesystem, plus
//! the implementations the binary wires up.
//!
//! The executors only ever talk to these traits, so tests can hand them fakes.

use crate::error::LaunchError;
use crate::file_util::{self, CopyReport};
use crate::item::Password;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, error, warn};
use wait_timeout::ChildExt;

/// Exit status for a fatal archiver error (same value 7-Zip uses).
pub const EXIT_FATAL: i32 = 2;
/// Exit status for a bad command line, e.g. an unsupported level (same value 7-Zip uses).
pub const EXIT_USAGE: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
}

impl ArchiveFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
        }
    }
}

/// Everything an archiver needs for one archive.
#[derive(Debug, Clone)]
pub struct ArchiveInvocation {
    pub format: ArchiveFormat,
    pub output_path: PathBuf,
    pub source_path: PathBuf,
    /// Passed through unchanged. Range checks are the archiver's business.
    pub compression_level: i64,
    pub password: Option<Password>,
}

/// What the archiver reported once it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiverReport {
    pub completed: bool,
    pub exit_status: Option<i32>,
}

impl ArchiverReport {
    pub fn ok() -> Self {
        Self {
            completed: true,
            exit_status: Some(0),
        }
    }

    pub fn exited(status: i32) -> Self {
        Self {
            completed: true,
            exit_status: Some(status),
        }
    }

    pub fn incomplete() -> Self {
        Self {
            completed: false,
            exit_status: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.completed && self.exit_status == Some(0)
    }
}

pub trait Archiver {
    /// Short name for summaries and logs.
    fn name(&self) -> &str;

    /// Blocks until the archive is written or the archiver gives up.
    fn invoke(&self, args: &ArchiveInvocation) -> Result<ArchiverReport, LaunchError>;
}

pub trait Copier {
    /// Copies `source` into `dest` recursively. Per-entry errors are tolerated;
    /// `Err` means the copy could not run at all.
    fn copy_tree(&self, source: &Path, dest: &Path) -> io::Result<CopyReport>;
}

pub trait DirCreator {
    fn ensure_exists(&self, path: &Path) -> io::Result<()>;
}

/// Writes zip files in-process.
#[derive(Debug, Default)]
pub struct BuiltinZip;

impl Archiver for BuiltinZip {
    fn name(&self) -> &str {
        "builtin zip"
    }

    fn invoke(&self, args: &ArchiveInvocation) -> Result<ArchiverReport, LaunchError> {
        if !(0..=9).contains(&args.compression_level) {
            warn!(level = args.compression_level, "unsupported compression level");
            return Ok(ArchiverReport::exited(EXIT_USAGE));
        }
        match file_util::zip_source(
            &args.source_path,
            &args.output_path,
            args.compression_level,
            args.password.as_ref(),
        ) {
            Ok(()) => Ok(ArchiverReport::ok()),
            Err(e) => {
                error!(error = %e, output = %args.output_path.display(), "zip failed");
                Ok(ArchiverReport::exited(EXIT_FATAL))
            }
        }
    }
}

/// Runs the external 7-Zip command line tool.
///
/// The password travels on the command line as `-p<password>`, so other local
/// users who can list processes can read it while the archiver runs.
#[derive(Debug)]
pub struct SevenZip {
    pub program: String,
    pub timeout: Duration,
}

impl SevenZip {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// `a -t<format> -mx=<level> -y [-p<password>] <output> <source>`
    fn command(&self, args: &ArchiveInvocation) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("a")
            .arg(format!("-t{}", args.format.as_str()))
            .arg(format!("-mx={}", args.compression_level))
            .arg("-y");
        if let Some(pw) = &args.password {
            cmd.arg(format!("-p{}", pw.expose()));
        }
        cmd.arg(&args.output_path).arg(&args.source_path);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl Archiver for SevenZip {
    fn name(&self) -> &str {
        &self.program
    }

    fn invoke(&self, args: &ArchiveInvocation) -> Result<ArchiverReport, LaunchError> {
        debug!(
            program = %self.program,
            output = %args.output_path.display(),
            level = args.compression_level,
            password = args.password.is_some(),
            "spawning archiver"
        );
        let mut child = self
            .command(args)
            .spawn()
            .map_err(|cause| LaunchError::Spawn {
                program: self.program.clone(),
                cause,
            })?;
        let wait_err = |cause| LaunchError::Wait {
            program: self.program.clone(),
            cause,
        };

        match child.wait_timeout(self.timeout).map_err(wait_err)? {
            Some(status) => {
                debug!(exit_code = ?status.code(), "archiver finished");
                Ok(match status.code() {
                    Some(code) => ArchiverReport::exited(code),
                    // killed by a signal
                    None => ArchiverReport::incomplete(),
                })
            }
            None => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "archiver timed out, killing"
                );
                child.kill().map_err(wait_err)?;
                child.wait().map_err(wait_err)?;
                Ok(ArchiverReport::incomplete())
            }
        }
    }
}

/// Recursive copy through [`file_util::copy_tree`].
#[derive(Debug, Default)]
pub struct TreeCopier;

impl Copier for TreeCopier {
    fn copy_tree(&self, source: &Path, dest: &Path) -> io::Result<CopyReport> {
        file_util::copy_tree(source, dest)
    }
}

/// Creates directories on the local filesystem.
#[derive(Debug, Default)]
pub struct LocalDirs;

impl DirCreator for LocalDirs {
    fn ensure_exists(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}
