//! bkrun: a configuration-driven backup orchestrator.
//!
//! Each configured item is resolved against the global defaults, given a
//! timestamped run name, and then either zipped or copied. Every item yields
//! exactly one [`report::ExecutionResult`]; a failing item never stops the rest.

pub mod application;
pub mod archive;
pub mod capability;
pub mod constants;
pub mod copy;
pub mod error;
pub mod file_util;
pub mod item;
pub mod logging;
pub mod naming;
pub mod orchestrator;
pub mod path_util;
pub mod plan;
pub mod report;
pub mod sysexits;

pub use application::Application;
pub use error::{ConfigError, ItemError};
pub use item::{BackupItemConfig, GlobalDefaults, Password};
pub use orchestrator::Orchestrator;
pub use plan::{ResolvedPlan, resolve};
pub use report::{Action, ExecutionResult, Outcome};
