/// Package name.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// Default configuration file name.
pub const CONFIG_NAME: &str = "config.toml";
/// Environment variable that overrides the configuration file path.
pub const CONFIG_ENV: &str = "BKRUN_CONFIG";
/// 7-Zip executable looked up on `PATH` when none is configured.
pub const SEVEN_ZIP_PROGRAM: &str = "7z";
/// Ceiling for one external archiver call.
pub const DEFAULT_ARCHIVER_TIMEOUT_SECS: u64 = 60 * 60;
