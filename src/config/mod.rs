//! Service configuration: CLI options, constants, and alert defaults.

mod constants;
mod types;

pub use constants::*;
pub use types::{AlertDefaults, Config, LogFormat, LogLevel, MailSettings};
