//! One module per subcommand.

pub mod add;
#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod completions;
pub mod generate;
pub mod init;
pub mod list;
pub mod remove;
pub mod rotate;
