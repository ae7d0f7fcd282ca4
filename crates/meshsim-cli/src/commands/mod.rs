//! # meshsim-cli::commands
//!
//! One module per subcommand.

pub mod list_firmware;
pub mod run;
pub mod validate;
