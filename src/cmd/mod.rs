//! CLI command implementations.
//!
//! | Module       | Commands handled |
//! |--------------|------------------|
//! | `run`        | `Run`            |
//! | `signatures` | `Signatures`     |
//! | `clean`      | `Clean`          |
//! | `project`    | `Init`           |
//! | `config`     | `Config`         |

pub mod clean;
pub mod config;
pub mod project;
pub mod run;
pub mod signatures;

pub use clean::cmd_clean;
pub use config::cmd_config;
pub use project::cmd_init;
pub use run::cmd_run;
pub use signatures::cmd_signatures;
