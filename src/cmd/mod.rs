/*!
Subcommand implementations.

Each submodule owns one CLI subcommand: its clap argument struct and a
synchronous `execute_*` entry point called from `main`.
*/

pub mod catalog;
pub mod exec;
pub mod serve;

pub use catalog::{CatalogArgs, execute_catalog};
pub use exec::{ExecArgs, execute_exec};
pub use serve::{ServeArgs, execute_serve};
