//! Remote execution for board measurements.
//!
//! Two paths share one result type: key-based sessions run `ssh` directly and capture
//! stdout/stderr, password sessions run it on a pseudo-terminal and answer prompts.
//! Neither returns `Err`; failures are reported through [`RemoteOutput`].

pub mod exec;
pub mod output;
pub mod prompt;
#[cfg(unix)]
pub mod pty;
pub mod ssh;

pub use exec::{run_interactive, run_plain, run_remote};
pub use output::{CancelFlag, RemoteOutput, EXIT_INTERNAL, EXIT_INTERRUPTED};
pub use prompt::{drive, Chunk, PromptTerminal};
pub use ssh::ssh_argv;
