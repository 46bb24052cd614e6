//! Batch launching of detached worker processes.
//!
//! - `WorkerCommand`: `plots create` argument template
//! - `Spawner`, `DetachedSpawner`: fire-and-forget process start
//! - `BatchLauncher`: staggered launch of one batch per destination
//! - log naming and end-of-rotation log cleanup

mod batch;
mod command;
mod logs;
mod spawner;

pub use batch::{BatchLauncher, LaunchReport};
pub use command::{WorkerCommand, WorkerInvocation};
pub use logs::{clear_log_dir, log_file_name, log_file_path};
pub use spawner::{DetachedSpawner, Spawner};
