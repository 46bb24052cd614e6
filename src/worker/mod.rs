//! The external plotting tool: where its binary lives and which keys it plots with.

mod credentials;
mod locator;

pub use credentials::{Credentials, extract_credentials, parse_keys_output, resolve_credentials};
pub use locator::{locate_executable, windows_daemon_dir};
