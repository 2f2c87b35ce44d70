#![deny(unsafe_code)]

/// Command-line arguments.
pub mod cli;
/// Terminal view over the chat runtime.
pub mod console;
pub mod logging;
/// Settings loading.
pub mod settings;
