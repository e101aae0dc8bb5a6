//! Terminal front end for GCN project teardown

pub mod folders;
pub mod logging;
pub mod ui;

pub use folders::{load_folder, load_folders};
pub use logging::LogOptions;
pub use ui::{TerminalProgress, display_plan, display_report};
