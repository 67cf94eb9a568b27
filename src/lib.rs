// Library surface for headless/integration tests and reuse.
// Terminal setup and the CLI stay in main.rs.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod runtime;
pub mod scoring;
pub mod sentences;
pub mod session;
pub mod store;
pub mod timer;
pub mod ui;
