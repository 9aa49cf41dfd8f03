// Library surface for the binary, headless/integration tests and reuse.
pub mod api;
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod keymap;
pub mod model;
pub mod navigator;
pub mod proctor;
pub mod result;
pub mod runtime;
pub mod session;
pub mod status;
pub mod submission;
pub mod telemetry;
pub mod timer;
pub mod ui;
