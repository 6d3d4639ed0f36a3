//! Library half of the `fractal` binary: search driver and output rendering.

pub mod render;
mod search;

pub use search::{
    engine_config, offline_clients, remote_clients, run_search, CliError, SearchOptions,
    SearchReport,
};
