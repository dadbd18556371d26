pub mod compile;
pub mod config;
pub mod discover;
pub mod display;
pub mod errors;
pub mod plot;
pub mod runner;
pub mod sampler;
pub mod stats;
pub mod store;
pub mod types;
