pub mod analyzers;
pub mod config;
pub mod fetch;
pub mod infra;
pub mod map;
pub mod output;
pub mod pipeline;
pub mod services;
pub mod sources;
