mod client;

pub use client::{OpenAqClient, parse_latest};
