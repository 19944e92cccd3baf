pub mod config;
pub mod credentials;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod scoring;
