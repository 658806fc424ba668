// Library interface for portfolio-monitor modules
// This allows tests and other binaries to import modules

pub mod archive;
pub mod digest;
pub mod email;
pub mod error;
pub mod funding;
pub mod ingestion;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod throttle;
