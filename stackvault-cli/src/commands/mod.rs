pub mod config;
pub mod redact;
pub mod serve;
pub mod status;
pub mod sync;
