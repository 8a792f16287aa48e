pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod retrieval;
pub mod verifier;

pub use verifier::cache;

pub use marking_verify_common as common;
