pub mod call;
pub mod config;
pub mod functions;
pub mod pipeline;
pub mod visualize;
