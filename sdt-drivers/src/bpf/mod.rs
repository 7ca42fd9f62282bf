//! Band-pass filter relay boards

pub mod mcp23017;

pub use mcp23017::{Mcp23017Bpf, DEFAULT_ADDRESS};
