//! Reflect MCP server: exposes the Reflect note-taking REST API as MCP
//! tools, with time-zone-aware daily-note date computation.

pub mod client;
pub mod dates;
pub mod redact;
pub mod server;
pub mod tools;
