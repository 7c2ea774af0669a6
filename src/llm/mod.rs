//! Decision oracle: prompt building, HTTP client and reply parsing

pub mod client;
pub mod context;
pub mod oracle;
pub mod parser;

pub use client::LlmClient;
pub use context::WorkerContext;
pub use oracle::{
    DecisionOracle, LlmOracle, NoopOracle, OracleDispatcher, OracleReply, ScriptedOracle,
};
pub use parser::parse_task_kind;
