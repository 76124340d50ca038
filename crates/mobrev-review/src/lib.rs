//! Review orchestration for mobile pull requests.
//!
//! Provides the review pipeline: GitHub gateway, LLM client, rubric loading,
//! prompt construction, risk parsing, chat alerts, and the orchestrator that
//! sequences them.

pub mod alert;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod risk;
pub mod rubric;
