//! Pre-LLM file filtering and patch sanitizing.
//!
//! Decides which changed files are worth sending to the model and trims
//! their patches so a single file or line cannot blow up the prompt.

pub mod filter;
