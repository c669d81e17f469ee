//! Interactive chat-completions client with local tool calls.
//!
//! The crate keeps a linear conversation transcript, talks to an
//! OpenAI-format chat-completions endpoint, and lets the model invoke
//! locally registered tool functions. The binary wraps everything in a
//! line-oriented REPL with a small set of `/` commands.

/// Transcript, tools, completion client, and the conversation engine.
pub mod chat;
/// Model-menu configuration loading.
pub mod config;
/// Command interpreter and interactive loop.
pub mod repl;
