//! Conversation core: message model, transcript store, tool registry,
//! completion client, and the per-turn engine.

/// Blocking chat-completions client and outcome types.
pub mod client;
/// One-turn conversation orchestration.
pub mod engine;
/// Message and role wire/disk model.
pub mod message;
/// Ordered transcript with JSON persistence.
pub mod transcript;
/// Tool schema, registry, and invocation.
pub mod tools;
