//! Application layer - command and query handlers.
//!
//! Handlers orchestrate domain logic through ports. Each handler owns one
//! operation: a `Command`/`Query` input struct, a `Result` output struct,
//! and a `handle` method that does the work.

pub mod handlers;
