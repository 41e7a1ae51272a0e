//! thinkchat is a terminal chat client for reasoning models served by a local
//! Ollama instance.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation log, prompt construction, streamed model
//!   invocation, reasoning-span filtering and turn coordination.
//! - [`ui`] renders the full-screen window and runs its event loop.
//! - [`cli`] parses arguments, runs the menus and the line-oriented chat.
//! - [`api`] defines the Ollama wire payloads.
//! - [`utils`] holds transcript and diagnostics logging.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
