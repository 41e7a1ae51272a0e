//! Terminal UI layer for the full-screen chat window.
//!
//! - [`chat_loop`]: the event loop that reads keys, starts turns and applies
//!   worker results handed back over a channel.
//! - [`view`]: conversation entries, entry field and scroll state.
//! - [`renderer`]: frame layout and drawing.
//! - [`wrapping`]: word wrapping of conversation lines to the frame width.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns the conversation and model invocation.

pub mod chat_loop;
pub mod renderer;
pub mod view;
pub mod wrapping;
