pub mod chat_stream;
pub mod config;
pub mod conversation;
pub mod discovery;
pub mod message;
pub mod prompt;
pub mod reasoning;
pub mod session;
pub mod streamer;
pub mod turn;
