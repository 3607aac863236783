//! Hent - Media Downloads and Voice Chat
//!
//! A small personal web utility served over HTTP.
//!
//! The name "Hent" comes from the Norwegian/Scandinavian word for "fetch."
//!
//! # Overview
//!
//! Hent bundles two features behind one server:
//! - Download video or audio from a URL with yt-dlp, transcode it, tag it,
//!   and serve the result for pickup with progress polling
//! - Chat with a hosted language model and hear the reply through a hosted
//!   text-to-speech voice
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `media` - Media extraction, transcoding and tagging collaborators
//! - `controller` - Single-slot download job coordination
//! - `history` - Bounded download log
//! - `chat` - LLM chat with model fallback
//! - `tts` - Speech synthesis
//! - `server` - HTTP API surface
//!
//! # Example
//!
//! ```rust,no_run
//! use hent::config::Settings;
//! use hent::server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     server::run_serve("127.0.0.1", 8081, settings).await?;
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod media;
pub mod openai;
pub mod server;
pub mod tts;

pub use error::{HentError, Result};
