//! Gemichat is a terminal chat client for Google's Gemini models.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session state store (conversation plus generation
//!   settings), the inference gateway boundary and its Gemini
//!   implementation, credential resolution and the persisted defaults file.
//! - [`commands`] implements slash-command parsing and execution used by the
//!   chat loop.
//! - [`api`] defines the Gemini request/response payloads and the supported
//!   model catalogue.
//! - [`logging`] configures `tracing` output.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`cli::chat`] for
//! interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod logging;
pub mod utils;
