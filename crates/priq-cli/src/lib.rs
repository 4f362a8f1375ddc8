//! priq CLI library.
//!
//! Walks a directory tree and hands every file to a pool of workers in
//! priority order through [`priq_stream::ChannelizedQueue`]. The resulting
//! manifest can later be checked against the tree with `verify`.

pub mod cli;
pub mod commands;
pub mod error;
pub mod manifest;
pub mod verify;
pub mod walker;
pub mod worker;
