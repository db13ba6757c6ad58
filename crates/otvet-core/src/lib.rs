//! # otvet-core
//!
//! Core types, traits, configuration, and error handling for the otvet bot.

pub mod config;
pub mod error;
pub mod knowledge;
pub mod message;
pub mod traits;
