//! # otvet-channels
//!
//! Messaging platform integrations for otvet.

pub mod telegram;
pub mod utils;
