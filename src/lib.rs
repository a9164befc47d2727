//! Referral Bot Library
//!
//! A Telegram group bot that counts how many members each user adds and
//! offers a reward every time a user completes a cycle of additions.
//!
//! This crate provides the core functionality for:
//! - Loading and validating the bot configuration
//! - Counting added members per user and evaluating reward cycles
//! - Reacting to joins, commands and button presses in one group
//! - Sending notifications that delete themselves after a delay

pub mod config;
pub mod events;
pub mod notify;
pub mod referral;
pub mod scheduler;
pub mod telegram;
pub mod types;
