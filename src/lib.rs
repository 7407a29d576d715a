//! focus-gate: puts a confirmation step in front of distracting sites and
//! keeps same-day visit counts for them.

pub mod api;
pub mod config;
pub mod counters;
pub mod engine;
pub mod init;
pub mod interstitial;
pub mod logger;
pub mod messages;
pub mod settings;
pub mod store;
