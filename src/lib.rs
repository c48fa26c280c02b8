// src/lib.rs

//! Tour Tracker Library
//!
//! Scrapes the tour listing of a mountaineering club, keeps a snapshot of
//! every run and records what changed since the previous one.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
