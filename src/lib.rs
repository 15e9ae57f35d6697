// src/lib.rs

//! Book import library
//!
//! Turns raw book text or photographed pages into a lesson preview via a
//! generative content-analysis service, lets the preview be edited, and
//! submits it to the backend import endpoint.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
