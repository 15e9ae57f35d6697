//! Utility functions and helpers.

pub mod data_url;
pub mod http;
pub mod input;
pub mod message;

pub use data_url::{InlineData, encode_data_url, parse_data_url};
pub use message::first_message;
