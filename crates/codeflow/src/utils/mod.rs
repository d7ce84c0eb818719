//! Utilities module - string helpers for config parsing and LLM output handling

pub mod text_utils;

pub use text_utils::TextUtils;
