//! Small shared helpers.

pub mod time_utils;
