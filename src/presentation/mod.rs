//! Client-side presentation state.

pub mod preferences;
