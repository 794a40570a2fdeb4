//! Cross-module tests: fixtures plus end-to-end upload/ask scenarios.

pub(crate) mod fixtures;
