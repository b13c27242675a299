//! Cross-module scene tests

mod hierarchy_properties;
mod publication;
