//! GraphQL schema types and their registry.

pub mod meta;
pub mod registry;
