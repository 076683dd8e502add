// ActionBoard - core/mod.rs
//
// Core business logic layer.
// Must NOT depend on: app, platform, or any network/filesystem I/O.

pub mod export;
pub mod filter;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod projection;
pub mod schema;
