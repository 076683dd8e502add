// ActionBoard - app/mod.rs
//
// Application layer: source retrieval, caching, query orchestration.
// Dependencies: core, platform (filesystem reads).

pub mod cache;
pub mod query;
pub mod source;
