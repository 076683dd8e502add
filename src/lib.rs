// ActionBoard - lib.rs
//
// Library entry point, exposing every module for integration testing and
// for embedding the query pass in another display layer.
//
// The command-line front end lives in `main.rs` and is not part of the
// library surface.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
