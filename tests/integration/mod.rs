//! Integration tests driving the compiled `cargo-relay` binary

mod helpers;
mod test_check;
mod test_export;
mod test_pipeline;
