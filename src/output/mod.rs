//! Output sinks for the pipeline
//!
//! Both pipeline outputs are append-only newline-delimited JSON files: the
//! dataset of persisted documents and the error log of task postmortems.

mod jsonl;

pub use jsonl::JsonlAppender;
