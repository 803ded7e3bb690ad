/// Local filesystem JSONL transport.
pub mod fs;

pub use fs::{JsonlWriter, read_jsonl, rewrite_jsonl, write_jsonl};
