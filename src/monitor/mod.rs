pub mod jsonl_store;
pub mod sink;
