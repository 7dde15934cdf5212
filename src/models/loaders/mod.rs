pub mod json_store;
pub mod toml_loader;

pub use json_store::{read_json, write_json_atomic};
pub use toml_loader::load_sources;
