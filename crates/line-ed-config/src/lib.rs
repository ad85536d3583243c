pub mod config;

pub use config::{EditorConfig, SearchDefaults};
