pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, load_config_file, load_game_config};
