mod core;
mod loader;

pub use self::core::{
    shared_base_dir, AnalyzerConfig, CodetrendConfig, FailurePolicy, FilesConfig, OutputConfig,
    TrendConfig,
};
pub use loader::{
    directory_ancestors, load_config, load_config_from, load_config_near,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
