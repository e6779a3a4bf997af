use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE_NAME;

pub const DEFAULT_CONFIG: &str = r#"# codetrend configuration

[analyzer]
# Complexity analyzer; must be on PATH
command = "flog"
# Working-tree analysis: the file path is appended
args = ["-a"]
# History analysis: source is piped through stdin
stdin_args = ["-a", "-"]
parser = "flog"

[files]
include = ["."]
extensions = ["rb"]

[output]
# temp_dir = "/tmp/codetrend/tmp"
# output_dir = "/tmp/codetrend/output"

[trend]
# "drop" leaves failed revisions out, "placeholder" keeps them with an error
failed_revisions = "drop"
skip_empty_reports = false
# Revisions analyzed at once; 0 means one per CPU
jobs = 1
"#;

/// Write a default `.codetrend.toml` into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    fs::write(&config_path, DEFAULT_CONFIG)?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);

    Ok(config_path)
}
