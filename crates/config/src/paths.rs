//! Path utilities

use std::path::{Path, PathBuf};

/// User data directory (~/.stepwise)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .expect("failed to locate home directory")
        .join(".stepwise")
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Default work directory for agent runs
pub fn workspace_path() -> PathBuf {
    data_dir().join("work")
}

/// Long-term memory store location
pub fn memory_path() -> PathBuf {
    data_dir().join("memory.json")
}

/// Installed prompt template directory
pub fn prompts_path() -> PathBuf {
    data_dir().join("prompts")
}

/// Ensure directory exists
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}

/// Sanitize filename for storage
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect()
}
