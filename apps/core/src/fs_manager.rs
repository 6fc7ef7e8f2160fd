use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// File name of the symptom knowledge base inside the data directory.
pub const KNOWLEDGE_BASE_FILENAME: &str = "symptoms.json";

/// File name of the system prompt inside the prompts directory.
pub const SYSTEM_PROMPT_FILENAME: &str = "base_prompt.txt";

/// Resolves the on-disk layout of a SymSafe installation from a single root.
///
/// ```text
/// <root>/data/symptoms.json
/// <root>/prompts/base_prompt.txt
/// <root>/logs/
/// ```
#[derive(Debug, Clone)]
pub struct PortablePathManager {
    root: PathBuf,
}

impl PortablePathManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Picks the root directory: the working directory when it holds a `data/`
    /// folder, otherwise the directory of the executable.
    pub fn discover() -> Self {
        let cwd = std::env::current_dir().ok();
        if let Some(dir) = cwd.as_ref().filter(|d| d.join("data").exists()) {
            return Self::new(dir.clone());
        }

        match std::env::current_exe() {
            Ok(mut path) => {
                path.pop();
                if path.join("data").exists() {
                    return Self::new(path);
                }
            }
            Err(e) => {
                error!("Failed to get current exe path: {}. Falling back to current_dir.", e);
            }
        }

        Self::new(cwd.unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.root.join("prompts")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn knowledge_base_path(&self) -> PathBuf {
        self.data_dir().join(KNOWLEDGE_BASE_FILENAME)
    }

    pub fn system_prompt_path(&self) -> PathBuf {
        self.prompts_dir().join(SYSTEM_PROMPT_FILENAME)
    }

    /// Creates the given log directory if it does not exist yet.
    pub fn ensure_dir(path: &Path) -> Result<(), std::io::Error> {
        if !path.exists() {
            info!("Creating directory: {:?}", path);
            fs::create_dir_all(path)?;
        }
        Ok(())
    }
}
