//! File-backed preference storage: one `<key>.json` document per key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::preferences::PreferenceStore;

use super::error::InfraError;

#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    directory: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, InfraError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(InfraError::configuration(format!(
                "invalid preference key `{key}`"
            )));
        }
        Ok(self.directory.join(format!("{key}.json")))
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self, key: &str) -> Result<Option<String>, InfraError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes to a sibling temp file first so a crash never leaves a torn document.
    fn save(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.directory)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!(key, path = %path.display(), "Saved preferences");
        Ok(())
    }
}
