//! Profile files on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ProfileError;

const APP_DIR: &str = "midi-trigger";

/// Directory holding profile files, addressed by file name.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<platform config dir>/midi-trigger/profiles`, or `./profiles` when
    /// the platform has no config dir.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("profiles"))
            .unwrap_or_else(|| PathBuf::from("profiles"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn read(&self, name: &str) -> Result<Vec<String>, ProfileError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))?;

        match fs::read_to_string(&path) {
            Ok(text) => Ok(text.lines().map(str::to_owned).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ProfileError::NotFound(name.to_string()))
            }
            Err(source) => Err(ProfileError::Io {
                name: name.to_string(),
                source,
            }),
        }
    }

    /// File names in the profile directory, sorted. A missing directory is
    /// just an empty list.
    pub fn list(&self) -> std::io::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return None;
        }
        let path = self.dir.join(name);
        path.is_file().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_lines_of_a_profile() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Piano.txt"), "vel:25\n60:0:0:0\n").unwrap();

        let store = ProfileStore::new(dir.path());
        assert_eq!(store.read("Piano.txt").unwrap(), vec!["vel:25", "60:0:0:0"]);
    }

    #[test]
    fn missing_or_escaping_names_are_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        let store = ProfileStore::new(dir.path());

        for name in ["nope.txt", "", "..", "../etc/passwd", "nested"] {
            assert!(
                matches!(store.read(name), Err(ProfileError::NotFound(_))),
                "{name:?}"
            );
        }
    }

    #[test]
    fn lists_files_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a b.txt"), "").unwrap();
        fs::create_dir(dir.path().join("schematics")).unwrap();

        let store = ProfileStore::new(dir.path());
        assert_eq!(store.list().unwrap(), vec!["a b.txt", "b.txt"]);
    }

    #[test]
    fn missing_dir_lists_nothing() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
    }
}
