use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use std::fs;
use std::path::PathBuf;

/// A regular file in the vault together with its creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    pub path: String,
    pub created: DateTime<Local>,
}

/// Direct children of a folder, as vault-relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub files: Vec<String>,
    pub folders: Vec<String>,
}

/// Document storage addressed by vault-relative, `/`-separated paths.
pub trait Vault {
    fn exists(&self, path: &str) -> Result<bool>;
    /// Creating a folder that already exists is not an error.
    fn create_folder(&self, path: &str) -> Result<()>;
    /// Fails when `path` already exists.
    fn create(&self, path: &str, content: &str) -> Result<()>;
    fn read(&self, path: &str) -> Result<String>;
    fn write(&self, path: &str, content: &str) -> Result<()>;
    /// Fails when `to` already exists.
    fn rename(&self, from: &str, to: &str) -> Result<()>;
    fn list(&self, folder: &str) -> Result<Listing>;
    /// `None` when the path is missing or is not a regular file.
    fn file(&self, path: &str) -> Result<Option<NoteFile>>;
}

pub fn join_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn absolute(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl Vault for FsVault {
    fn exists(&self, path: &str) -> Result<bool> {
        let abs = self.absolute(path);
        abs.try_exists()
            .with_context(|| format!("failed to stat {}", abs.display()))
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        let abs = self.absolute(path);
        fs::create_dir_all(&abs).with_context(|| format!("failed to create {}", abs.display()))
    }

    fn create(&self, path: &str, content: &str) -> Result<()> {
        let abs = self.absolute(path);
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&abs)
            .with_context(|| format!("failed to create {}", abs.display()))?;
        use std::io::Write;
        file.write_all(content.as_bytes())
            .with_context(|| format!("failed to write {}", abs.display()))?;
        Ok(())
    }

    fn read(&self, path: &str) -> Result<String> {
        let abs = self.absolute(path);
        fs::read_to_string(&abs).with_context(|| format!("failed to read {}", abs.display()))
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        let abs = self.absolute(path);
        fs::write(&abs, content).with_context(|| format!("failed to write {}", abs.display()))
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let src = self.absolute(from);
        let dst = self.absolute(to);
        if dst.exists() {
            bail!("destination {} already exists", dst.display());
        }
        fs::rename(&src, &dst)
            .with_context(|| format!("failed to move {} to {}", src.display(), dst.display()))
    }

    fn list(&self, folder: &str) -> Result<Listing> {
        let abs = self.absolute(folder);
        let read_dir =
            fs::read_dir(&abs).with_context(|| format!("failed to read {}", abs.display()))?;

        let mut out = Listing::default();
        for entry in read_dir {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
                continue;
            };
            let rel = join_path(folder, &name);
            if entry.file_type()?.is_dir() {
                out.folders.push(rel);
            } else {
                out.files.push(rel);
            }
        }
        out.files.sort();
        out.folders.sort();
        Ok(out)
    }

    fn file(&self, path: &str) -> Result<Option<NoteFile>> {
        let abs = self.absolute(path);
        let meta = match fs::metadata(&abs) {
            Ok(meta) => meta,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to stat {}", abs.display()));
            }
        };
        if !meta.is_file() {
            return Ok(None);
        }
        let created = meta
            .created()
            .or_else(|_| meta.modified())
            .with_context(|| format!("no timestamps for {}", abs.display()))?;
        Ok(Some(NoteFile {
            path: path.to_string(),
            created: DateTime::<Local>::from(created),
        }))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn join_path_handles_slashes_and_empty_folder() {
        assert_eq!(join_path("Reports", "a.md"), "Reports/a.md");
        assert_eq!(join_path("Reports/", "/a.md"), "Reports/a.md");
        assert_eq!(join_path("", "a.md"), "a.md");
        assert_eq!(file_name("Reports/archive/a.md"), "a.md");
        assert_eq!(file_name("a.md"), "a.md");
    }

    #[test]
    fn list_is_not_recursive() {
        let tmp = tempdir().expect("tempdir");
        let vault = FsVault::new(tmp.path());
        vault.create("Reports/2026-01-01.md", "a").expect("create");
        vault
            .create("Reports/archive/2025/old.md", "b")
            .expect("create nested");

        let listing = vault.list("Reports").expect("list");
        assert_eq!(listing.files, vec!["Reports/2026-01-01.md".to_string()]);
        assert_eq!(listing.folders, vec!["Reports/archive".to_string()]);
    }

    #[test]
    fn create_refuses_to_overwrite() {
        let tmp = tempdir().expect("tempdir");
        let vault = FsVault::new(tmp.path());
        vault.create("a.md", "first").expect("create");
        assert!(vault.create("a.md", "second").is_err());
        assert_eq!(vault.read("a.md").expect("read"), "first");
    }

    #[test]
    fn rename_refuses_existing_destination() {
        let tmp = tempdir().expect("tempdir");
        let vault = FsVault::new(tmp.path());
        vault.create("a.md", "a").expect("a");
        vault.create("b.md", "b").expect("b");
        assert!(vault.rename("a.md", "b.md").is_err());
        vault.create_folder("dest").expect("folder");
        vault.create_folder("dest").expect("idempotent folder");
        vault.rename("a.md", "dest/a.md").expect("move");
        assert!(!vault.exists("a.md").expect("exists"));
        assert_eq!(vault.read("dest/a.md").expect("read"), "a");
    }

    #[test]
    fn file_is_none_for_folders_and_missing_paths() {
        let tmp = tempdir().expect("tempdir");
        let vault = FsVault::new(tmp.path());
        vault.create_folder("Reports").expect("folder");
        vault.create("Reports/a.md", "").expect("file");

        assert!(vault.file("Reports").expect("folder").is_none());
        assert!(vault.file("Reports/missing.md").expect("missing").is_none());
        let note = vault.file("Reports/a.md").expect("file").expect("some");
        assert_eq!(note.path, "Reports/a.md");
    }
}
