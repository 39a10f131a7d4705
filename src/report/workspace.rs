use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use std::process::Command;

pub trait Workspace {
    /// Open the note `name` that lives in `folder`.
    fn open_link_text(&self, name: &str, folder: &str) -> Result<()>;
}

/// Opens notes in the user's editor; with no editor configured the caller
/// only reports the path.
pub struct EditorWorkspace {
    vault_root: PathBuf,
    editor: Option<String>,
}

const EDITOR_VARS: &[&str] = &["DAILY_REPORT_EDITOR", "VISUAL", "EDITOR"];

fn editor_from_env() -> Option<String> {
    EDITOR_VARS.iter().find_map(|var| match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    })
}

impl EditorWorkspace {
    pub fn new(vault_root: impl Into<PathBuf>, editor: Option<String>) -> Self {
        Self {
            vault_root: vault_root.into(),
            editor,
        }
    }

    pub fn from_env(vault_root: impl Into<PathBuf>) -> Self {
        Self::new(vault_root, editor_from_env())
    }

    pub fn detached(vault_root: impl Into<PathBuf>) -> Self {
        Self::new(vault_root, None)
    }

    pub fn editor(&self) -> Option<&str> {
        self.editor.as_deref()
    }

    fn note_path(&self, name: &str, folder: &str) -> PathBuf {
        folder
            .split('/')
            .chain(name.split('/'))
            .filter(|part| !part.is_empty())
            .fold(self.vault_root.clone(), |acc, part| acc.join(part))
    }
}

impl Workspace for EditorWorkspace {
    fn open_link_text(&self, name: &str, folder: &str) -> Result<()> {
        let Some(editor) = self.editor.as_deref() else {
            return Ok(());
        };
        let mut parts = editor.split_whitespace();
        let Some(program) = parts.next() else {
            return Ok(());
        };
        let resolved = which::which(program)
            .with_context(|| format!("editor `{program}` not found on PATH"))?;

        let note = self.note_path(name, folder);
        let status = Command::new(&resolved)
            .args(parts)
            .arg(&note)
            .status()
            .with_context(|| format!("failed to launch {}", resolved.display()))?;
        if !status.success() {
            bail!("editor exited with {status} for {}", note.display());
        }
        Ok(())
    }
}
