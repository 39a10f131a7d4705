use crate::error::ReportError;
use crate::report::repository::ReportRepository;
use crate::report::vault::Vault;
use anyhow::Result;

/// Zero-based line and character, like an editor cursor. `None` means the
/// end of the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub line: Option<usize>,
    pub ch: Option<usize>,
}

/// Byte offset for `cursor`, clamped to the document.
fn cursor_offset(content: &str, cursor: Cursor) -> usize {
    let Some(line) = cursor.line else {
        return content.len();
    };

    let mut start = 0usize;
    for _ in 0..line {
        match content[start..].find('\n') {
            Some(idx) => start += idx + 1,
            None => return content.len(),
        }
    }

    let line_end = content[start..]
        .find('\n')
        .map(|idx| start + idx)
        .unwrap_or(content.len());
    let line_text = &content[start..line_end];
    let Some(ch) = cursor.ch else {
        return line_end;
    };
    let within = line_text
        .char_indices()
        .nth(ch)
        .map(|(idx, _)| idx)
        .unwrap_or(line_text.len());
    start + within
}

pub fn insert_at(content: &str, cursor: Cursor, text: &str) -> String {
    let offset = cursor_offset(content, cursor);
    let mut out = String::with_capacity(content.len() + text.len());
    out.push_str(&content[..offset]);
    out.push_str(text);
    out.push_str(&content[offset..]);
    out
}

/// Insert the configured template into `note`. Without a template nothing is
/// written.
pub fn insert_template(
    vault: &dyn Vault,
    repo: &ReportRepository<'_>,
    note: &str,
    cursor: Cursor,
) -> Result<usize> {
    let Some(template) = repo.read_template()? else {
        return Err(ReportError::TemplateUnset.into());
    };
    let content = vault.read(note)?;
    vault.write(note, &insert_at(&content, cursor, &template))?;
    Ok(template.len())
}
