use crate::report::vault::Vault;
use crate::report::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCache {
    pub frontmatter: Option<Mapping>,
}

/// Front-matter lookup and in-place editing for notes.
pub trait MetadataCache {
    /// `None` for anything that is not a markdown note.
    fn file_cache(&self, path: &str) -> Result<Option<FileCache>>;
    /// Read-modify-write of the note's front-matter; keys the mutator does not
    /// touch are kept in their original order.
    fn process_front_matter(&self, path: &str, mutate: &mut dyn FnMut(&mut Mapping))
    -> Result<()>;
}

struct Split<'a> {
    yaml: Option<&'a str>,
    body: &'a str,
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']) == "---"
}

/// Split a note into its `---` fenced YAML header and the rest.
fn split_frontmatter(content: &str) -> Split<'_> {
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Split {
            yaml: None,
            body: content,
        };
    };
    if !is_fence(first) {
        return Split {
            yaml: None,
            body: content,
        };
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if is_fence(line) {
            return Split {
                yaml: Some(&content[yaml_start..offset]),
                body: &content[offset + line.len()..],
            };
        }
        offset += line.len();
    }

    Split {
        yaml: None,
        body: content,
    }
}

fn parse_mapping(yaml: &str) -> Result<Mapping> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => anyhow::bail!("front-matter is not a mapping: {other:?}"),
    }
}

fn render(map: &Mapping, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(map)?;
    Ok(format!("---\n{yaml}---\n{body}"))
}

pub fn is_markdown(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("md"))
}

/// Front-matter parsed straight from the vault on every lookup.
pub struct FrontmatterStore<'a> {
    vault: &'a dyn Vault,
}

impl<'a> FrontmatterStore<'a> {
    pub fn new(vault: &'a dyn Vault) -> Self {
        Self { vault }
    }
}

impl MetadataCache for FrontmatterStore<'_> {
    fn file_cache(&self, path: &str) -> Result<Option<FileCache>> {
        if !is_markdown(path) || self.vault.file(path)?.is_none() {
            return Ok(None);
        }

        let content = self.vault.read(path)?;
        let Some(yaml) = split_frontmatter(&content).yaml else {
            return Ok(Some(FileCache::default()));
        };
        match parse_mapping(yaml) {
            Ok(map) => Ok(Some(FileCache {
                frontmatter: Some(map),
            })),
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "FRONTMATTER_INVALID",
                    stage: "metadata",
                    action: "parse",
                    path,
                    reason: "ignored-front-matter",
                    err: &format!("{err:#}"),
                });
                Ok(Some(FileCache::default()))
            }
        }
    }

    fn process_front_matter(
        &self,
        path: &str,
        mutate: &mut dyn FnMut(&mut Mapping),
    ) -> Result<()> {
        let content = self.vault.read(path)?;
        let split = split_frontmatter(&content);
        let mut map = match split.yaml {
            Some(yaml) => parse_mapping(yaml)
                .with_context(|| format!("refusing to rewrite malformed front-matter in {path}"))?,
            None => Mapping::new(),
        };

        mutate(&mut map);
        self.vault.write(path, &render(&map, split.body)?)
    }
}
