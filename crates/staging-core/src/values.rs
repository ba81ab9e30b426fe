//! `values.yaml` access and the `suspended` flag edit.
//!
//! Edits are made on the parsed document. When writing back, the original text
//! is patched line-wise so comments and layout survive; the patch is accepted
//! only if it parses to exactly the edited document, otherwise the document
//! is re-serialized.

use crate::error::{Result, StagingError};
use crate::io;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

pub const SUSPENDED_KEY: &str = "suspended";
pub const COMPONENTS_KEY: &str = "components";

// ---------------------------------------------------------------------------
// App node helpers
// ---------------------------------------------------------------------------

/// True only when the node carries boolean `suspended: true`; strings such
/// as `"yes"` or numbers like `1` do not count.
pub fn is_suspended(node: &Mapping) -> bool {
    matches!(node.get(SUSPENDED_KEY), Some(Value::Bool(true)))
}

/// Copy of `node` with `suspended` set to `suspended`.
///
/// An existing key keeps its position. A missing key is placed first so the
/// flag sits directly under the alias, which is also where the text patch
/// inserts it.
pub fn with_suspended(node: &Mapping, suspended: bool) -> Mapping {
    let key = Value::String(SUSPENDED_KEY.to_string());
    if node.contains_key(&key) {
        let mut updated = node.clone();
        updated.insert(key, Value::Bool(suspended));
        return updated;
    }
    let mut updated = Mapping::with_capacity(node.len() + 1);
    updated.insert(key, Value::Bool(suspended));
    for (k, v) in node {
        updated.insert(k.clone(), v.clone());
    }
    updated
}

// ---------------------------------------------------------------------------
// ValuesFile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ValuesFile {
    pub path: PathBuf,
    text: String,
    doc: Value,
}

impl ValuesFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(path, text)
    }

    pub fn parse(path: &Path, text: String) -> Result<Self> {
        let doc: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(&text)?
        };
        Ok(Self {
            path: path.to_path_buf(),
            text,
            doc,
        })
    }

    pub fn document(&self) -> &Value {
        &self.doc
    }

    /// The map under `alias`, or `InvalidValues` when absent or not a map.
    pub fn app_node(&self, alias: &str) -> Result<&Mapping> {
        self.doc
            .get(alias)
            .and_then(Value::as_mapping)
            .ok_or_else(|| StagingError::InvalidValues {
                path: self.path.clone(),
                alias: alias.to_string(),
            })
    }

    /// Replace the node under `alias`. The document root must already be a map,
    /// which `app_node` has established for any alias it returned.
    pub fn set_app_node(&mut self, alias: &str, node: Mapping) -> Result<()> {
        let root = self
            .doc
            .as_mapping_mut()
            .ok_or_else(|| StagingError::InvalidValues {
                path: self.path.clone(),
                alias: alias.to_string(),
            })?;
        root.insert(Value::String(alias.to_string()), Value::Mapping(node));
        Ok(())
    }

    /// Serialized form of the current document, keeping the original text
    /// wherever it still describes the document.
    pub fn render(&self, alias: &str) -> Result<String> {
        let flag = self.doc.get(alias).and_then(|n| n.get(SUSPENDED_KEY));
        if let Some(Value::Bool(suspended)) = flag {
            if let Some(patched) = splice_suspended(&self.text, alias, *suspended) {
                if parses_to(&patched, &self.doc) {
                    return Ok(patched);
                }
            }
        }
        tracing::warn!(
            "{}: layout could not be patched in place; rewriting without comments",
            self.path.display()
        );
        Ok(serde_yaml::to_string(&self.doc)?)
    }

    pub fn save(&self, alias: &str) -> Result<()> {
        let data = self.render(alias)?;
        io::atomic_write(&self.path, data.as_bytes())
    }
}

fn parses_to(text: &str, expected: &Value) -> bool {
    serde_yaml::from_str::<Value>(text).is_ok_and(|v| &v == expected)
}

// ---------------------------------------------------------------------------
// Text patch
// ---------------------------------------------------------------------------

/// Set `suspended` inside the top-level block `alias:` of `text`.
///
/// Returns `None` when the block is not in plain block style (flow maps,
/// anchors on the header, no children).
fn splice_suspended(text: &str, alias: &str, suspended: bool) -> Option<String> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let header = lines.iter().position(|l| is_block_header(l, alias))?;
    if !lines[header].ends_with('\n') {
        return None;
    }

    let mut child_indent = None;
    let mut existing = None;
    for (i, line) in lines.iter().enumerate().skip(header + 1) {
        let content = strip_eol(line);
        let trimmed = content.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = content.len() - trimmed.len();
        if indent == 0 {
            break;
        }
        let child = *child_indent.get_or_insert(indent);
        if indent == child && key_matches(trimmed, SUSPENDED_KEY) {
            existing = Some(i);
            break;
        }
    }

    let indent = child_indent?;
    let value = if suspended { "true" } else { "false" };
    let mut out = String::with_capacity(text.len() + indent + 20);
    for (i, line) in lines.iter().enumerate() {
        if Some(i) == existing {
            out.push_str(&rewrite_value(line, value)?);
            continue;
        }
        out.push_str(line);
        if i == header && existing.is_none() {
            out.push_str(&" ".repeat(indent));
            out.push_str(SUSPENDED_KEY);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }
    Some(out)
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn key_matches(content: &str, key: &str) -> bool {
    [
        key.to_string(),
        format!("\"{key}\""),
        format!("'{key}'"),
    ]
    .iter()
    .any(|k| content.strip_prefix(k.as_str()).is_some_and(|r| r.starts_with(':')))
}

fn is_block_header(line: &str, alias: &str) -> bool {
    let content = strip_eol(line);
    if !key_matches(content, alias) {
        return false;
    }
    let Some((_, rest)) = content.split_once(':') else {
        return false;
    };
    let rest = rest.trim();
    rest.is_empty() || rest.starts_with('#')
}

/// `  suspended: false  # note` → `  suspended: true  # note`
fn rewrite_value(line: &str, value: &str) -> Option<String> {
    let content = strip_eol(line);
    let eol = &line[content.len()..];
    let (key, rest) = content.split_once(':')?;
    let comment = rest.find(" #").map(|c| &rest[c..]).unwrap_or("");
    Some(format!("{key}: {value}{comment}{eol}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VALUES: &str = "\
# Staging values
global:
  domain: example.dev

apka:
  # deployed by CI
  suspended: false # toggled by automation
  appCodeRepo: https://github.com/acme/shop
  components:
    api:
      appCodeRef: refs/heads/feature-x
    web:
      appCodeRef: main
";

    fn values(text: &str) -> ValuesFile {
        ValuesFile::parse(Path::new("values.yaml"), text.to_string()).unwrap()
    }

    fn keys(node: &Mapping) -> Vec<String> {
        node.keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn with_suspended_sets_flag_and_keeps_order() {
        let file = values(VALUES);
        let node = file.app_node("apka").unwrap();
        let updated = with_suspended(node, true);
        assert!(is_suspended(&updated));
        assert_eq!(keys(&updated), keys(node));
        assert_eq!(updated.get("components"), node.get("components"));
        assert_eq!(updated.get("appCodeRepo"), node.get("appCodeRepo"));
    }

    #[test]
    fn with_suspended_is_pure_and_repeatable() {
        let file = values(VALUES);
        let node = file.app_node("apka").unwrap();
        let before = node.clone();
        let a = serde_yaml::to_string(&with_suspended(node, true)).unwrap();
        let b = serde_yaml::to_string(&with_suspended(node, true)).unwrap();
        assert_eq!(a, b);
        assert_eq!(node, &before);
        assert!(!is_suspended(node));
    }

    #[test]
    fn with_suspended_inserts_missing_flag_first() {
        let file = values("app:\n  components: {}\n  appCodeRepo: x\n");
        let updated = with_suspended(file.app_node("app").unwrap(), true);
        assert_eq!(keys(&updated), ["suspended", "components", "appCodeRepo"]);
    }

    #[test]
    fn only_boolean_true_counts_as_suspended() {
        let file = values(
            "a:\n  suspended: \"true\"\nb:\n  suspended: true\nc:\n  x: 1\nd:\n  suspended: yes\ne:\n  suspended: 1\n",
        );
        assert!(!is_suspended(file.app_node("a").unwrap()));
        assert!(is_suspended(file.app_node("b").unwrap()));
        assert!(!is_suspended(file.app_node("c").unwrap()));
        assert!(!is_suspended(file.app_node("d").unwrap()));
        assert!(!is_suspended(file.app_node("e").unwrap()));
    }

    #[test]
    fn non_map_alias_is_invalid() {
        let file = values("app: just-a-string\n");
        let err = file.app_node("app").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid values file values.yaml: expected 'app' node to be a map"
        );
        assert!(values("other:\n  x: 1\n").app_node("app").is_err());
        assert!(values("").app_node("app").is_err());
    }

    #[test]
    fn render_patches_existing_flag_in_place() {
        let mut file = values(VALUES);
        let node = with_suspended(file.app_node("apka").unwrap(), true);
        file.set_app_node("apka", node).unwrap();
        let out = file.render("apka").unwrap();
        assert_eq!(
            out,
            VALUES.replace(
                "suspended: false # toggled by automation",
                "suspended: true # toggled by automation"
            )
        );
    }

    #[test]
    fn render_inserts_missing_flag_under_header() {
        let text = "apka: # app values\n    appCodeRepo: r\n    components: {}\nother: 1\n";
        let mut file = values(text);
        let node = with_suspended(file.app_node("apka").unwrap(), true);
        file.set_app_node("apka", node).unwrap();
        assert_eq!(
            file.render("apka").unwrap(),
            "apka: # app values\n    suspended: true\n    appCodeRepo: r\n    components: {}\nother: 1\n"
        );
    }

    #[test]
    fn render_ignores_nested_suspended_keys() {
        let text = "app:\n  components:\n    api:\n      suspended: false\n  suspended: false\n";
        let mut file = values(text);
        let node = with_suspended(file.app_node("app").unwrap(), true);
        file.set_app_node("app", node).unwrap();
        assert_eq!(
            file.render("app").unwrap(),
            "app:\n  components:\n    api:\n      suspended: false\n  suspended: true\n"
        );
    }

    #[test]
    fn render_falls_back_for_flow_style() {
        let mut file = values("app: {suspended: false, components: {}}\n");
        let node = with_suspended(file.app_node("app").unwrap(), true);
        file.set_app_node("app", node).unwrap();
        let out = file.render("app").unwrap();
        let parsed: Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(&parsed, file.document());
        assert!(is_suspended(parsed.get("app").unwrap().as_mapping().unwrap()));
    }

    #[test]
    fn save_writes_rendered_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("values.yaml");
        std::fs::write(&path, VALUES).unwrap();
        let mut file = ValuesFile::load(&path).unwrap();
        let node = with_suspended(file.app_node("apka").unwrap(), true);
        file.set_app_node("apka", node).unwrap();
        file.save("apka").unwrap();

        let reloaded = ValuesFile::load(&path).unwrap();
        assert!(is_suspended(reloaded.app_node("apka").unwrap()));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# deployed by CI"));
    }
}
