//! Localization-string resolution for advancement titles/descriptions.
//!
//! Advancement definitions usually carry `translate` keys rather than
//! literal text; the matching `en_us.json` map lives either as a plain file
//! (pre-extracted assets) or inside the distribution jar. Unresolvable keys
//! fall back to the key itself so the caller can tell they are unresolved.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// A loaded `<locale>.json` translation map.
#[derive(Debug, Default, Clone)]
pub struct LangTable {
    entries: HashMap<String, String>,
}

impl LangTable {
    pub fn from_map(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Load from a plain extracted file; `None` if missing or malformed.
    pub fn from_file(path: &Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        let entries = serde_json::from_slice(&bytes).ok()?;
        Some(Self { entries })
    }

    /// Load `assets/<ns>/lang/<locale>.json` out of a jar; `None` if the
    /// jar or the entry is missing.
    pub fn from_archive(archive_path: &Path, namespace: &str, locale: &str) -> Option<Self> {
        let file = std::fs::File::open(archive_path).ok()?;
        let mut zip = zip::ZipArchive::new(file).ok()?;
        let entry_name = format!("assets/{namespace}/lang/{locale}.json");
        let mut entry = zip.by_name(&entry_name).ok()?;
        let mut text = String::new();
        entry.read_to_string(&mut text).ok()?;
        let entries = serde_json::from_str(&text).ok()?;
        Some(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a translation key, substituting `%s` / `%1$s` placeholders
    /// from `args`. Unknown keys come back unchanged.
    pub fn resolve(&self, key: &str, args: &[&str]) -> String {
        let Some(template) = self.entries.get(key) else {
            return key.to_string();
        };
        format_template(template, args)
    }
}

/// Substitute positional (`%1$s`) then sequential (`%s`) placeholders.
fn format_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut consumed = 0;
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let rest = &template[i + 1..];
        if rest.starts_with('s') {
            out.push_str(args.get(consumed).copied().unwrap_or(""));
            consumed += 1;
            chars.next(); // skip 's'
        } else if let Some(dollar) = rest.find("$s") {
            if let Ok(position) = rest[..dollar].parse::<usize>() {
                out.push_str(args.get(position.saturating_sub(1)).copied().unwrap_or(""));
                for _ in 0..dollar + 2 {
                    chars.next();
                }
            } else {
                out.push(c);
            }
        } else {
            out.push(c);
        }
    }
    out
}
