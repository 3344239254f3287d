//! Internationalization (i18n) support

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const EMBEDDED: &[(&str, &str)] = &[
    ("pt-BR", include_str!("pt-BR.yml")),
    ("en", include_str!("en.yml")),
];

type Table = HashMap<String, serde_yaml::Value>;

/// Internationalization handler
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, Table>,
}

impl I18n {
    /// Create a handler with the built-in string tables
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        for (lang, source) in EMBEDDED {
            match serde_yaml::from_str::<Table>(source) {
                Ok(table) => {
                    translations.insert(lang.to_string(), table);
                }
                Err(e) => tracing::error!("Built-in language table {} is invalid: {}", lang, e),
            }
        }
        Self {
            language: language.to_string(),
            translations,
        }
    }

    /// Load language overrides from a directory.
    /// Keys in `<lang>.yml` replace the built-in ones for that language.
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml") | Some("json")) {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            // JSON is valid YAML
            let content = fs::read_to_string(&path)?;
            let data: Table = match serde_yaml::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                    continue;
                }
            };

            let table = self.translations.entry(lang.to_string()).or_default();
            for (key, value) in data {
                merge_value(table.entry(key).or_insert(serde_yaml::Value::Null), value);
            }
            tracing::debug!("Loaded language file: {:?}", path);
        }

        Ok(())
    }

    /// Get a translation by key. Keys can be nested like "post.next".
    pub fn get(&self, key: &str) -> String {
        // `pt-BR` falls back to `pt` before English
        self.fallback_chain()
            .into_iter()
            .find_map(|lang| self.lookup(lang, key))
            .unwrap_or_else(|| key.to_string())
    }

    /// Get a translation and substitute `{name}` placeholders
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.get(key);
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }

    /// Translations as a nested object for templates (`t.post.next`)
    pub fn template_strings(&self) -> serde_json::Value {
        let mut merged = serde_yaml::Mapping::new();
        for lang in self.fallback_chain().into_iter().rev() {
            let Some(table) = self.translations.get(lang) else {
                continue;
            };
            for (key, value) in table {
                let slot = merged
                    .entry(serde_yaml::Value::String(key.clone()))
                    .or_insert(serde_yaml::Value::Null);
                merge_value(slot, value.clone());
            }
        }
        serde_json::to_value(&merged).unwrap_or_else(|e| {
            tracing::warn!("Translations are not representable as JSON: {}", e);
            serde_json::Value::Null
        })
    }

    /// Languages to consult, most specific first
    fn fallback_chain(&self) -> Vec<&str> {
        let mut chain = vec![self.language.as_str()];
        if let Some(base) = self.language.split('-').next() {
            if base != self.language {
                chain.push(base);
            }
        }
        if self.language != "en" {
            chain.push("en");
        }
        chain
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<String> {
        let data = self.translations.get(lang)?;
        get_nested_value(data, key).and_then(yaml_value_to_string)
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("pt-BR")
    }
}

/// Deep-merge an override into an existing value
fn merge_value(target: &mut serde_yaml::Value, value: serde_yaml::Value) {
    match (target, value) {
        (serde_yaml::Value::Mapping(existing), serde_yaml::Value::Mapping(incoming)) => {
            for (k, v) in incoming {
                match existing.get_mut(&k) {
                    Some(slot) => merge_value(slot, v),
                    None => {
                        existing.insert(k, v);
                    }
                }
            }
        }
        (target, value) => *target = value,
    }
}

/// Get a nested value from a YAML map using dot notation
fn get_nested_value<'a>(data: &'a Table, key: &str) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = data.get(parts.next()?)?;

    for part in parts {
        match current {
            serde_yaml::Value::Mapping(map) => {
                current = map.get(serde_yaml::Value::String(part.to_string()))?;
            }
            _ => return None,
        }
    }

    Some(current)
}

fn yaml_value_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
