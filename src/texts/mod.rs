use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::StoreError;

/// Localized text lookup for reminder payloads. Keys are template names;
/// values may contain `{placeholder}` markers filled by [`render`].
pub trait TextProvider: Send + Sync {
    fn get(&self, key: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct TextRow {
    key: String,
    text: String,
}

/// Templates ingested from a two-column CSV (key,text).
pub struct CsvTexts {
    templates: HashMap<String, String>,
}

impl CsvTexts {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let mut templates = HashMap::new();
        let mut rdr = csv::Reader::from_path(path)?;

        for result in rdr.deserialize() {
            let row: TextRow = result?;
            templates.insert(row.key, row.text);
        }
        Ok(Self { templates })
    }
}

impl TextProvider for CsvTexts {
    fn get(&self, key: &str) -> String {
        match self.templates.get(key) {
            Some(text) => text.clone(),
            None => {
                log::warn!("missing text template '{}'", key);
                key.to_string()
            }
        }
    }
}

/// Fill `{name}` placeholders in a template.
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}
