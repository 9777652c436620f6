use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CATCH_ALL_CATEGORY: &str = "Other";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRule {
    pub name: String,
    pub extensions: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

/// Ordered category rules plus a catch-all. The first rule whose extension
/// set matches the lowercased filename suffix wins; ties never re-resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
    catch_all: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoryTableFile {
    #[serde(default = "default_catch_all")]
    catch_all: String,
    rules: Vec<CategoryRule>,
}

fn default_catch_all() -> String {
    CATCH_ALL_CATEGORY.to_string()
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(
            vec![
                CategoryRule::new(
                    "Documents",
                    &[".pdf", ".docx", ".doc", ".txt", ".pptx", ".xls"],
                ),
                CategoryRule::new("Images", &[".png", ".jpg", ".jpeg"]),
                CategoryRule::new("Videos", &[".mp4", ".gif", ".mkv"]),
                CategoryRule::new("Audio", &[".mp3", ".wav"]),
                CategoryRule::new("Archives", &[".zip", ".rar"]),
                CategoryRule::new("Data", &[".xls", ".csv", ".json", ".xml", ".sql"]),
                CategoryRule::new("Code", &[".py", ".c", ".js", ".html", ".css", ".dart", ".h"]),
                CategoryRule::new("Font", &[".ttf", ".otf"]),
            ],
            CATCH_ALL_CATEGORY,
        )
    }
}

impl CategoryTable {
    pub fn new(rules: Vec<CategoryRule>, catch_all: impl Into<String>) -> Self {
        let rules = rules
            .into_iter()
            .map(normalize_rule)
            .filter(|rule| !rule.extensions.is_empty())
            .collect();
        Self {
            rules,
            catch_all: catch_all.into(),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read category table {}", path.display()))?;
        Self::from_json(&data)
            .with_context(|| format!("failed to parse category table {}", path.display()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let parsed: CategoryTableFile =
            serde_json::from_str(data).context("category table is not valid JSON")?;
        anyhow::ensure!(
            !parsed.rules.is_empty(),
            "category table must declare at least one rule"
        );
        Ok(Self::new(parsed.rules, parsed.catch_all))
    }

    /// Total over all filenames: always returns exactly one category name.
    pub fn classify(&self, filename: &str) -> &str {
        let lowered = filename.to_lowercase();
        for rule in &self.rules {
            if rule
                .extensions
                .iter()
                .any(|ext| lowered.ends_with(ext.as_str()))
            {
                return &rule.name;
            }
        }
        &self.catch_all
    }

    pub fn catch_all(&self) -> &str {
        &self.catch_all
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// All destination folder names this table can produce, catch-all last.
    pub fn category_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.iter().map(|rule| rule.name.as_str()).collect();
        if !names.iter().any(|name| *name == self.catch_all) {
            names.push(&self.catch_all);
        }
        names
    }
}

fn normalize_rule(rule: CategoryRule) -> CategoryRule {
    let extensions = rule
        .extensions
        .into_iter()
        .map(|ext| {
            let lowered = ext.trim().to_lowercase();
            if lowered.starts_with('.') {
                lowered
            } else {
                format!(".{lowered}")
            }
        })
        .filter(|ext| ext.len() > 1)
        .collect();
    CategoryRule {
        name: rule.name,
        extensions,
    }
}
