//! Userscript metadata directives (`// @id`, `// @name`, `// @category`).

use regex::Regex;
use std::sync::LazyLock;

/// Category assigned when a metadata file carries no `@category` directive.
pub const DEFAULT_CATEGORY: &str = "None";

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[/\s]*(@[A-Za-z]+)(?:\s+(.*))?$").expect("directive pattern is valid")
});

/// Attributes recognised in a `.meta.js` companion file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMeta {
    pub id: Option<String>,
    pub name: Option<String>,
    pub category: String,
}

impl Default for ScriptMeta {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl ScriptMeta {
    /// Parse the directive lines of a metadata file. Unknown directives and
    /// non-directive lines are skipped; a repeated directive keeps the last value.
    pub fn parse(text: &str) -> Self {
        let mut meta = ScriptMeta::default();
        for line in text.lines() {
            let Some(caps) = DIRECTIVE.captures(line.trim()) else {
                continue;
            };
            let value = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            match &caps[1] {
                "@id" => meta.id = Some(value),
                "@name" => meta.name = Some(value),
                "@category" => meta.category = value,
                _ => {}
            }
        }
        meta
    }

    /// Name shown in index pages; falls back to the script id.
    pub fn display_name<'a>(&'a self, script_id: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(script_id)
    }
}
