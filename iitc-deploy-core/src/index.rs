//! Index page model: one page per build variant plus a landing page.
//!
//! Pages are built from a finished [`PathTree`] and rendered with
//! [`crate::html`]. Building can fail when a variant lacks its `plugins`
//! directory or when a userscript has no metadata companion; rendering never
//! fails and touches neither the filesystem nor the network.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::html::{self, HtmlLine};
use crate::tree::{NodeId, PathTree};

pub const DEFAULT_SITE_TITLE: &str = "IITC Dev Build";
pub const PLUGINS_DIR: &str = "plugins";
pub const ROOT_SCRIPT_FILE_ID: &str = "total-conversion-build";
pub const ROOT_SCRIPT_META_ID: &str = "ingress-intel-total-conversion@jonatkins";
pub const ROOT_SCRIPT_TITLE: &str = "IITC Main Script";
pub const MOBILE_ARCHIVE: &str = "mobile.zip";
pub const MAIN_INDEX_FILENAME: &str = "index.html";

const SECTION_HEADING: &str = r#"<h3 class="ui-bar ui-bar-a ui-corner-all">"#;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("{variant} has no `plugins` directory")]
    MissingPlugins { variant: String },
    #[error("script {script_id} in {dir} has no metadata file")]
    MissingMeta { dir: String, script_id: String },
}

#[derive(Debug, Clone)]
pub enum IndexDocument {
    Main(MainIndex),
    Directory(DirectoryIndex),
}

impl IndexDocument {
    pub fn title(&self) -> &str {
        match self {
            IndexDocument::Main(main) => &main.title,
            IndexDocument::Directory(dir) => &dir.title,
        }
    }

    pub fn filename(&self) -> String {
        match self {
            IndexDocument::Main(_) => MAIN_INDEX_FILENAME.to_string(),
            IndexDocument::Directory(dir) => dir.filename(),
        }
    }

    pub fn lines(&self) -> Vec<HtmlLine> {
        let (back_button, content) = match self {
            IndexDocument::Main(main) => (false, main.content(2)),
            IndexDocument::Directory(dir) => (true, dir.content(2)),
        };
        let header = vec![HtmlLine::new(format!("<h1>{}</h1>", self.title()), 2)];
        html::document_lines(self.title(), back_button, header, content)
    }

    pub fn render(&self) -> String {
        html::render_lines(&self.lines())
    }
}

/// Build one [`DirectoryIndex`] per top-level directory, in tree order, then
/// the [`MainIndex`] linking them.
pub fn build_index_documents(
    tree: &PathTree,
    site_title: &str,
) -> Result<Vec<IndexDocument>, IndexError> {
    let mut directories = Vec::new();
    for &id in tree.top_level() {
        if !tree.node(id).is_dir() {
            debug!(path = %tree.node(id).full_path, "Skipping top-level file");
            continue;
        }
        directories.push(DirectoryIndex::build(tree, id)?);
    }

    let main = MainIndex::new(site_title, &directories);
    info!(pages = directories.len() + 1, "Built index documents");

    let mut documents: Vec<IndexDocument> =
        directories.into_iter().map(IndexDocument::Directory).collect();
    documents.push(IndexDocument::Main(main));
    Ok(documents)
}

#[derive(Debug, Clone)]
pub struct MainIndex {
    pub title: String,
    /// (filename, title) per directory index.
    pub links: Vec<(String, String)>,
}

impl MainIndex {
    pub fn new(title: &str, directories: &[DirectoryIndex]) -> Self {
        Self {
            title: title.to_string(),
            links: directories
                .iter()
                .map(|dir| (dir.filename(), dir.title.clone()))
                .collect(),
        }
    }

    fn content(&self, indent: usize) -> Vec<HtmlLine> {
        let mut lines = vec![HtmlLine::new(r#"<ul data-role="listview">"#, indent)];
        for (filename, title) in &self.links {
            lines.push(HtmlLine::new(
                format!(r#"<li><a href="{filename}">{title}</a></li>"#),
                indent + 1,
            ));
        }
        lines.push(HtmlLine::new("</ul>", indent));
        lines
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryIndex {
    pub title: String,
    pub segment: String,
    pub main_script: Option<ScriptLink>,
    pub categories: BTreeMap<String, CategorySection>,
}

impl DirectoryIndex {
    pub fn build(tree: &PathTree, dir: NodeId) -> Result<Self, IndexError> {
        let node = tree.node(dir);
        let mut index = DirectoryIndex {
            title: variant_title(&node.segment),
            segment: node.segment.clone(),
            main_script: None,
            categories: BTreeMap::new(),
        };

        if has_script(tree, dir, ROOT_SCRIPT_FILE_ID) {
            index.main_script = Some(ScriptLink::build(tree, dir, ROOT_SCRIPT_FILE_ID)?);
        } else {
            debug!(variant = %node.segment, "No main script in variant");
        }

        let plugins = tree
            .child(dir, PLUGINS_DIR)
            .filter(|id| tree.node(*id).is_dir())
            .ok_or_else(|| IndexError::MissingPlugins {
                variant: node.full_path.clone(),
            })?;
        let registry = tree
            .node(plugins)
            .registry()
            .ok_or_else(|| IndexError::MissingPlugins {
                variant: node.full_path.clone(),
            })?;

        for script_id in registry.scripts_by_id.keys() {
            let link = ScriptLink::build(tree, plugins, script_id)?;
            if link.is_root() && index.main_script.is_none() {
                index.main_script = Some(link);
                continue;
            }
            index
                .categories
                .entry(link.category.clone())
                .or_insert_with(|| CategorySection::new(&link.category))
                .plugins
                .insert(script_id.clone(), link);
        }

        for script_id in registry.meta_by_id.keys() {
            if !registry.scripts_by_id.contains_key(script_id) {
                warn!(
                    dir = %tree.node(plugins).full_path,
                    script_id = %script_id,
                    "Metadata file without a userscript, not listed"
                );
            }
        }

        debug!(
            variant = %index.segment,
            categories = index.categories.len(),
            "Built directory index"
        );
        Ok(index)
    }

    pub fn filename(&self) -> String {
        format!("{}.html", self.segment)
    }

    fn content(&self, indent: usize) -> Vec<HtmlLine> {
        let mut lines = Vec::new();
        if self.title.to_lowercase() == "mobile" {
            lines.extend([
                HtmlLine::new(format!("{SECTION_HEADING}Mobile Zip File</h3>"), indent),
                HtmlLine::new(r#"<div class="ui-body">"#, indent),
                HtmlLine::new(
                    format!(
                        r#"<a href="{}/{MOBILE_ARCHIVE}" data-ajax="false">{MOBILE_ARCHIVE}</a>"#,
                        self.segment
                    ),
                    indent + 1,
                ),
                HtmlLine::new("</div>", indent),
            ]);
        }
        if let Some(main) = &self.main_script {
            lines.extend(section(ROOT_SCRIPT_TITLE, indent, [main]));
        }
        for category in self.categories.values() {
            lines.extend(category.content(indent));
        }
        lines
    }
}

fn has_script(tree: &PathTree, dir: NodeId, script_id: &str) -> bool {
    tree.node(dir)
        .registry()
        .is_some_and(|r| r.scripts_by_id.contains_key(script_id))
}

/// Plugins sharing one metadata category.
#[derive(Debug, Clone)]
pub struct CategorySection {
    pub name: String,
    pub plugins: BTreeMap<String, ScriptLink>,
}

impl CategorySection {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            plugins: BTreeMap::new(),
        }
    }

    /// Deleted plugins stay grouped but are not shown.
    pub fn is_hidden(&self) -> bool {
        self.name.eq_ignore_ascii_case("deleted")
    }

    fn content(&self, indent: usize) -> Vec<HtmlLine> {
        if self.is_hidden() {
            return vec![HtmlLine::new("", 0)];
        }
        section(&self.name, indent, self.plugins.values())
    }
}

fn section<'a>(
    heading: &str,
    indent: usize,
    links: impl IntoIterator<Item = &'a ScriptLink>,
) -> Vec<HtmlLine> {
    let mut lines = vec![
        HtmlLine::new(format!("{SECTION_HEADING}{heading}</h3>"), indent),
        HtmlLine::new(r#"<div class="ui-body">"#, indent),
        HtmlLine::new("<ul>", indent + 1),
    ];
    lines.extend(links.into_iter().map(|link| link.line(indent + 2)));
    lines.push(HtmlLine::new("</ul>", indent + 1));
    lines.push(HtmlLine::new("</div>", indent));
    lines
}

/// A userscript joined with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLink {
    pub script_id: String,
    pub meta_id: Option<String>,
    pub title: String,
    pub category: String,
    pub url: String,
}

impl ScriptLink {
    /// Pair the script registered under `script_id` in `dir` with its metadata.
    pub fn build(tree: &PathTree, dir: NodeId, script_id: &str) -> Result<Self, IndexError> {
        let missing = || IndexError::MissingMeta {
            dir: tree.node(dir).full_path.clone(),
            script_id: script_id.to_string(),
        };
        let registry = tree.node(dir).registry().ok_or_else(missing)?;
        let script = *registry.scripts_by_id.get(script_id).ok_or_else(missing)?;
        let meta_node = tree.meta_for(script).ok_or_else(missing)?;
        let meta = tree.node(meta_node).meta().ok_or_else(missing)?;

        let url = tree.node(script).full_path.trim_start_matches('/').to_string();
        Ok(Self {
            script_id: script_id.to_string(),
            meta_id: meta.id.clone(),
            title: meta.display_name(script_id).to_string(),
            category: meta.category.clone(),
            url,
        })
    }

    pub fn is_root(&self) -> bool {
        self.meta_id.as_deref() == Some(ROOT_SCRIPT_META_ID)
    }

    fn line(&self, indent: usize) -> HtmlLine {
        HtmlLine::new(
            format!(
                r#"<li><a href="{}" data-ajax="false">{}</a></li>"#,
                self.url, self.title
            ),
            indent,
        )
    }
}

/// Capitalise each word of a variant directory name; `local` is the desktop build.
pub fn variant_title(segment: &str) -> String {
    let mut title = String::with_capacity(segment.len());
    let mut prev_is_letter = false;
    for c in segment.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            title.push(c);
            prev_is_letter = false;
        }
    }
    if title == "Local" {
        return "Desktop".to_string();
    }
    title
}
