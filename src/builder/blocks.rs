use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rocket_dyn_templates::tera::{Context, Tera};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CmsError, Result};

pub const SETTING_KINDS: &[&str] = &["text", "textarea", "url", "image", "color", "select", "checkbox", "number"];

/// One editable knob of a block (`[[settings]]` in `block.toml`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TemplateSetting {
    pub key: String,
    pub label: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub options: Vec<String>,
}

fn default_kind() -> String {
    "text".to_string()
}

/// Contents of `block.toml`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BlockMeta {
    /// Filled from the directory name when omitted.
    #[serde(default)]
    pub name: String,
    pub label: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: Vec<TemplateSetting>,
}

fn default_category() -> String {
    "content".to_string()
}

impl BlockMeta {
    /// Defaults overlaid with `supplied`. Keys the block does not declare
    /// are ignored; non-string values are stringified.
    pub fn merge_settings(&self, supplied: &Map<String, Value>) -> BTreeMap<String, String> {
        self.settings
            .iter()
            .map(|s| {
                let value = match supplied.get(&s.key) {
                    Some(Value::String(v)) => v.clone(),
                    Some(Value::Null) | None => s.default.clone(),
                    Some(other) => other.to_string(),
                };
                (s.key.clone(), value)
            })
            .collect()
    }
}

/// A block placed on a page.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BlockInstance {
    pub block: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// Block templates loaded from `<blocks_dir>/<name>/{block.toml,template.html}`.
pub struct BlockRegistry {
    tera: Tera,
    blocks: BTreeMap<String, BlockMeta>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        BlockRegistry::empty()
    }
}

impl BlockRegistry {
    pub fn empty() -> Self {
        BlockRegistry {
            tera: Tera::default(),
            blocks: BTreeMap::new(),
        }
    }

    /// Load every block directory under `dir`. Broken blocks are skipped
    /// with a warning so one bad template does not take the builder down.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut registry = BlockRegistry::empty();
        if !dir.is_dir() {
            log::warn!("Blocks directory {} not found, builder has no blocks", dir.display());
            return Ok(registry);
        }

        let mut dirs: Vec<_> = fs::read_dir(dir)?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        for path in dirs {
            let name = match path.file_name() {
                Some(n) => n.to_string_lossy().to_string(),
                None => continue,
            };
            match Self::read_block_dir(&path) {
                Ok((meta, template)) => {
                    if let Err(e) = registry.register(&name, meta, &template) {
                        log::warn!("Skipping block '{}': {}", name, e);
                    }
                }
                Err(e) => log::warn!("Skipping block '{}': {}", name, e),
            }
        }
        log::info!("Loaded {} builder blocks from {}", registry.blocks.len(), dir.display());
        Ok(registry)
    }

    fn read_block_dir(path: &Path) -> Result<(BlockMeta, String)> {
        let raw_meta = fs::read_to_string(path.join("block.toml"))?;
        let meta: BlockMeta = toml::from_str(&raw_meta)
            .map_err(|e| CmsError::Serialization(format!("block.toml: {}", e)))?;
        let template = fs::read_to_string(path.join("template.html"))?;
        Ok((meta, template))
    }

    /// Add a block. `name` wins over whatever `meta.name` says.
    pub fn register(&mut self, name: &str, mut meta: BlockMeta, template: &str) -> Result<()> {
        for s in &meta.settings {
            if !SETTING_KINDS.contains(&s.kind.as_str()) {
                return Err(CmsError::validation(format!(
                    "setting '{}' has unknown kind '{}'",
                    s.key, s.kind
                )));
            }
        }
        // The .html suffix keeps Tera's autoescaping on.
        self.tera
            .add_raw_template(&template_name(name), template)
            .map_err(|e| CmsError::validation(format!("template: {}", e)))?;
        meta.name = name.to_string();
        self.blocks.insert(name.to_string(), meta);
        Ok(())
    }

    pub fn list(&self) -> Vec<&BlockMeta> {
        self.blocks.values().collect()
    }

    /// Render one block wrapped in its editor `<section>`.
    pub fn render_block(&self, name: &str, supplied: &Map<String, Value>) -> Result<String> {
        let meta = self
            .blocks
            .get(name)
            .ok_or_else(|| CmsError::not_found(format!("Unknown block '{}'", name)))?;
        let settings = meta.merge_settings(supplied);

        let mut ctx = Context::new();
        for (k, v) in &settings {
            ctx.insert(k.as_str(), v);
        }
        ctx.insert("settings", &settings);
        let inner = self.tera.render(&template_name(name), &ctx).map_err(|e| {
            CmsError::Serialization(format!("rendering block '{}': {}", name, e))
        })?;

        let data = serde_json::to_string(&settings)?;
        Ok(format!(
            "<section class=\"liveed-block\" data-block=\"{}\" data-settings='{}'>\n{}\n</section>",
            escape_attr(name),
            escape_attr(&data),
            inner.trim()
        ))
    }

    /// Render blocks in order and join them into page content.
    pub fn compose(&self, blocks: &[BlockInstance]) -> Result<String> {
        let rendered = blocks
            .iter()
            .map(|b| self.render_block(&b.block, &b.settings))
            .collect::<Result<Vec<_>>>()?;
        Ok(rendered.join("\n"))
    }
}

fn template_name(block: &str) -> String {
    format!("{}.html", block)
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
