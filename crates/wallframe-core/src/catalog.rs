// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read access to template records.
//
// Template storage and CRUD live outside Wallframe; the render and batch
// layers only need lookups, expressed as the `TemplateCatalog` trait.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, instrument};

use crate::error::{Result, WallframeError};
use crate::types::Template;

/// Lookup interface to the template catalog.
pub trait TemplateCatalog: Send + Sync {
    /// Fetch a template by id, or `None` if the catalog has no such record.
    fn template(&self, id: &str) -> Option<Template>;

    /// All templates, in catalog order.
    fn templates(&self) -> Vec<Template>;

    /// Fetch a template or fail with `UnknownTemplate`.
    fn require(&self, id: &str) -> Result<Template> {
        self.template(id)
            .ok_or_else(|| WallframeError::UnknownTemplate(id.to_string()))
    }
}

/// A catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    order: Vec<String>,
    templates: HashMap<String, Template>,
}

impl InMemoryCatalog {
    pub fn new(templates: impl IntoIterator<Item = Template>) -> Self {
        let mut catalog = Self::default();
        for template in templates {
            catalog.insert(template);
        }
        catalog
    }

    /// Load a JSON array of template records. Relative `imagePath`s are
    /// resolved against the file's directory.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let mut templates: Vec<Template> = serde_json::from_str(&data)?;
        if let Some(base) = path.parent() {
            for template in &mut templates {
                if template.image_path.is_relative() {
                    template.image_path = base.join(&template.image_path);
                }
            }
        }
        info!(count = templates.len(), "template catalog loaded");
        Ok(Self::new(templates))
    }

    /// Insert or replace a template.
    pub fn insert(&mut self, template: Template) {
        if !self.templates.contains_key(&template.id) {
            self.order.push(template.id.clone());
        }
        self.templates.insert(template.id.clone(), template);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl TemplateCatalog for InMemoryCatalog {
    fn template(&self, id: &str) -> Option<Template> {
        self.templates.get(id).cloned()
    }

    fn templates(&self) -> Vec<Template> {
        self.order
            .iter()
            .filter_map(|id| self.templates.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Corners, ImageDimensions, PlacementZone};
    use std::path::PathBuf;

    fn template(id: &str) -> Template {
        Template {
            id: id.into(),
            name: format!("Room {id}"),
            category: "test".into(),
            image_path: PathBuf::from(format!("{id}.png")),
            dimensions: ImageDimensions {
                width: 100,
                height: 100,
            },
            placement_zones: vec![PlacementZone::new(Corners::from_rect(
                10.0, 10.0, 50.0, 40.0,
            ))],
            safe_zone: None,
            print_sizes: vec![],
        }
    }

    #[test]
    fn insert_preserves_order_and_replaces() {
        let mut catalog = InMemoryCatalog::new([template("b"), template("a")]);
        let mut replacement = template("b");
        replacement.name = "Renamed".into();
        catalog.insert(replacement);

        let ids: Vec<_> = catalog.templates().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(catalog.require("b").expect("b").name, "Renamed");
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn require_unknown_template() {
        let catalog = InMemoryCatalog::default();
        assert!(matches!(
            catalog.require("ghost"),
            Err(WallframeError::UnknownTemplate(id)) if id == "ghost"
        ));
    }

    #[test]
    fn load_json_resolves_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("templates.json");
        let json = serde_json::to_string(&vec![template("loft")]).expect("serialize");
        std::fs::write(&path, json).expect("write");

        let catalog = InMemoryCatalog::load_json(&path).expect("load");
        let loft = catalog.require("loft").expect("loft");
        assert_eq!(loft.image_path, dir.path().join("loft.png"));
    }
}
