//! Project documents: a [`Setup`] saved as YAML or JSON.
//!
//! A document stores what a user typed, not resolved values: formula source
//! text, reference targets by name, and sequence steps as named pulses.
//! Loading replays those edits through the normal operations, so a
//! document that violates an invariant is rejected the same way an
//! interactive edit would be.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use qexplorer_model::{CollectionId, FieldKind, ModelError, Variables};

use crate::error::{SetupError, SetupResult};
use crate::kinds::{
    CROSS_TERMS, MODES, OUTPUTS, PULSES, SEQUENCE, SEQUENCES, SIMULATIONS, SWEEPS,
};
use crate::setup::{NoPrompt, Setup};

const COLLECTION_NAMES: [&str; 7] = [
    MODES,
    CROSS_TERMS,
    PULSES,
    SEQUENCES,
    SIMULATIONS,
    SWEEPS,
    OUTPUTS,
];

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

/// Serialized form of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub version: u32,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub collections: Vec<CollectionDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldEntry>,
    /// Pulse names, for sequences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
}

/// One field as raw editor text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub key: String,
    pub value: String,
}

/// On-disk encoding, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> SetupResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            _ => Err(SetupError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl ProjectDocument {
    pub fn encode(&self, format: DocumentFormat) -> SetupResult<String> {
        Ok(match format {
            DocumentFormat::Yaml => serde_yaml_ng::to_string(self)?,
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    pub fn decode(source: &str, format: DocumentFormat) -> SetupResult<Self> {
        Ok(match format {
            DocumentFormat::Yaml => serde_yaml_ng::from_str(source)?,
            DocumentFormat::Json => serde_json::from_str(source)?,
        })
    }
}

impl Setup {
    /// Capture the project as a document.
    pub fn to_document(&self) -> SetupResult<ProjectDocument> {
        let model = &self.model;
        let mut collections = Vec::new();
        for id in self.collections.all() {
            let collection = model.collection(id)?;
            let mut items = Vec::with_capacity(collection.len());
            for &item in collection.children() {
                let entity = model.entity(item)?;
                let is_sequence = entity.kind() == SEQUENCE;
                let mut fields = Vec::new();
                for field in entity.fields() {
                    if is_sequence && matches!(field.kind(), FieldKind::Reference(_)) {
                        continue;
                    }
                    fields.push(FieldEntry {
                        key: field.key().to_string(),
                        value: model.display_value(item, field.key())?,
                    });
                }
                let steps = if is_sequence {
                    self.steps(item)?
                        .into_iter()
                        .map(|p| model.name(p).map(str::to_string))
                        .collect::<Result<_, _>>()?
                } else {
                    Vec::new()
                };
                items.push(ItemDocument {
                    kind: entity.kind().to_string(),
                    name: entity.name().to_string(),
                    fields,
                    steps,
                });
            }
            collections.push(CollectionDocument {
                name: collection.name().to_string(),
                items,
            });
        }
        Ok(ProjectDocument {
            version: DOCUMENT_VERSION,
            variables: self.variables.clone(),
            collections,
        })
    }

    /// Rebuild a project by replaying a document.
    pub fn from_document(doc: &ProjectDocument) -> SetupResult<Self> {
        if doc.version != DOCUMENT_VERSION {
            return Err(SetupError::invalid(
                "project",
                "version",
                format!(
                    "unsupported document version {} (expected {DOCUMENT_VERSION})",
                    doc.version
                ),
            ));
        }
        if let Some(unknown) = doc
            .collections
            .iter()
            .find(|c| !COLLECTION_NAMES.contains(&c.name.as_str()))
        {
            return Err(SetupError::invalid(
                "project",
                "collections",
                format!("unknown collection '{}'", unknown.name),
            ));
        }

        let mut setup = Setup::new();
        setup.variables = doc.variables.clone();

        // Replay in the fixed collection order so references always resolve.
        for id in setup.collections.all() {
            let name = setup.model.collection(id)?.name().to_string();
            let Some(collection) = doc.collections.iter().find(|c| c.name == name) else {
                continue;
            };
            for item in &collection.items {
                setup.replay_item(id, &name, item)?;
            }
        }

        info!(items = setup.model.iter().count(), "project loaded");
        Ok(setup)
    }

    fn replay_item(
        &mut self,
        collection: CollectionId,
        collection_name: &str,
        item: &ItemDocument,
    ) -> SetupResult<()> {
        let id = if collection_name == CROSS_TERMS {
            self.add_cross_term()?
        } else {
            self.model.add_item(collection, Some(&item.kind))?
        };
        let resolved = self.model.rename(id, &item.name)?;
        if resolved != item.name {
            debug!(wanted = %item.name, got = %resolved, "duplicate item name in document");
        }
        for entry in &item.fields {
            self.set_field(id, &entry.key, &entry.value, &mut NoPrompt)?;
        }
        for step in &item.steps {
            let pulse = self
                .model
                .item_by_name(self.collections.pulses, step)
                .ok_or_else(|| ModelError::coercion("steps", step.as_str(), format!("no pulse named '{step}'")))?;
            self.add_step(id, Some(pulse))?;
        }
        Ok(())
    }

    /// Write the project to `path` (`.yaml`, `.yml` or `.json`).
    pub fn save(&self, path: impl AsRef<Path>) -> SetupResult<()> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        fs::write(path, self.to_document()?.encode(format)?)?;
        info!(path = %path.display(), "project saved");
        Ok(())
    }

    /// Read a project from `path`.
    pub fn load(path: impl AsRef<Path>) -> SetupResult<Self> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        let source = fs::read_to_string(path)?;
        Self::from_document(&ProjectDocument::decode(&source, format)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.yaml")).unwrap(), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.YML")).unwrap(), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")).unwrap(), DocumentFormat::Json);
        assert!(matches!(
            DocumentFormat::from_path(Path::new("a.toml")),
            Err(SetupError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_duplicate_names_are_resolved() {
        let doc = ProjectDocument {
            version: DOCUMENT_VERSION,
            variables: Variables::new(),
            collections: vec![CollectionDocument {
                name: "Modes".into(),
                items: vec![
                    ItemDocument {
                        kind: "Mode".into(),
                        name: "Cavity".into(),
                        fields: vec![],
                        steps: vec![],
                    },
                    ItemDocument {
                        kind: "Mode".into(),
                        name: "Cavity".into(),
                        fields: vec![],
                        steps: vec![],
                    },
                ],
            }],
        };
        let setup = Setup::from_document(&doc).unwrap();
        let modes = setup.model().items(setup.collections().modes).unwrap();
        assert_eq!(setup.model().names(modes), vec!["Cavity", "Cavity_1"]);
    }

    #[test]
    fn test_unknown_version_rejects_document() {
        let doc = ProjectDocument::decode("version: 7\ncollections: []\n", DocumentFormat::Yaml).unwrap();
        let err = Setup::from_document(&doc).unwrap_err();
        assert!(matches!(
            err,
            SetupError::InvalidParameter { ref key, .. } if key == "version"
        ));
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'version' on 'project': unsupported document version 7 (expected 1)"
        );

        let current = ProjectDocument { version: DOCUMENT_VERSION, ..doc };
        assert!(Setup::from_document(&current).is_ok());
    }

    #[test]
    fn test_unknown_variable_rejects_document() {
        let doc = ProjectDocument {
            version: DOCUMENT_VERSION,
            variables: Variables::new(),
            collections: vec![CollectionDocument {
                name: "Modes".into(),
                items: vec![ItemDocument {
                    kind: "Mode".into(),
                    name: "Mode".into(),
                    fields: vec![FieldEntry {
                        key: "frequency".into(),
                        value: "omega".into(),
                    }],
                    steps: vec![],
                }],
            }],
        };
        assert!(matches!(
            Setup::from_document(&doc),
            Err(SetupError::Model(ModelError::UnknownVariable(_)))
        ));
    }
}
