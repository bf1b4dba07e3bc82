//! Persistent registry of created projects
//!
//! A flat YAML file listing every project brokkr created. A missing
//! file is an empty registry; a malformed file is a hard error so a
//! typo while hand-editing never silently wipes the list.

use crate::error::{Error, Result};
use brokkr_core::types::ProjectDefinition;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use std::fs;
use tracing::debug;

/// The project registry, loaded eagerly and written back on change
#[derive(Debug)]
pub struct ProjectRegistry {
    path: Utf8PathBuf,
    definitions: Vec<ProjectDefinition>,
}

impl ProjectRegistry {
    /// Open the registry at `path`, treating an absent file as empty.
    ///
    /// # Errors
    /// `Error::Registry` when the file exists but does not parse.
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let definitions = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_yaml_ng::from_str(&content).map_err(|source| Error::Registry {
                    path: path.to_string(),
                    source,
                })?
            }
        } else {
            debug!("no registry at {}, starting empty", path);
            Vec::new()
        };

        Ok(Self {
            path: path.to_owned(),
            definitions,
        })
    }

    /// All recorded projects, in insertion order
    pub fn projects(&self) -> &[ProjectDefinition] {
        &self.definitions
    }

    /// Look up a project by name
    pub fn get(&self, name: &str) -> Option<&ProjectDefinition> {
        self.definitions.iter().find(|def| def.name == name)
    }

    /// Record a project and persist the registry. The creation
    /// timestamp is stamped here.
    pub fn add(&mut self, mut def: ProjectDefinition) -> Result<()> {
        def.created_at = Some(Utc::now());
        self.definitions.push(def);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml_ng::to_string(&self.definitions)?;
        fs::write(&self.path, content)?;
        debug!(
            "saved {} project(s) to {}",
            self.definitions.len(),
            self.path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokkr_core::types::TemplateReference;
    use tempfile::TempDir;

    fn registry_path(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().join("projects.yaml")).unwrap()
    }

    fn demo_def(name: &str) -> ProjectDefinition {
        ProjectDefinition {
            name: name.to_string(),
            description: "A demo project".to_string(),
            author: "octocat".to_string(),
            private: false,
            template: TemplateReference::new("basic"),
            path: Some(Utf8PathBuf::from("/tmp/demo")),
            created_at: None,
        }
    }

    #[test]
    fn test_missing_file_is_an_empty_registry() {
        let temp = TempDir::new().unwrap();
        let registry = ProjectRegistry::open(&registry_path(&temp)).unwrap();
        assert!(registry.projects().is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = registry_path(&temp);
        fs::write(&path, "- name: demo\n  oops [").unwrap();

        let err = ProjectRegistry::open(&path).unwrap_err();
        assert!(matches!(err, Error::Registry { .. }));
    }

    #[test]
    fn test_add_persists_and_reloads() {
        let temp = TempDir::new().unwrap();
        let path = registry_path(&temp);

        let mut registry = ProjectRegistry::open(&path).unwrap();
        registry.add(demo_def("demo")).unwrap();
        registry.add(demo_def("second")).unwrap();

        let reopened = ProjectRegistry::open(&path).unwrap();
        assert_eq!(reopened.projects().len(), 2);

        let demo = reopened.get("demo").unwrap();
        assert_eq!(demo.author, "octocat");
        assert!(demo.created_at.is_some());
        assert!(reopened.get("absent").is_none());
    }
}
