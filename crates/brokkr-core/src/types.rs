//! Shared project types

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project definition as supplied by the user and persisted in the
/// project registry after a successful creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDefinition {
    /// Project (and GitHub repository) name
    pub name: String,

    /// One-line description, used for the GitHub repository
    #[serde(default)]
    pub description: String,

    /// GitHub account the `origin` remote points at
    pub author: String,

    /// Whether the GitHub repository is created private
    #[serde(default)]
    pub private: bool,

    /// Template the project was scaffolded from
    pub template: TemplateReference,

    /// Explicit target path; when absent the project lands under the
    /// configured project directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Utf8PathBuf>,

    /// Set by the registry when the definition is recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProjectDefinition {
    /// Resolve the on-disk location of this project.
    ///
    /// An explicit `path` wins; otherwise the project lives at
    /// `<project_dir>/<name>`.
    pub fn resolved_path(&self, project_dir: &Utf8Path) -> Utf8PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| project_dir.join(&self.name))
    }

    /// URL of the `origin` remote derived from author and name
    pub fn origin_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.author, self.name)
    }
}

/// Reference to a template subtree inside the template archive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateReference {
    pub id: String,
}

impl TemplateReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Subtree path inside the archive, by convention `templates/<id>`
    pub fn subtree(&self) -> String {
        format!("templates/{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_def() -> ProjectDefinition {
        ProjectDefinition {
            name: "demo".to_string(),
            description: "A demo project".to_string(),
            author: "octocat".to_string(),
            private: false,
            template: TemplateReference::new("basic"),
            path: None,
            created_at: None,
        }
    }

    #[test]
    fn test_resolved_path_defaults_to_project_dir() {
        let def = demo_def();
        assert_eq!(
            def.resolved_path(Utf8Path::new("/home/user/Projects")),
            Utf8Path::new("/home/user/Projects/demo")
        );
    }

    #[test]
    fn test_resolved_path_prefers_explicit_path() {
        let mut def = demo_def();
        def.path = Some(Utf8PathBuf::from("/tmp/elsewhere"));
        assert_eq!(
            def.resolved_path(Utf8Path::new("/home/user/Projects")),
            Utf8Path::new("/tmp/elsewhere")
        );
    }

    #[test]
    fn test_origin_url() {
        assert_eq!(
            demo_def().origin_url(),
            "https://github.com/octocat/demo.git"
        );
    }

    #[test]
    fn test_template_subtree_convention() {
        assert_eq!(TemplateReference::new("basic").subtree(), "templates/basic");
    }
}
