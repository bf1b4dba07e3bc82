//! Error types for brokkr-projects

use thiserror::Error;

/// Result type alias using brokkr-projects's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Project creation error types
#[derive(Error, Debug)]
pub enum Error {
    /// Connection-level failure while talking to the archive source
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The archive source answered with a non-success status
    #[error("download of {url} failed with HTTP status {status}")]
    Download { status: u16, url: String },

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Subtree selection or write failure during extraction
    #[error("archive extraction failed: {reason}")]
    Extraction { reason: String },

    /// Template-supplied initialization failed
    #[error("initialization of template '{template}' failed: {source}")]
    TemplateInit {
        template: String,
        #[source]
        source: anyhow::Error,
    },

    /// An external process exited with a non-zero status
    #[error("command '{command}' exited with status {exit_code}: {stderr}")]
    Process {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// An external process could not be started at all
    #[error("failed to spawn '{command}': {source}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The registry file exists but cannot be parsed. A missing file
    /// is an empty registry; a malformed one is never silently reset.
    #[error("project registry at {path} is malformed: {source}")]
    Registry {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(reason: impl Into<String>) -> Self {
        Self::Extraction {
            reason: reason.into(),
        }
    }

    /// Create a template initialization error
    pub fn template_init(template: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::TemplateInit {
            template: template.into(),
            source: source.into(),
        }
    }
}
