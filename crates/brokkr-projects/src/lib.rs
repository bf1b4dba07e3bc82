//! # brokkr-projects
//!
//! Project creation library for the brokkr CLI providing:
//! - Template archive fetching with live download progress
//! - Subtree extraction from zip archives
//! - Template-supplied initialization through a constrained capability
//!   bundle
//! - Publishing the created project as a GitHub repository
//! - The persistent project registry
//!
//! The pieces are assembled into a three-stage pipeline by
//! [`create::ProjectCreator`]: download + extract, initialize, publish.

pub mod archive;
pub mod create;
pub mod error;
pub mod fetch;
pub mod init;
pub mod process;
pub mod publish;
pub mod registry;

pub use archive::extract_subtree;
pub use create::ProjectCreator;
pub use error::{Error, Result};
pub use fetch::ArchiveFetcher;
pub use init::{Capabilities, ManifestInitializer, TemplateInitializer};
pub use process::{ProcessRunner, SystemRunner};
pub use publish::RepositoryPublisher;
pub use registry::ProjectRegistry;
