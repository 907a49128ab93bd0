//! Build metadata passed explicitly through the pipeline.

use std::fmt;

/// Version and build information for the running indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Binary name.
    pub name: String,
    /// Semantic version.
    pub version: String,
    /// VCS commit the binary was built from, if known.
    pub commit_id: Option<String>,
    /// Build environment (`prod` or `dev`).
    pub environment: String,
}

impl BuildInfo {
    /// Environment name for release builds.
    pub const ENV_PRODUCTION: &'static str = "prod";
    /// Environment name for development builds.
    pub const ENV_DEVELOPMENT: &'static str = "dev";

    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            commit_id: None,
            environment: Self::ENV_DEVELOPMENT.to_string(),
        }
    }

    pub fn with_commit_id(mut self, commit_id: impl Into<String>) -> Self {
        self.commit_id = Some(commit_id.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Whether this is a development build.
    pub fn is_dev(&self) -> bool {
        self.environment == Self::ENV_DEVELOPMENT
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "CommitID: {}", self.commit_id.as_deref().unwrap_or("unknown"))?;
        writeln!(f, "Version: {}", self.version)?;
        write!(f, "Env: {}", self.environment)
    }
}
