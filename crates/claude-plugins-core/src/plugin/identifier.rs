//! Plugin identifier parsing
//!
//! Supported formats:
//! - `plugin-name` (registry lookup)
//! - `plugin-name@1.0.0` (registry with version)
//! - `./local/path`, `../local/path`, `/absolute/path` (local directory)
//! - `github:owner/repo`, `github:owner/repo#ref` (GitHub repository)
//! - `owner/repo`, `owner/repo#ref` (GitHub shorthand)

const GITHUB_PREFIX: &str = "github:";

/// Where a plugin identifier points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSource {
    /// Local directory, path kept as given
    Local { path: String },
    /// GitHub repository
    GitHub {
        repo: String,
        git_ref: Option<String>,
        id: String,
    },
    /// Remote registry entry
    Registry { id: String, version: Option<String> },
}

impl ParsedSource {
    /// Plugin id derived from the identifier (`None` for local paths)
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Local { .. } => None,
            Self::GitHub { id, .. } | Self::Registry { id, .. } => Some(id),
        }
    }

    /// Short description for progress output
    pub fn describe(&self) -> String {
        match self {
            Self::Local { path } => format!("local path {}", path),
            Self::GitHub { repo, git_ref, .. } => match git_ref {
                Some(r) => format!("GitHub {}#{}", repo, r),
                None => format!("GitHub {}", repo),
            },
            Self::Registry { id, version } => match version {
                Some(v) => format!("registry {}@{}", id, v),
                None => format!("registry {}", id),
            },
        }
    }
}

/// Classify a plugin identifier. Never fails.
pub fn parse(identifier: &str) -> ParsedSource {
    if identifier.starts_with("./") || identifier.starts_with("../") || identifier.starts_with('/')
    {
        return ParsedSource::Local {
            path: identifier.to_string(),
        };
    }

    if let Some(spec) = identifier.strip_prefix(GITHUB_PREFIX) {
        return github(spec);
    }

    // owner/repo shorthand must be checked before name@version
    if identifier.contains('/') && !identifier.contains('@') {
        return github(identifier);
    }

    if let Some((id, version)) = identifier.split_once('@') {
        return ParsedSource::Registry {
            id: id.to_string(),
            version: Some(version.to_string()),
        };
    }

    ParsedSource::Registry {
        id: identifier.to_string(),
        version: None,
    }
}

fn github(spec: &str) -> ParsedSource {
    let (repo, git_ref) = match spec.split_once('#') {
        Some((repo, r)) => (repo, Some(r).filter(|r| !r.is_empty())),
        None => (spec, None),
    };

    ParsedSource::GitHub {
        repo: repo.to_string(),
        git_ref: git_ref.map(str::to_string),
        id: repo_id(repo),
    }
}

/// Plugin id for a repository: only the first `/` becomes `-`
pub fn repo_id(repo: &str) -> String {
    repo.replacen('/', "-", 1)
}
