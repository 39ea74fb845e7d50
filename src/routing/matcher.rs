//! Path matching logic.
//!
//! # Responsibilities
//! - Match an exact upload path
//! - Match a parameterized path template (`/datasets/{id}/documents`)
//! - Match a path prefix on segment boundaries
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - One trailing slash is tolerated on exact and template matches
//! - Template parameters match exactly one non-empty segment
//! - No regex to guarantee O(n) matching

/// Trait for matching request paths against conditions.
pub trait PathMatcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Matches one fixed path.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: trim_trailing_slash(&path).to_string(),
        }
    }
}

impl PathMatcher for ExactPathMatcher {
    fn matches(&self, path: &str) -> bool {
        trim_trailing_slash(path) == self.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// Matches a path template whose `{name}` segments accept any single segment.
#[derive(Debug, Clone)]
pub struct TemplatePathMatcher {
    segments: Vec<Segment>,
}

impl TemplatePathMatcher {
    pub fn new(template: &str) -> Self {
        let segments = trim_trailing_slash(template)
            .split('/')
            .skip(1)
            .map(|s| {
                if s.starts_with('{') && s.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { segments }
    }
}

impl PathMatcher for TemplatePathMatcher {
    fn matches(&self, path: &str) -> bool {
        let Some(rest) = trim_trailing_slash(path).strip_prefix('/') else {
            return false;
        };
        let mut parts = rest.split('/');

        for segment in &self.segments {
            match (segment, parts.next()) {
                (Segment::Literal(expected), Some(actual)) if expected == actual => {}
                (Segment::Param, Some(actual)) if !actual.is_empty() => {}
                _ => return false,
            }
        }
        parts.next().is_none()
    }
}

/// Matches a path prefix on a segment boundary (`/dl` matches `/dl` and
/// `/dl/x`, never `/dlx`).
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: trim_trailing_slash(&prefix).to_string(),
        }
    }
}

impl PathMatcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
            None => false,
        }
    }
}

/// Build the matcher for an upload path setting.
pub fn compile_upload_path(pattern: &str) -> Box<dyn PathMatcher> {
    if pattern.contains('{') {
        Box::new(TemplatePathMatcher::new(pattern))
    } else {
        Box::new(ExactPathMatcher::new(pattern))
    }
}
