//! Property paths for addressing nested user and claim values.
//!
//! A path is a dot-separated list of components. Each component is a key,
//! optionally followed by one or more `[index]` suffixes addressing array
//! elements, e.g. `Account.FullName`, `Tags[0]` or `Orders[1].name`.
//!
//! Paths are parsed once into a sequence of [`Segment`]s and then applied to
//! a [`serde_json::Value`] tree with [`get_path`] and [`set_path`].
//!
//! ```rust
//! use outseta_auth::path::{PropertyPath, Segment};
//!
//! let path: PropertyPath = "Orders[1].name".parse()?;
//! assert_eq!(
//!     path.segments(),
//!     &[
//!         Segment::Key("Orders".to_string()),
//!         Segment::Index(1),
//!         Segment::Key("name".to_string()),
//!     ]
//! );
//! # Ok::<(), outseta_auth::path::PathError>(())
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::constants::MAX_PATH_INDEX;

mod value;

pub use value::{get_path, lookup, set_path};

/// Error type for path parsing failures.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Empty property path")]
    Empty,

    /// A component between two dots was empty, e.g. `Account..Name`.
    #[error("Empty component in property path '{path}'")]
    EmptyComponent { path: String },

    /// Brackets were unbalanced, misplaced or not followed by `.`/`[`.
    #[error("Malformed component '{component}' in property path '{path}'")]
    MalformedComponent { path: String, component: String },

    #[error("Invalid array index '{index}' in property path '{path}'")]
    InvalidIndex { path: String, index: String },

    #[error("Array index {index} in property path '{path}' exceeds the limit of {max}")]
    IndexTooLarge {
        path: String,
        index: usize,
        max: usize,
    },
}

impl PathError {
    /// Check if this error is about an array index rather than the path shape.
    pub fn is_index_error(&self) -> bool {
        matches!(
            self,
            PathError::InvalidIndex { .. } | PathError::IndexTooLarge { .. }
        )
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}

/// One step of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member access.
    Key(String),
    /// Array element access.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{key}"),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A parsed, validated property path.
///
/// Always holds at least one segment and always starts with a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<Segment>,
}

impl PropertyPath {
    /// Parses a path string.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        for component in input.split('.') {
            if component.is_empty() {
                return Err(PathError::EmptyComponent {
                    path: input.to_string(),
                });
            }
            parse_component(input, component, &mut segments)?;
        }

        Ok(Self {
            raw: input.to_string(),
            segments,
        })
    }

    /// Builds a single-key path without parsing; the key is taken verbatim.
    pub fn key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            raw: key.clone(),
            segments: vec![Segment::Key(key)],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The path as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of segments, counting each index separately.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn parse_component(
    path: &str,
    component: &str,
    segments: &mut Vec<Segment>,
) -> Result<(), PathError> {
    let malformed = || PathError::MalformedComponent {
        path: path.to_string(),
        component: component.to_string(),
    };

    let (key, mut rest) = match component.find('[') {
        Some(open) => component.split_at(open),
        None => (component, ""),
    };
    if key.is_empty() || key.contains(']') {
        return Err(malformed());
    }
    segments.push(Segment::Key(key.to_string()));

    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
        let close = inner.find(']').ok_or_else(malformed)?;
        let digits = &inner[..close];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PathError::InvalidIndex {
                path: path.to_string(),
                index: digits.to_string(),
            });
        }
        let index: usize = digits.parse().map_err(|_| PathError::IndexTooLarge {
            path: path.to_string(),
            index: usize::MAX,
            max: MAX_PATH_INDEX,
        })?;
        if index > MAX_PATH_INDEX {
            return Err(PathError::IndexTooLarge {
                path: path.to_string(),
                index,
                max: MAX_PATH_INDEX,
            });
        }
        segments.push(Segment::Index(index));
        rest = &inner[close + 1..];
    }

    Ok(())
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for PropertyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for PropertyPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PropertyPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}
