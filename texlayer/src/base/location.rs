//! Namespaced texture identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::BaseError;

/// Namespace assumed when a location string has none.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A `namespace:path` identifier for a texture or atlas.
///
/// Cheap to clone; the text is shared.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureLocation {
    full: Arc<str>,
    separator: usize,
}

impl TextureLocation {
    /// Create a location from its parts.
    ///
    /// Both parts must be non-empty and the namespace must not contain `:`.
    pub fn new(namespace: &str, path: &str) -> Result<Self, BaseError> {
        if namespace.is_empty() || path.is_empty() || namespace.contains(':') {
            return Err(BaseError::InvalidLocation(format!("{}:{}", namespace, path)));
        }
        Ok(Self {
            full: Arc::from(format!("{}:{}", namespace, path)),
            separator: namespace.len(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.full[..self.separator]
    }

    pub fn path(&self) -> &str {
        &self.full[self.separator + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl FromStr for TextureLocation {
    type Err = BaseError;

    /// Parse `namespace:path`, or a bare `path` in the default namespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, s),
        }
    }
}

impl fmt::Display for TextureLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl fmt::Debug for TextureLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextureLocation({})", self.full)
    }
}
