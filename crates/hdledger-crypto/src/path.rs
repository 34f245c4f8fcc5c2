//! Derivation path parsing.
//!
//! Grammar: `root ("/" index)+` where `root` is `m` (private traversal) or
//! `M` (public-only traversal) and each `index` is an unsigned decimal `u32`.

use crate::error::{CryptoError, Result};
use std::fmt;
use std::str::FromStr;

/// Root marker of a derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathRoot {
    /// `m`: derive private children; the starting node must hold a private key.
    Private,
    /// `M`: derive public-only children regardless of the starting node.
    PublicOnly,
}

impl PathRoot {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathRoot::Private => "m",
            PathRoot::PublicOnly => "M",
        }
    }
}

/// A parsed derivation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    root: PathRoot,
    indices: Vec<u32>,
}

impl DerivationPath {
    /// Build a path from its parts. At least one index is required.
    pub fn new(root: PathRoot, indices: Vec<u32>) -> Result<Self> {
        if indices.is_empty() {
            return Err(CryptoError::InvalidPath(format!(
                "path '{}' has no indices",
                root.as_str()
            )));
        }
        Ok(Self { root, indices })
    }

    /// A one-index path such as `m/1`.
    pub fn single(root: PathRoot, index: u32) -> Self {
        Self {
            root,
            indices: vec![index],
        }
    }

    pub fn root(&self) -> PathRoot {
        self.root
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Extend the path by one index.
    pub fn child(&self, index: u32) -> Self {
        let mut indices = self.indices.clone();
        indices.push(index);
        Self {
            root: self.root,
            indices,
        }
    }
}

impl FromStr for DerivationPath {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        let mut segments = s.split('/');

        let root = match segments.next() {
            Some("m") => PathRoot::Private,
            Some("M") => PathRoot::PublicOnly,
            Some(other) => return Err(CryptoError::InvalidPathRoot(other.to_string())),
            None => return Err(CryptoError::InvalidPathRoot(String::new())),
        };

        let indices = segments.map(parse_index).collect::<Result<Vec<u32>>>()?;
        Self::new(root, indices)
    }
}

fn parse_index(segment: &str) -> Result<u32> {
    // u32::from_str would also accept a leading '+'
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CryptoError::InvalidPath(format!(
            "invalid index segment '{}'",
            segment
        )));
    }
    Ok(segment.parse::<u32>()?)
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root.as_str())?;
        for index in &self.indices {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}
