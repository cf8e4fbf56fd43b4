//! Value-tree paths and tree manipulation
//!
//! Chart values are held as `serde_yaml::Value`: a closed tagged union of
//! mappings, sequences, and scalars whose mapping type preserves insertion
//! order. A [`ValuePath`] addresses one location in such a tree as an
//! ordered run of map keys and sequence indices.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::{Mapping, Value};

use crate::error::{CoreError, Result};

/// One step in a [`ValuePath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Mapping key
    Key(String),
    /// Sequence index
    Index(usize),
}

/// An ordered key/index sequence addressing a node in a value tree
///
/// Displays in the dotted form charts use in documentation:
/// `controller.initContainers[0].image`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ValuePath(Vec<PathSegment>);

impl ValuePath {
    /// Empty path (tree root)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path string (e.g. `a.b[0].c`)
    pub fn parse(path: &str) -> Result<Self> {
        let mut segments = Vec::new();

        for part in path.split('.') {
            if part.is_empty() {
                return Err(CoreError::InvalidPath {
                    path: path.to_string(),
                    message: "empty path segment".to_string(),
                });
            }

            let (key, indices) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };

            if key.is_empty() {
                return Err(CoreError::InvalidPath {
                    path: path.to_string(),
                    message: format!("segment '{part}' has no key before index"),
                });
            }
            segments.push(PathSegment::Key(key.to_string()));

            let mut rest = indices;
            while !rest.is_empty() {
                let Some(stripped) = rest.strip_prefix('[') else {
                    return Err(CoreError::InvalidPath {
                        path: path.to_string(),
                        message: format!("malformed index in segment '{part}'"),
                    });
                };
                let Some(end) = stripped.find(']') else {
                    return Err(CoreError::InvalidPath {
                        path: path.to_string(),
                        message: format!("unclosed index in segment '{part}'"),
                    });
                };
                let idx: usize =
                    stripped[..end]
                        .parse()
                        .map_err(|_| CoreError::InvalidPath {
                            path: path.to_string(),
                            message: format!("non-numeric index in segment '{part}'"),
                        })?;
                segments.push(PathSegment::Index(idx));
                rest = &stripped[end + 1..];
            }
        }

        Ok(Self(segments))
    }

    /// Append a mapping key
    pub fn push_key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    /// Append a sequence index
    pub fn push_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Last mapping key on the path, if any
    pub fn last_key(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|seg| match seg {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Index(_) => None,
        })
    }
}

impl From<Vec<PathSegment>> for ValuePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(k) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{k}")?;
                }
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

// Paths serialize in their dotted display form
impl Serialize for ValuePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ValuePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Read the node at `path`, if present
pub fn get_at<'a>(root: &'a Value, path: &ValuePath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = match segment {
            PathSegment::Key(k) => current.as_mapping()?.get(k.as_str())?,
            PathSegment::Index(idx) => current.as_sequence()?.get(*idx)?,
        };
    }
    Some(current)
}

/// Write `new_value` at `path`, creating intermediate containers
///
/// Missing mappings are created along the way; missing sequence slots are
/// padded with nulls. If both the existing node and `new_value` are
/// mappings they are deep-merged instead of replaced. Traversing through
/// an existing scalar is a [`CoreError::PathConflict`].
pub fn set_at(root: &mut Value, path: &ValuePath, new_value: Value) -> Result<()> {
    if path.is_empty() {
        if root.is_mapping() && new_value.is_mapping() {
            deep_merge(root, &new_value);
        } else {
            *root = new_value;
        }
        return Ok(());
    }

    set_at_segments(root, path.segments(), new_value).map_err(|message| {
        CoreError::PathConflict {
            path: path.to_string(),
            message,
        }
    })
}

fn set_at_segments(
    current: &mut Value,
    segments: &[PathSegment],
    new_value: Value,
) -> std::result::Result<(), String> {
    let (segment, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            if current.is_mapping() && new_value.is_mapping() {
                deep_merge(current, &new_value);
            } else {
                *current = new_value;
            }
            return Ok(());
        }
    };

    match segment {
        PathSegment::Key(key) => {
            if current.is_null() {
                *current = Value::Mapping(Mapping::new());
            }
            let Some(map) = current.as_mapping_mut() else {
                return Err(format!("'{key}' would descend into a non-mapping node"));
            };
            if !map.contains_key(key.as_str()) {
                map.insert(Value::from(key.as_str()), Value::Null);
            }
            // Key was just ensured above
            let slot = map
                .get_mut(key.as_str())
                .ok_or_else(|| format!("failed to access key '{key}'"))?;
            set_at_segments(slot, rest, new_value)
        }
        PathSegment::Index(idx) => {
            if current.is_null() {
                *current = Value::Sequence(Vec::new());
            }
            let Some(seq) = current.as_sequence_mut() else {
                return Err(format!("index [{idx}] would descend into a non-sequence node"));
            };
            while seq.len() <= *idx {
                seq.push(Value::Null);
            }
            set_at_segments(&mut seq[*idx], rest, new_value)
        }
    }
}

/// Deep merge `overlay` into `base`
///
/// Rules (same as chart values layering):
/// - Mappings: recursive merge
/// - Sequences: overlay replaces base (not appended)
/// - Scalars: overlay replaces base
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}
