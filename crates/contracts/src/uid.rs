//! Uid - opaque delivery identifier
//!
//! Every successful broadcast yields a `Uid`. Fan-out dispatch wraps the
//! per-backend identifiers in [`Uid::Multi`].

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt;

/// Identifier returned by a broadcaster on success.
///
/// # Examples
/// ```
/// use contracts::Uid;
///
/// let id = Uid::multi(vec![Uid::from("42"), Uid::from(7_i64)]);
/// assert_eq!(id.to_string(), "42 7");
/// assert_eq!(id.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Uid {
    /// No-op delivery, nothing to point at.
    #[default]
    Null,
    /// Backend-assigned string key (e.g. a post id).
    String(String),
    /// Backend-assigned integer key (e.g. a timestamp).
    Int64(i64),
    /// Aggregate of child identifiers, kept in completion order.
    Multi(Vec<Uid>),
}

impl Uid {
    /// Wrap child identifiers into an aggregate.
    pub fn multi(children: Vec<Uid>) -> Self {
        Self::Multi(children)
    }

    /// True for [`Uid::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Child identifiers of an aggregate; empty for leaf values.
    pub fn children(&self) -> &[Uid] {
        match self {
            Self::Multi(children) => children,
            _ => &[],
        }
    }

    /// Number of leaf deliveries this identifier stands for.
    ///
    /// Leaves count as one (including `Null`), aggregates count their direct children.
    pub fn len(&self) -> usize {
        match self {
            Self::Multi(children) => children.len(),
            _ => 1,
        }
    }

    /// True for an aggregate with no children.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Multi(children) if children.is_empty())
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Uid {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::String(s) => f.write_str(s),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Multi(children) => {
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

// Serialized as the natural JSON value: null / string / number / array
impl Serialize for Uid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::String(s) => serializer.serialize_str(s),
            Self::Int64(v) => serializer.serialize_i64(*v),
            Self::Multi(children) => {
                let mut seq = serializer.serialize_seq(Some(children.len()))?;
                for child in children {
                    seq.serialize_element(child)?;
                }
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_displays_empty() {
        assert_eq!(Uid::Null.to_string(), "");
        assert!(Uid::Null.is_null());
    }

    #[test]
    fn test_multi_joins_children() {
        let id = Uid::multi(vec![Uid::from("abc"), Uid::from(12_i64), Uid::Null]);
        assert_eq!(id.to_string(), "abc 12 ");
        assert_eq!(id.len(), 3);
        assert_eq!(id.children()[1], Uid::Int64(12));
    }

    #[test]
    fn test_empty_multi() {
        let id = Uid::multi(Vec::new());
        assert!(id.is_empty());
        assert_eq!(id.to_string(), "");
        assert!(!Uid::Null.is_empty());
    }

    #[test]
    fn test_nested_multi_display() {
        let inner = Uid::multi(vec![Uid::from("a"), Uid::from("b")]);
        let outer = Uid::multi(vec![inner, Uid::from("c")]);
        assert_eq!(outer.to_string(), "a b c");
        assert_eq!(outer.len(), 2);
    }

    #[test]
    fn test_serde() {
        let id = Uid::multi(vec![Uid::Null, Uid::from("x"), Uid::from(3_i64)]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#"[null,"x",3]"#);
    }
}
