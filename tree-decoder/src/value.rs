use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;

/// A generic, string-valued document tree, as produced by an XML parser.
///
/// Every leaf is either [`ValueTree::Text`] or [`ValueTree::Null`], and every branch
/// is either an [`ValueTree::Object`] (child elements by name, in document order)
/// or an [`ValueTree::Array`] (repeated elements).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ValueTree {
    /// An element with no content.
    #[default]
    Null,
    /// The text content of an element or attribute.
    Text(String),
    /// Named children of an element.
    Object(IndexMap<String, Self>),
    /// A sequence of sibling elements.
    Array(Vec<Self>),
}

/// The runtime shape of a [`ValueTree`] node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Text,
    Object,
    Array,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Text => "text",
            Self::Object => "object",
            Self::Array => "array",
        })
    }
}

impl ValueTree {
    /// Creates a text leaf.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates an object from `(key, value)` pairs, keeping their order.
    /// Duplicate keys keep the last value.
    #[must_use]
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Creates an array from a list of nodes.
    #[must_use]
    pub fn array(elements: impl IntoIterator<Item = Self>) -> Self {
        Self::Array(elements.into_iter().collect())
    }

    /// Returns the runtime shape of this node.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Text(_) => ValueKind::Text,
            Self::Object(_) => ValueKind::Object,
            Self::Array(_) => ValueKind::Array,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Self::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&IndexMap<String, Self>> {
        if let Self::Object(map) = self {
            Some(map)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        if let Self::Array(elements) = self {
            Some(elements)
        } else {
            None
        }
    }

    /// Looks up a child of an object node.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl Display for ValueTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Object(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Array(elements) => {
                f.write_str("[")?;
                for (i, value) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for ValueTree {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for ValueTree {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ValueTree {
    fn from(elements: Vec<T>) -> Self {
        Self::Array(elements.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for ValueTree {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Converts a JSON document into a string-valued tree.
///
/// Booleans and numbers become their textual representation, mirroring how they
/// would appear as XML element text.
impl From<serde_json::Value> for ValueTree {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Text(b.to_string()),
            serde_json::Value::Number(n) => Self::Text(n.to_string()),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(elements) => {
                Self::Array(elements.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{ValueKind, ValueTree};
    use serde_json::json;

    #[test]
    fn from_json() {
        let tree = ValueTree::from(json!({
            "name": "Widget",
            "count": 3,
            "enabled": true,
            "ratio": 0.5,
            "parts": ["a", null],
        }));

        assert_eq!(tree.get("name"), Some(&ValueTree::text("Widget")));
        assert_eq!(tree.get("count"), Some(&ValueTree::text("3")));
        assert_eq!(tree.get("enabled"), Some(&ValueTree::text("true")));
        assert_eq!(tree.get("ratio"), Some(&ValueTree::text("0.5")));
        assert_eq!(
            tree.get("parts"),
            Some(&ValueTree::array([ValueTree::text("a"), ValueTree::Null]))
        );
        assert_eq!(tree.get("missing"), None);
    }

    #[test]
    fn keeps_document_order() {
        let tree = ValueTree::object([
            ("zeta", ValueTree::Null),
            ("alpha", ValueTree::Null),
            ("mid", ValueTree::Null),
        ]);
        let keys: Vec<_> = tree.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn kinds() {
        assert_eq!(ValueTree::Null.kind(), ValueKind::Null);
        assert_eq!(ValueTree::text("").kind(), ValueKind::Text);
        assert_eq!(ValueTree::array([]).kind(), ValueKind::Array);
        assert_eq!(ValueTree::object::<String, _>([]).kind(), ValueKind::Object);
        assert_eq!(ValueKind::Object.to_string(), "object");
    }

    #[test]
    fn display() {
        let tree = ValueTree::object([
            ("a", ValueTree::text("1")),
            ("b", ValueTree::array([ValueTree::Null])),
        ]);
        assert_eq!(tree.to_string(), r#"{"a": "1", "b": [null]}"#);
    }
}
