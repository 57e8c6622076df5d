use std::fmt::{self, Display, Formatter};

/// One step into a document: either a field name or a sequence index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CodingPathComponent {
    Key(String),
    Index(usize),
}

impl CodingPathComponent {
    /// Returns the field name of this component, if it is one.
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) => None,
        }
    }
}

impl Display for CodingPathComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for CodingPathComponent {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for CodingPathComponent {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for CodingPathComponent {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// The location of a node in the original document, used for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CodingPath(Vec<CodingPathComponent>);

impl CodingPath {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn components(&self) -> &[CodingPathComponent] {
        &self.0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&CodingPathComponent> {
        self.0.last()
    }

    pub fn push(&mut self, component: impl Into<CodingPathComponent>) {
        self.0.push(component.into());
    }

    pub fn pop(&mut self) -> Option<CodingPathComponent> {
        self.0.pop()
    }

    /// Returns a copy of this path with one more component.
    #[must_use]
    pub fn appending(&self, component: impl Into<CodingPathComponent>) -> Self {
        let mut path = self.clone();
        path.push(component);
        path
    }
}

/// Formats the path as `root.child[2].leaf`, or `<root>` when empty.
impl Display for CodingPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 && matches!(component, CodingPathComponent::Key(_)) {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

impl FromIterator<CodingPathComponent> for CodingPath {
    fn from_iter<I: IntoIterator<Item = CodingPathComponent>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use super::{CodingPath, CodingPathComponent};

    #[test]
    fn display() {
        assert_eq!(CodingPath::new().to_string(), "<root>");

        let path: CodingPath = [
            CodingPathComponent::from("library"),
            CodingPathComponent::from("books"),
            CodingPathComponent::from(2),
            CodingPathComponent::from("title"),
        ]
        .into_iter()
        .collect();
        assert_eq!(path.to_string(), "library.books[2].title");

        let path = CodingPath::new().appending(0).appending("id");
        assert_eq!(path.to_string(), "[0].id");
    }

    #[test]
    fn push_and_pop() {
        let mut path = CodingPath::new();
        path.push("a");
        path.push(4);
        assert_eq!(path.len(), 2);
        assert_eq!(path.pop(), Some(CodingPathComponent::Index(4)));
        assert_eq!(path.last().and_then(CodingPathComponent::as_key), Some("a"));
    }
}
