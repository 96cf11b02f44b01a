use core::fmt;

/// Identity of a named Avro type (record, enum or fixed).
///
/// Two schemas agree on a named type when their qualified names are equal;
/// the namespace is empty for types declared in the null namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct QualifiedName {
    pub name: String,
    pub namespace: String,
}

impl QualifiedName {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Parse a possibly dotted name.
    ///
    /// A dotted name carries its own namespace (`"a.b.C"` is `C` in `a.b`);
    /// a bare name inherits `default_namespace`.
    pub fn parse(full: &str, default_namespace: &str) -> Self {
        match full.rsplit_once('.') {
            Some((namespace, name)) => Self::new(name, namespace),
            None => Self::new(full, default_namespace),
        }
    }

    /// The same name with the namespace stripped.
    pub fn unqualified(&self) -> Self {
        Self::new(self.name.clone(), "")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.namespace, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_names_carry_their_namespace() {
        let name = QualifiedName::parse("com.example.Person", "ignored");
        assert_eq!(name, QualifiedName::new("Person", "com.example"));
        assert_eq!(name.to_string(), "com.example.Person");
    }

    #[test]
    fn bare_names_inherit_the_default_namespace() {
        let name = QualifiedName::parse("Person", "com.example");
        assert_eq!(name.namespace, "com.example");
        assert_eq!(QualifiedName::parse("Person", "").to_string(), "Person");
    }
}
