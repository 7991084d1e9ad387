//! Binding keys and qualifiers.

use std::any::{type_name, TypeId};
use std::fmt;

/// Distinguishes multiple bindings of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// String-named binding, the `@Named` analog.
    Named(String),
    /// Marker-type binding, the marker-attribute analog.
    Marker(TypeId, &'static str),
}

impl Qualifier {
    pub fn named(name: impl Into<String>) -> Self {
        Qualifier::Named(name.into())
    }

    pub fn marker<M: 'static>() -> Self {
        Qualifier::Marker(TypeId::of::<M>(), type_name::<M>())
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Named(name) => write!(f, "named '{name}'"),
            Qualifier::Marker(_, name) => write!(f, "marked {name}"),
        }
    }
}

/// Identity of a binding: the bound type plus an optional qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    id: TypeId,
    name: &'static str,
    qualifier: Option<Qualifier>,
}

impl Key {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Key {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            qualifier: None,
        }
    }

    pub fn qualified<T: ?Sized + 'static>(qualifier: Qualifier) -> Self {
        Key {
            qualifier: Some(qualifier),
            ..Key::of::<T>()
        }
    }

    pub(crate) fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.name
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{} {}", self.name, qualifier),
            None => f.write_str(self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Repository {}

    struct Primary;

    #[test]
    fn test_plain_keys_compare_by_type() {
        assert_eq!(Key::of::<String>(), Key::of::<String>());
        assert_ne!(Key::of::<String>(), Key::of::<u32>());
        assert_eq!(Key::of::<dyn Repository>(), Key::of::<dyn Repository>());
    }

    #[test]
    fn test_qualifier_distinguishes_keys() {
        let plain = Key::of::<String>();
        let named = Key::qualified::<String>(Qualifier::named("main"));
        let marked = Key::qualified::<String>(Qualifier::marker::<Primary>());
        assert_ne!(plain, named);
        assert_ne!(named, marked);
        assert_eq!(
            named,
            Key::qualified::<String>(Qualifier::named("main"))
        );
    }

    #[test]
    fn test_display_forms() {
        let named = Key::qualified::<u32>(Qualifier::named("port"));
        assert_eq!(named.to_string(), "u32 named 'port'");
        assert_eq!(Key::of::<u32>().to_string(), "u32");
        let marked = Key::qualified::<u32>(Qualifier::marker::<Primary>());
        assert!(marked.to_string().contains("marked"));
        assert!(marked.to_string().contains("Primary"));
    }
}
