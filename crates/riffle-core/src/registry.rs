//! Interning of edge-type and property-key strings.

use arcstr::ArcStr;
use riffle_common::collections::{riffle_index_set, RiffleIndexSet};
use riffle_common::types::TypeId;
use riffle_common::utils::error::{Error, Result};

/// Interns edge-type and property-key strings to small integer IDs.
///
/// IDs are insertion indices, so the same registry always maps the same
/// string to the same ID. The two namespaces are independent: an edge type
/// and a property key may share a name without sharing an ID.
///
/// Inject a registry into whatever needs one rather than reaching for a
/// global; tests rely on isolated registries to exercise the unknown-type
/// error path deterministically.
#[derive(Debug)]
pub struct TypeRegistry {
    types: RiffleIndexSet<ArcStr>,
    property_keys: RiffleIndexSet<ArcStr>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: riffle_index_set(),
            property_keys: riffle_index_set(),
        }
    }

    fn intern(set: &mut RiffleIndexSet<ArcStr>, name: &str) -> Result<TypeId> {
        if let Some(index) = set.get_index_of(name) {
            return Ok(TypeId::new(index as u16));
        }
        let index = set.len();
        // u16::MAX is reserved for the ANY sentinel.
        if index >= usize::from(u16::MAX) {
            return Err(Error::Exhaustion {
                message: format!("type ID space exhausted interning {name:?}"),
            });
        }
        set.insert(ArcStr::from(name));
        Ok(TypeId::new(index as u16))
    }

    /// Interns an edge-type name, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhaustion`] once the ID space is full.
    pub fn intern_type(&mut self, name: &str) -> Result<TypeId> {
        Self::intern(&mut self.types, name)
    }

    /// Looks up an edge-type name during planning.
    ///
    /// `None` means "any type" and maps to [`TypeId::ANY`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchType`] for a name that was never interned.
    pub fn lookup_type(&self, name: Option<&str>) -> Result<TypeId> {
        match name {
            None => Ok(TypeId::ANY),
            Some(name) => self
                .types
                .get_index_of(name)
                .map(|index| TypeId::new(index as u16))
                .ok_or_else(|| Error::NoSuchType {
                    name: name.to_string(),
                }),
        }
    }

    /// The name behind an edge-type ID.
    #[must_use]
    pub fn type_name(&self, id: TypeId) -> Option<&str> {
        self.types.get_index(usize::from(id.as_u16())).map(ArcStr::as_str)
    }

    /// Interns a property-key name, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhaustion`] once the ID space is full.
    pub fn intern_property_key(&mut self, name: &str) -> Result<TypeId> {
        Self::intern(&mut self.property_keys, name)
    }

    /// Looks up a property-key name during planning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchType`] for a name that was never interned.
    pub fn lookup_property_key(&self, name: &str) -> Result<TypeId> {
        self.property_keys
            .get_index_of(name)
            .map(|index| TypeId::new(index as u16))
            .ok_or_else(|| Error::NoSuchType {
                name: name.to_string(),
            })
    }

    /// The name behind a property-key ID.
    #[must_use]
    pub fn property_key_name(&self, id: TypeId) -> Option<&str> {
        self.property_keys
            .get_index(usize::from(id.as_u16()))
            .map(ArcStr::as_str)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut registry = TypeRegistry::new();
        let follows = registry.intern_type("FOLLOWS").unwrap();
        let likes = registry.intern_type("LIKES").unwrap();
        assert_ne!(follows, likes);
        assert_eq!(registry.intern_type("FOLLOWS").unwrap(), follows);
        assert_eq!(registry.type_name(follows), Some("FOLLOWS"));
    }

    #[test]
    fn test_lookup_none_is_any() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.lookup_type(None).unwrap(), TypeId::ANY);
    }

    #[test]
    fn test_lookup_unknown_type_fails() {
        let registry = TypeRegistry::new();
        let err = registry.lookup_type(Some("FOLLOWS")).unwrap_err();
        assert!(matches!(err, Error::NoSuchType { name } if name == "FOLLOWS"));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut registry = TypeRegistry::new();
        registry.intern_type("name").unwrap();
        assert!(registry.lookup_property_key("name").is_err());
        let key = registry.intern_property_key("name").unwrap();
        assert_eq!(registry.lookup_property_key("name").unwrap(), key);
    }
}
