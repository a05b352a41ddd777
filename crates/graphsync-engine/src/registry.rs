//! Class registry: construction, filtering, and mapping for user types.

use std::collections::{BTreeMap, HashMap};

use graphsync_core::Value;

use crate::error::SyncError;

type FactoryFn = dyn Fn() -> BTreeMap<String, Value> + Send + Sync;
type FilterFn = dyn Fn(&str) -> bool + Send + Sync;
type MapFn = dyn Fn(&str, Value) -> Value + Send + Sync;

/// Capability bundle for one registered class.
///
/// The factory is the construction strategy of two-phase construction: decode
/// builds the empty instance it returns first, binds it to its wire id, then
/// fills fields, so an instance can be referenced by its own fields. An entry
/// without a factory is legal on the sending side (filter and mapper only) but
/// fails decode with [`SyncError::MisconfiguredClass`].
pub struct ClassSpec {
    name: String,
    factory: Option<Box<FactoryFn>>,
    filter: Option<Box<FilterFn>>,
    map_out: Option<Box<MapFn>>,
    map_in: Option<Box<MapFn>>,
}

impl ClassSpec {
    /// Start a spec for the given class name.
    #[must_use]
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            factory: None,
            filter: None,
            map_out: None,
            map_in: None,
        }
    }

    /// Construction strategy: a zero-argument factory producing the initial
    /// field map of an empty instance.
    #[must_use]
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> BTreeMap<String, Value> + Send + Sync + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Construction strategy for default-constructible classes: an empty
    /// field map, filled entirely from the transport record.
    #[must_use]
    pub fn with_default_factory(self) -> Self {
        self.with_factory(BTreeMap::new)
    }

    /// Serialize-time field predicate; fields it rejects never reach the wire.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Transform applied to a field's value at serialize time, before encoding.
    #[must_use]
    pub fn with_map_out<F>(mut self, map: F) -> Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.map_out = Some(Box::new(map));
        self
    }

    /// Transform applied to a field's value at deserialize time, after decoding.
    #[must_use]
    pub fn with_map_in<F>(mut self, map: F) -> Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.map_in = Some(Box::new(map));
        self
    }

    /// The registered class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build an empty instance's field map.
    ///
    /// # Errors
    /// Returns [`SyncError::MisconfiguredClass`] if the entry carries no
    /// construction strategy.
    pub fn construct(&self) -> Result<BTreeMap<String, Value>, SyncError> {
        self.factory
            .as_ref()
            .map(|factory| factory())
            .ok_or_else(|| SyncError::MisconfiguredClass(self.name.clone()))
    }

    /// Whether a field passes the serialize-time filter.
    #[must_use]
    pub fn admits(&self, field: &str) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(field))
    }

    /// Apply the serialize-time field mapper, if any.
    #[must_use]
    pub fn map_out(&self, field: &str, value: Value) -> Value {
        match &self.map_out {
            Some(map) => map(field, value),
            None => value,
        }
    }

    /// Apply the deserialize-time field mapper, if any.
    #[must_use]
    pub fn map_in(&self, field: &str, value: Value) -> Value {
        match &self.map_in {
            Some(map) => map(field, value),
            None => value,
        }
    }
}

impl std::fmt::Debug for ClassSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassSpec")
            .field("name", &self.name)
            .field("factory", &self.factory.is_some())
            .field("filter", &self.filter.is_some())
            .field("map_out", &self.map_out.is_some())
            .field("map_in", &self.map_in.is_some())
            .finish()
    }
}

/// Lookup table from class name to capability bundle.
///
/// Populated once before use; the same name serves both directions (the name
/// carried on an instance node while serializing, the transport type name
/// while deserializing).
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassSpec>,
}

impl ClassRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, replacing any previous entry under the same name.
    pub fn register(&mut self, spec: ClassSpec) {
        self.classes.insert(spec.name.clone(), spec);
    }

    /// Look up a class by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClassSpec> {
        self.classes.get(name)
    }

    /// Whether a class name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_admits_everything() {
        let spec = ClassSpec::new("point").with_default_factory();
        assert!(spec.admits("anything"));
        assert!(spec.construct().unwrap().is_empty());
    }

    #[test]
    fn test_filter_and_mappers() {
        let spec = ClassSpec::new("point")
            .with_factory(|| BTreeMap::from([("kind".to_string(), Value::Text("p".to_string()))]))
            .with_filter(|field| !field.starts_with('_'))
            .with_map_out(|_, value| match value {
                Value::Number(n) => Value::Number(n * 2.0),
                other => other,
            });

        assert!(spec.admits("x"));
        assert!(!spec.admits("_secret"));
        assert_eq!(spec.map_out("x", Value::Number(2.0)), Value::Number(4.0));
        assert_eq!(spec.map_in("x", Value::Number(4.0)), Value::Number(4.0));
        assert_eq!(spec.construct().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_factory_is_misconfigured() {
        let spec = ClassSpec::new("send-only").with_filter(|_| true);
        assert!(matches!(
            spec.construct(),
            Err(SyncError::MisconfiguredClass(name)) if name == "send-only"
        ));
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ClassRegistry::new();
        registry.register(ClassSpec::new("point").with_default_factory());
        assert!(registry.contains("point"));
        assert!(registry.get("line").is_none());
    }
}
