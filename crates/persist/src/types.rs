use std::collections::HashMap;

use crate::error::PersistError;
use crate::field::{Persist, Persistable};

/// Constructor for a registered type, producing its default instance.
pub type Factory = fn() -> Box<dyn Persistable>;

/// Type-identity string → constructor, for fields whose concrete type is
/// only known from the stream.
///
/// Types opt in explicitly; an identity nobody registered fails with
/// `UnknownType` rather than being resolved dynamically.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its `TYPE_NAME`.
    pub fn register<T: Persist>(&mut self) -> Result<(), PersistError> {
        self.register_factory(T::TYPE_NAME, || -> Box<dyn Persistable> {
            Box::new(T::default())
        })
    }

    /// Builder-style [`TypeRegistry::register`].
    pub fn with<T: Persist>(mut self) -> Result<Self, PersistError> {
        self.register::<T>()?;
        Ok(self)
    }

    pub fn register_factory(
        &mut self,
        identity: &'static str,
        factory: Factory,
    ) -> Result<(), PersistError> {
        if self.factories.contains_key(identity) {
            return Err(PersistError::DuplicateType(identity.to_string()));
        }
        self.factories.insert(identity, factory);
        Ok(())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.factories.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Allocate a fresh instance of the type named `identity`.
    pub fn create(&self, identity: &str) -> Result<Box<dyn Persistable>, PersistError> {
        self.factories
            .get(identity)
            .map(|factory| factory())
            .ok_or_else(|| PersistError::UnknownType(identity.to_string()))
    }
}
