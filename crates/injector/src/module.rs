//! Binding collection and the module contract.

use std::any::Any;

use crate::binding::{Binding, ProviderFn};
use crate::error::InjectorError;
use crate::key::Key;

/// A set of binding declarations with unique keys.
///
/// Bindings are collected, not resolved: the collector validates key
/// uniqueness and keeps the declarations for whatever container or
/// bootstrap code consumes them.
#[derive(Default)]
pub struct Bindings {
    entries: Vec<Entry>,
}

struct Entry {
    key: Key,
    binding: Box<dyn Any>,
}

impl Bindings {
    pub fn new() -> Self {
        Bindings::default()
    }

    /// Adds a finished binding. A key collision is a
    /// [`InjectorError::DuplicateBinding`].
    pub fn add<T: ?Sized + 'static>(
        &mut self,
        binding: Binding<T>,
    ) -> Result<(), InjectorError> {
        if self.contains(binding.key()) {
            return Err(InjectorError::DuplicateBinding(binding.key().to_string()));
        }
        self.entries.push(Entry {
            key: binding.key().clone(),
            binding: Box::new(binding),
        });
        Ok(())
    }

    /// Runs a module's configuration against this collector.
    pub fn install(&mut self, module: &dyn Module) -> Result<(), InjectorError> {
        module.configure(self)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entries.iter().any(|entry| entry.key == *key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|entry| &entry.key)
    }

    /// The typed binding for a key, when present and of type `T`.
    pub fn binding<T: ?Sized + 'static>(&self, key: &Key) -> Option<&Binding<T>> {
        self.entries
            .iter()
            .find(|entry| entry.key == *key)
            .and_then(|entry| entry.binding.downcast_ref::<Binding<T>>())
    }

    /// Local provider for a key. An unbound key and a deferred target are
    /// both a [`InjectorError::MissingTarget`].
    pub fn provider<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &Key,
    ) -> Result<ProviderFn<T>, InjectorError> {
        self.binding::<T>(key)
            .and_then(Binding::provider)
            .ok_or_else(|| InjectorError::MissingTarget(key.to_string()))
    }
}

/// Contributes bindings to a collector.
///
/// ```
/// use gantry_injector::{bind, Bindings, InjectorError, Module};
///
/// struct Clock;
///
/// struct CoreModule;
///
/// impl Module for CoreModule {
///     fn configure(&self, bindings: &mut Bindings) -> Result<(), InjectorError> {
///         bindings.add(bind::<Clock>().to_provider(|| Clock).build())
///     }
/// }
///
/// let mut bindings = Bindings::new();
/// bindings.install(&CoreModule).unwrap();
/// assert_eq!(bindings.len(), 1);
/// ```
pub trait Module {
    fn configure(&self, bindings: &mut Bindings) -> Result<(), InjectorError>;
}
