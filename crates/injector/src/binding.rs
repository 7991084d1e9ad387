//! Binding declarations and their fluent builder.

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::InjectorError;
use crate::key::{Key, Qualifier};

/// Provisioning function handed out by bindings that can provision
/// locally.
pub type ProviderFn<T> = Arc<dyn Fn() -> Arc<T> + Send + Sync>;

/// Instance lifetime policy. Declarative only; enforcing it is the
/// container's job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    Transient,
    Singleton,
    Thread,
    Request,
}

/// What a key resolves to.
pub enum Target<T: ?Sized> {
    /// An implementation type, resolved later by a container.
    Type { id: TypeId, name: &'static str },
    /// A ready instance shared by every provision.
    Instance(Arc<T>),
    /// A provisioning function.
    Provider(ProviderFn<T>),
    /// Runtime service-loader discovery.
    Service,
    /// A remote implementation behind a URI.
    Remote(String),
}

impl<T: ?Sized> Clone for Target<T> {
    fn clone(&self) -> Self {
        match self {
            Target::Type { id, name } => Target::Type {
                id: *id,
                name,
            },
            Target::Instance(instance) => Target::Instance(Arc::clone(instance)),
            Target::Provider(provider) => Target::Provider(Arc::clone(provider)),
            Target::Service => Target::Service,
            Target::Remote(uri) => Target::Remote(uri.clone()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Target<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Type { name, .. } => f.debug_struct("Type").field("name", name).finish(),
            Target::Instance(_) => f.write_str("Instance"),
            Target::Provider(_) => f.write_str("Provider"),
            Target::Service => f.write_str("Service"),
            Target::Remote(uri) => f.debug_tuple("Remote").field(uri).finish(),
        }
    }
}

/// Starts a binding declaration for `T`, self-bound by default.
pub fn bind<T: ?Sized + 'static>() -> BindingBuilder<T> {
    BindingBuilder {
        key: Key::of::<T>(),
        target: Target::Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        },
        scope: Scope::default(),
    }
}

/// Fluent builder for a [`Binding`].
///
/// ```
/// use gantry_injector::{bind, Scope};
///
/// struct Clock;
///
/// let binding = bind::<Clock>()
///     .named("wall")
///     .to_provider(|| Clock)
///     .in_scope(Scope::Singleton)
///     .build();
/// assert!(binding.provider().is_some());
/// ```
pub struct BindingBuilder<T: ?Sized + 'static> {
    key: Key,
    target: Target<T>,
    scope: Scope,
}

impl<T: ?Sized + 'static> BindingBuilder<T> {
    /// Qualifies the key with a name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.key = self.key.with_qualifier(Qualifier::named(name));
        self
    }

    /// Qualifies the key with an arbitrary qualifier.
    pub fn with(mut self, qualifier: Qualifier) -> Self {
        self.key = self.key.with_qualifier(qualifier);
        self
    }

    /// Binds to an implementation type, resolved by a container later.
    pub fn to<U: 'static>(mut self) -> Self {
        self.target = Target::Type {
            id: TypeId::of::<U>(),
            name: type_name::<U>(),
        };
        self
    }

    /// Binds to a ready instance.
    pub fn to_instance(mut self, instance: T) -> Self
    where
        T: Sized,
    {
        self.target = Target::Instance(Arc::new(instance));
        self
    }

    /// Binds to an already-shared instance. The unsized-friendly variant
    /// of [`to_instance`](BindingBuilder::to_instance), so trait-object
    /// keys can carry an implementation: `Arc<Pg>` coerces to
    /// `Arc<dyn Repository>`.
    pub fn to_shared(mut self, instance: Arc<T>) -> Self {
        self.target = Target::Instance(instance);
        self
    }

    /// Binds to a provisioning function.
    pub fn to_provider(mut self, provider: impl Fn() -> T + Send + Sync + 'static) -> Self
    where
        T: Sized,
    {
        self.target = Target::Provider(Arc::new(move || Arc::new(provider())));
        self
    }

    /// Marks the binding for runtime service-loader discovery.
    pub fn service(mut self) -> Self {
        self.target = Target::Service;
        self
    }

    /// Binds to a remote implementation. The URI must carry a scheme.
    pub fn on(mut self, uri: impl Into<String>) -> Result<Self, InjectorError> {
        let uri = uri.into();
        if !valid_remote_uri(&uri) {
            return Err(InjectorError::InvalidUri(uri));
        }
        self.target = Target::Remote(uri);
        Ok(self)
    }

    pub fn in_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn build(self) -> Binding<T> {
        Binding {
            key: self.key,
            target: self.target,
            scope: self.scope,
        }
    }
}

fn valid_remote_uri(uri: &str) -> bool {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return false;
    };
    !scheme.is_empty()
        && !rest.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c))
}

/// A finished binding declaration.
#[derive(Clone, Debug)]
pub struct Binding<T: ?Sized + 'static> {
    key: Key,
    target: Target<T>,
    scope: Scope,
}

impl<T: ?Sized + 'static> Binding<T> {
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn target(&self) -> &Target<T> {
        &self.target
    }

    /// Provider when the target can provision locally: instance and
    /// provider targets. Type, service and remote targets defer to a
    /// container and yield `None`. Provisioned values are shared, hence
    /// the `Send + Sync` requirement.
    pub fn provider(&self) -> Option<ProviderFn<T>>
    where
        T: Send + Sync,
    {
        match &self.target {
            Target::Instance(instance) => {
                let shared = Arc::clone(instance);
                Some(Arc::new(move || Arc::clone(&shared)))
            }
            Target::Provider(provider) => Some(Arc::clone(provider)),
            Target::Type { .. } | Target::Service | Target::Remote(_) => None,
        }
    }
}
