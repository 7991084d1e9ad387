//! Dependency binding declarations.
//!
//! This crate covers the declaration side of dependency injection: typed
//! [`Key`]s, fluent [`BindingBuilder`]s and the [`Bindings`] collector
//! that [`Module`]s contribute to. Resolution, instantiation of type
//! targets and scope enforcement belong to a container and are out of
//! scope here; bindings with instance or provider targets can provision
//! locally through [`Binding::provider`].
//!
//! ```
//! use gantry_injector::{bind, Bindings, Scope};
//!
//! struct Config;
//!
//! let mut bindings = Bindings::new();
//! bindings
//!     .add(
//!         bind::<Config>()
//!             .to_provider(|| Config)
//!             .in_scope(Scope::Singleton)
//!             .build(),
//!     )
//!     .unwrap();
//! ```
//!
//! ## Key Abstractions
//!
//! - **`Key`**: Bound type plus optional qualifier, the binding identity
//! - **`BindingBuilder`**: Fluent declaration, self-bound by default
//! - **`Target`**: Type, instance, provider, service or remote backing
//! - **`Bindings` / `Module`**: Collection with duplicate detection

mod binding;
mod error;
mod key;
mod module;

pub use binding::{bind, Binding, BindingBuilder, ProviderFn, Scope, Target};
pub use error::InjectorError;
pub use key::{Key, Qualifier};
pub use module::{Bindings, Module};
