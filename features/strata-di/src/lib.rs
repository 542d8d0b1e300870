//! Strata DI is a string keyed dependency injection container which builds object graphs
//! on its own, and which can be stacked in layers.
//!
//! Strata DI is split into three major parts:
//! 1. Container: holds bindings, instances, aliases and extenders and resolves identifiers
//! 2. LayeredContainer: a container on top of a parent, overriding it without modifying it
//! 3. Reflection: type descriptors telling a container how to build types nobody bound
//!
//! # Examples
//!
//! ```rust
//! use strata_di::{
//!     Container, LayeredContainer, ParameterInfo, ServiceContainerExt, TypeDescriptor,
//!     TypeRegistry,
//! };
//!
//! struct Greeter {
//!     greeting: std::sync::Arc<String>,
//! }
//!
//! let types = TypeRegistry::new().register(
//!     TypeDescriptor::new("Greeter", |args| Ok(Greeter { greeting: args.get(0)? }))
//!         .param(ParameterInfo::typed("greeting", "greeting")),
//! );
//!
//! let container = Container::with_reflector(types);
//! container.set_value("greeting", "hello".to_string());
//!
//! let layer = LayeredContainer::new(container.clone());
//! layer.set_value("greeting", "servus".to_string());
//!
//! let greeter = container.resolve_as::<Greeter>("Greeter").unwrap();
//! assert_eq!(*greeter.greeting, "hello");
//!
//! let greeter = layer.resolve_as::<Greeter>("Greeter").unwrap();
//! assert_eq!(*greeter.greeting, "servus");
//! ```
//!
//! Strata DI consists of the following components:
//!
//! 1. Contract - the [ServiceContainer] trait all containers implement, plus typed shortcuts
//! 2. Container and Layer - the two containers
//! 3. Binding - resolvers, extenders and what an identifier is bound to
//! 4. Reflection - type descriptors and the [Reflector] seam
//! 5. Call - targets for injected calls
//! 6. Builder - start-up registration
//! 7. Errors - container and resolution errors

pub mod binding;
pub mod build_stack;
pub mod builder;
pub mod call;
pub mod config;
pub mod container;
pub mod contract;
pub mod errors;
pub mod layer;
pub mod parameters;
pub mod reflection;
pub mod types;

pub use binding::{Concrete, Extender, Resolution, Resolver};
pub use builder::ContainerBuilder;
pub use call::CallTarget;
pub use config::ContainerConfig;
pub use container::Container;
pub use contract::{ServiceContainer, ServiceContainerExt};
pub use errors::{ContainerError, ResolutionError};
pub use layer::LayeredContainer;
pub use parameters::Parameters;
pub use reflection::{Arguments, Callable, ParameterInfo, Reflector, TypeDescriptor, TypeRegistry};
pub use types::{type_key, DynError, Injectable, Instance, Null};
