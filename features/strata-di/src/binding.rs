use std::{fmt::Debug, sync::Arc};

use crate::{contract::ServiceContainer, errors::ContainerError, types::Instance};

/// What a [Resolver] produced
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The value itself
    Instance(Instance),
    /// Another identifier, resolved in turn by the container
    Redirect(String),
}
impl Resolution {
    pub fn redirect(id: impl Into<String>) -> Self {
        Resolution::Redirect(id.into())
    }
}
impl From<Instance> for Resolution {
    fn from(instance: Instance) -> Self {
        Resolution::Instance(instance)
    }
}

type ResolverFn =
    dyn Fn(&dyn ServiceContainer) -> Result<Resolution, ContainerError> + Send + Sync;
type ExtenderFn =
    dyn Fn(Instance, &dyn ServiceContainer) -> Result<Instance, ContainerError> + Send + Sync;

/// Function producing the value of a binding
///
/// Receives the container the resolution runs on - for a layer that is the layer itself.
#[derive(Clone)]
pub struct Resolver(Arc<ResolverFn>);
impl Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Resolver")
    }
}
impl Resolver {
    pub fn new<R, F>(resolver: F) -> Self
    where
        R: Into<Resolution>,
        F: Fn(&dyn ServiceContainer) -> Result<R, ContainerError> + Send + Sync + 'static,
    {
        Resolver(Arc::new(
            move |container: &dyn ServiceContainer| -> Result<Resolution, ContainerError> {
                resolver(container).map(Into::into)
            },
        ))
    }

    /// A resolver which resolves `id` instead
    pub fn redirect(id: impl Into<String>) -> Self {
        let id = id.into();
        Resolver::new(move |_| Ok(Resolution::Redirect(id.clone())))
    }

    pub fn resolve(&self, container: &dyn ServiceContainer) -> Result<Resolution, ContainerError> {
        (self.0)(container)
    }
}

/// Decorator applied to a resolved value
#[derive(Clone)]
pub struct Extender(Arc<ExtenderFn>);
impl Debug for Extender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Extender")
    }
}
impl Extender {
    pub fn new<F>(extender: F) -> Self
    where
        F: Fn(Instance, &dyn ServiceContainer) -> Result<Instance, ContainerError>
            + Send
            + Sync
            + 'static,
    {
        Extender(Arc::new(extender))
    }

    pub fn apply(
        &self,
        instance: Instance,
        container: &dyn ServiceContainer,
    ) -> Result<Instance, ContainerError> {
        (self.0)(instance, container)
    }
}

/// How a bound identifier is produced
#[derive(Debug, Clone)]
pub enum Concrete {
    /// Construct the identifier itself by reflection
    Reflect,
    /// Resolve another identifier instead
    Type(String),
    /// Call a resolver
    Resolver(Resolver),
}
impl From<Resolver> for Concrete {
    fn from(resolver: Resolver) -> Self {
        Concrete::Resolver(resolver)
    }
}

/// A registered binding
#[derive(Debug, Clone)]
pub struct Binding {
    pub concrete: Concrete,
    /// Cache the first result on the container
    pub shared: bool,
}
