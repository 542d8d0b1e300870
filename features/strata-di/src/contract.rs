use std::{any::type_name, sync::Arc};

use crate::{
    binding::{Concrete, Extender, Resolution, Resolver},
    build_stack::BuildStack,
    call::CallTarget,
    config::ContainerConfig,
    errors::{ContainerError, ResolutionError},
    parameters::Parameters,
    reflection::Reflector,
    types::{Injectable, Instance},
};

/// The contract shared by [crate::container::Container] and [crate::layer::LayeredContainer]
///
/// Resolvers, extenders and layers only ever see containers through this trait,
/// which keeps nested resolutions on the container the outermost call started on.
pub trait ServiceContainer: Send + Sync {
    /// True if `id` is bound, holds an instance or is an alias
    fn has(&self, id: &str) -> bool;

    /// Resolves `id`, failing with [ContainerError::BindingNotFound] if nothing is registered for it
    fn get(&self, id: &str) -> Result<Instance, ContainerError> {
        if !self.has(id) {
            return Err(ContainerError::BindingNotFound(id.to_string()));
        }
        self.resolve(id)
    }

    /// Resolves `id`, constructing it by reflection if it is not bound
    fn resolve(&self, id: &str) -> Result<Instance, ContainerError> {
        self.resolve_with(id, &Parameters::new())
    }

    /// Like [ServiceContainer::resolve], passing `parameters` on to reflective construction
    fn resolve_with(&self, id: &str, parameters: &Parameters) -> Result<Instance, ContainerError> {
        self.resolve_scoped(id, parameters, &mut BuildStack::new())
    }

    /// Resolution step within an ongoing call tree
    fn resolve_scoped(
        &self,
        id: &str,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError>;

    /// Builds a new instance of `type_id` by reflection, resolving its constructor parameters
    fn construct(&self, type_id: &str, parameters: &Parameters) -> Result<Instance, ContainerError> {
        self.construct_scoped(type_id, parameters, &mut BuildStack::new())
    }

    /// Construction step within an ongoing call tree
    fn construct_scoped(
        &self,
        type_id: &str,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError>;

    /// Calls `target`, injecting its parameters
    fn call(
        &self,
        target: &CallTarget,
        parameters: &Parameters,
        default_method: Option<&str>,
    ) -> Result<Instance, ContainerError>;

    /// Stores `instance` as the value of `id`, replacing an alias of the same name
    fn set(&self, id: &str, instance: Instance);

    /// Registers a binding, dropping any instance or alias cached for `id`
    fn bind(&self, id: &str, concrete: Concrete, shared: bool);

    /// Binds a resolver called on every resolution
    fn bind_resolver(&self, id: &str, resolver: Resolver) {
        self.bind(id, Concrete::Resolver(resolver), false)
    }

    /// Binds a resolver called once, its result is cached
    fn bind_singleton_resolver(&self, id: &str, resolver: Resolver) {
        self.bind(id, Concrete::Resolver(resolver), true)
    }

    /// Makes `id` available as `alias` too
    fn alias(&self, id: &str, alias: &str) -> Result<(), ContainerError>;

    /// Decorates the value of `id` - immediately if it is already an instance,
    /// otherwise on every future resolution
    fn extend(&self, id: &str, extender: Extender) -> Result<(), ContainerError>;

    /// Type descriptors used for reflective construction
    fn reflector(&self) -> Arc<dyn Reflector>;

    /// Settings, handed down to layers created on top of this container
    fn config(&self) -> ContainerConfig;
}

/// Typed and closure based shortcuts for every [ServiceContainer]
pub trait ServiceContainerExt: ServiceContainer {
    /// Gets `id` and downcasts it to `T`
    fn require<T: Injectable>(&self, id: &str) -> Result<Arc<T>, ContainerError> {
        downcast(self.get(id)?)
    }

    /// Resolves `id` and downcasts it to `T`
    fn resolve_as<T: Injectable>(&self, id: &str) -> Result<Arc<T>, ContainerError> {
        downcast(self.resolve(id)?)
    }

    /// Stores `value` under `id`
    fn set_value<T: Injectable>(&self, id: &str, value: T) {
        self.set(id, Instance::new(value))
    }

    /// Binds a closure producing a fresh value on every resolution
    fn bind_fn<T, F>(&self, id: &str, resolver: F)
    where
        T: Injectable,
        F: Fn(&dyn ServiceContainer) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.bind_resolver(id, value_resolver(resolver))
    }

    /// Binds a closure whose first result is cached
    fn singleton_fn<T, F>(&self, id: &str, resolver: F)
    where
        T: Injectable,
        F: Fn(&dyn ServiceContainer) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.bind_singleton_resolver(id, value_resolver(resolver))
    }

    /// Decorates the value of `id` with a typed closure
    fn extend_fn<T, R, F>(&self, id: &str, extender: F) -> Result<(), ContainerError>
    where
        T: Injectable,
        R: Injectable,
        F: Fn(Arc<T>, &dyn ServiceContainer) -> Result<R, ContainerError> + Send + Sync + 'static,
    {
        self.extend(
            id,
            Extender::new(move |instance, container| {
                let value = downcast::<T>(instance)?;
                extender(value, container).map(Instance::new)
            }),
        )
    }
}
impl<C: ServiceContainer + ?Sized> ServiceContainerExt for C {}

fn value_resolver<T, F>(resolver: F) -> Resolver
where
    T: Injectable,
    F: Fn(&dyn ServiceContainer) -> Result<T, ContainerError> + Send + Sync + 'static,
{
    Resolver::new(move |container| resolver(container).map(|value| Resolution::Instance(Instance::new(value))))
}

fn downcast<T: Injectable>(instance: Instance) -> Result<Arc<T>, ContainerError> {
    instance.downcast().map_err(|actual_type| {
        ResolutionError::DowncastFailed {
            required_type: type_name::<T>(),
            actual_type,
        }
        .into()
    })
}
