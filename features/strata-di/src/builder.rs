use std::sync::Arc;

use crate::{
    binding::{Concrete, Resolver},
    config::ContainerConfig,
    container::Container,
    contract::ServiceContainer,
    errors::ContainerError,
    layer::LayeredContainer,
    reflection::{Reflector, TypeDescriptor, TypeRegistry},
    types::{Injectable, Instance},
};

/// A registration recorded by the builder, applied in order on [ContainerBuilder::build]
enum Registration {
    Instance(String, Instance),
    Binding(String, Concrete, bool),
    Alias(String, String),
}

/// Start-up registration of everything a container should know
///
/// ```
/// use strata_di::{ContainerBuilder, ServiceContainerExt};
///
/// let container = ContainerBuilder::new()
///     .add_instance("greeting", "hello".to_string())
///     .add_alias("greeting", "welcome")
///     .build()
///     .unwrap();
///
/// assert_eq!(*container.require::<String>("welcome").unwrap(), "hello");
/// ```
pub struct ContainerBuilder {
    registry: TypeRegistry,
    reflector: Option<Arc<dyn Reflector>>,
    config: ContainerConfig,
    registrations: Vec<Registration>,
}
impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        ContainerBuilder {
            registry: TypeRegistry::new(),
            reflector: None,
            config: ContainerConfig::default(),
            registrations: Vec::new(),
        }
    }
}

impl ContainerBuilder {
    /// Registers a type descriptor with the builder's own [TypeRegistry]
    ///
    /// Ignored once a custom reflector is set with [ContainerBuilder::reflector].
    pub fn add_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.registry.insert(descriptor);
        self
    }

    /// Uses `reflector` instead of the builder's registry
    pub fn reflector(mut self, reflector: impl Reflector + 'static) -> Self {
        self.reflector = Some(Arc::new(reflector));
        self
    }

    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add_instance<T: Injectable>(self, id: impl Into<String>, instance: T) -> Self {
        self.add_registration(Registration::Instance(id.into(), Instance::new(instance)))
    }

    pub fn add_resolver<T, F>(self, id: impl Into<String>, resolver: F) -> Self
    where
        T: Injectable,
        F: Fn(&dyn ServiceContainer) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.add_binding(id, typed_resolver(resolver), false)
    }

    /// Like [ContainerBuilder::add_resolver], but the first result is kept
    pub fn add_singleton<T, F>(self, id: impl Into<String>, resolver: F) -> Self
    where
        T: Injectable,
        F: Fn(&dyn ServiceContainer) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.add_binding(id, typed_resolver(resolver), true)
    }

    /// Resolves `id` as `target`, e.g. an interface as its implementation
    pub fn bind_type(self, id: impl Into<String>, target: impl Into<String>, shared: bool) -> Self {
        self.add_binding(id, Concrete::Type(target.into()), shared)
    }

    pub fn add_binding(self, id: impl Into<String>, concrete: impl Into<Concrete>, shared: bool) -> Self {
        self.add_registration(Registration::Binding(id.into(), concrete.into(), shared))
    }

    pub fn add_alias(self, id: impl Into<String>, alias: impl Into<String>) -> Self {
        self.add_registration(Registration::Alias(id.into(), alias.into()))
    }

    fn add_registration(mut self, registration: Registration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Creates the container, failing on an invalid alias
    pub fn build(self) -> Result<Container, ContainerError> {
        let reflector = match self.reflector {
            Some(reflector) => reflector,
            None => Arc::new(self.registry),
        };
        let container = Container::with_config(reflector, self.config);
        apply(&container, self.registrations)?;

        tracing::debug!("Built container {:?}", container);
        Ok(container)
    }

    /// Creates a layer on top of `parent` holding the builder's registrations
    ///
    /// The layer uses the parent's reflector and config, types and config given to the builder are ignored.
    pub fn build_layer(self, parent: impl ServiceContainer + 'static) -> Result<LayeredContainer, ContainerError> {
        let layer = LayeredContainer::new(parent);
        apply(&layer, self.registrations)?;
        Ok(layer)
    }
}

fn apply(container: &dyn ServiceContainer, registrations: Vec<Registration>) -> Result<(), ContainerError> {
    for registration in registrations {
        match registration {
            Registration::Instance(id, instance) => container.set(&id, instance),
            Registration::Binding(id, concrete, shared) => container.bind(&id, concrete, shared),
            Registration::Alias(id, alias) => container.alias(&id, &alias)?,
        }
    }
    Ok(())
}

fn typed_resolver<T, F>(resolver: F) -> Resolver
where
    T: Injectable,
    F: Fn(&dyn ServiceContainer) -> Result<T, ContainerError> + Send + Sync + 'static,
{
    Resolver::new(move |container| resolver(container).map(Instance::new))
}
