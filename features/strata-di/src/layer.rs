use std::{fmt::Debug, sync::Arc};

use crate::{
    binding::{Concrete, Extender},
    build_stack::BuildStack,
    call::CallTarget,
    config::ContainerConfig,
    container::Container,
    contract::ServiceContainer,
    errors::ContainerError,
    parameters::Parameters,
    reflection::Reflector,
    types::Instance,
};

/// A container stacked on top of a parent container
///
/// The layer inherits whatever the parent knows at the time of each lookup, while
/// everything registered on the layer stays on the layer - the parent is never modified.
///
/// Lookups prefer the layer: an identifier known locally is resolved locally, one only
/// the parent knows is resolved entirely by the parent, with the parent's own bindings.
/// Types built by reflection on the layer resolve their dependencies through the layer,
/// so overrides on the layer reach into reflectively built graphs as well.
#[derive(Clone)]
pub struct LayeredContainer {
    local: Container,
    parent: Arc<dyn ServiceContainer>,
}
impl Debug for LayeredContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredContainer")
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

impl LayeredContainer {
    /// Creates a layer on top of `parent`
    ///
    /// Pass a clone of a [Container] to keep using the parent directly as well.
    pub fn new(parent: impl ServiceContainer + 'static) -> Self {
        LayeredContainer::from_shared(Arc::new(parent))
    }

    pub fn from_shared(parent: Arc<dyn ServiceContainer>) -> Self {
        let local = Container::with_config(parent.reflector(), parent.config());
        LayeredContainer { local, parent }
    }

    pub fn parent(&self) -> &Arc<dyn ServiceContainer> {
        &self.parent
    }

    /// The layer's own bindings, without the parent's
    pub fn local(&self) -> &Container {
        &self.local
    }
}

impl ServiceContainer for LayeredContainer {
    fn has(&self, id: &str) -> bool {
        self.local.has(id) || self.parent.has(id)
    }

    fn resolve_scoped(
        &self,
        id: &str,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError> {
        // Known on this layer - this layer takes priority
        if self.local.has(id) {
            return self.local.resolve_in(self, id, parameters, stack);
        }

        // Known on the parent - let the parent resolve it with its own definitions
        if self.parent.has(id) {
            tracing::trace!("Delegating {} to parent container", id);
            return self.parent.resolve_scoped(id, parameters, stack);
        }

        // Unknown everywhere - build it here so dependencies go through this layer
        self.local.resolve_in(self, id, parameters, stack)
    }

    fn construct_scoped(
        &self,
        type_id: &str,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError> {
        self.local.construct_in(self, type_id, parameters, stack)
    }

    fn call(
        &self,
        target: &CallTarget,
        parameters: &Parameters,
        default_method: Option<&str>,
    ) -> Result<Instance, ContainerError> {
        self.local.call_in(self, target, parameters, default_method)
    }

    fn set(&self, id: &str, instance: Instance) {
        self.local.set(id, instance)
    }

    fn bind(&self, id: &str, concrete: Concrete, shared: bool) {
        self.local.bind(id, concrete, shared)
    }

    fn alias(&self, id: &str, alias: &str) -> Result<(), ContainerError> {
        self.local.alias(id, alias)
    }

    fn extend(&self, id: &str, extender: Extender) -> Result<(), ContainerError> {
        self.local.extend_in(self, id, extender)
    }

    fn reflector(&self) -> Arc<dyn Reflector> {
        self.local.reflector()
    }

    fn config(&self) -> ContainerConfig {
        self.local.config()
    }
}
