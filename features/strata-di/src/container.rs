use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};

use crate::{
    binding::{Binding, Concrete, Extender, Resolution},
    build_stack::BuildStack,
    call::CallTarget,
    config::ContainerConfig,
    contract::ServiceContainer,
    errors::{ContainerError, ResolutionError},
    parameters::Parameters,
    reflection::{Arguments, Callable, ParameterInfo, Reflector, TypeDescriptor, TypeRegistry},
    types::Instance,
};

/// Container holding bindings, instances, aliases and extenders of one scope
///
/// Cloning is cheap - clones share the same state, so a binding added through
/// one clone is visible through all others.
#[derive(Clone)]
pub struct Container(pub Arc<ContainerInner>);
pub struct ContainerInner {
    state: RwLock<ContainerState>,
    reflector: Arc<dyn Reflector>,
    config: ContainerConfig,
}

#[derive(Default)]
struct ContainerState {
    bindings: HashMap<String, Binding>,
    instances: HashMap<String, Instance>,
    /// alias -> target
    aliases: HashMap<String, String>,
    extenders: HashMap<String, Vec<Extender>>,
    resolved: HashSet<String>,
}

/// Outcome of looking an identifier up, taken while holding the read lock
enum Lookup {
    Alias(String),
    Instance(Instance),
    Build {
        concrete: Concrete,
        extenders: Vec<Extender>,
    },
}

impl ContainerState {
    fn has(&self, id: &str) -> bool {
        self.bindings.contains_key(id) || self.instances.contains_key(id) || self.is_alias(id)
    }

    fn is_alias(&self, id: &str) -> bool {
        self.aliases.contains_key(id)
    }

    /// Follows the alias chain starting at `id` to its final target
    fn canonical(&self, id: &str) -> Result<String, ResolutionError> {
        let mut visited = vec![id];
        let mut current = id;
        while let Some(target) = self.aliases.get(current) {
            if visited.contains(&target.as_str()) {
                return Err(ResolutionError::AliasedToItself(target.clone()));
            }
            visited.push(target.as_str());
            current = target.as_str();
        }
        Ok(current.to_string())
    }

    /// `id` followed by every identifier it is aliased or type bound to, in lookup order
    fn targets(&self, id: &str) -> Vec<String> {
        let mut targets = vec![id.to_string()];
        let mut current = id;
        loop {
            let next = match (self.aliases.get(current), self.bindings.get(current)) {
                (Some(target), _) => target,
                (
                    None,
                    Some(Binding {
                        concrete: Concrete::Type(target),
                        ..
                    }),
                ) => target,
                _ => break,
            };
            if targets.contains(next) {
                break;
            }
            targets.push(next.clone());
            current = next.as_str();
        }
        targets
    }

    fn is_shared(&self, id: &str) -> bool {
        self.instances.contains_key(id)
            || self.bindings.get(id).is_some_and(|binding| binding.shared)
    }

    /// Drops the instance and alias a new binding would shadow
    fn drop_stale_instances(&mut self, id: &str) {
        self.instances.remove(id);
        self.aliases.remove(id);
    }

    fn lookup(&self, id: &str) -> Result<Lookup, ResolutionError> {
        let target = self.canonical(id)?;
        if target != id {
            return Ok(Lookup::Alias(target));
        }

        if let Some(instance) = self.instances.get(id) {
            return Ok(Lookup::Instance(instance.clone()));
        }

        let concrete = match self.bindings.get(id) {
            // A type bound to itself is built like an unbound one
            Some(Binding {
                concrete: Concrete::Type(target),
                ..
            }) if target == id => Concrete::Reflect,
            Some(binding) => binding.concrete.clone(),
            None => Concrete::Reflect,
        };

        Ok(Lookup::Build {
            concrete,
            extenders: self.extenders.get(id).cloned().unwrap_or_default(),
        })
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.0.state.read();
        let mut entries: Vec<(&String, String)> = Vec::new();
        for (id, binding) in &state.bindings {
            let kind = if binding.shared { "shared" } else { "binding" };
            entries.push((id, kind.to_string()));
        }
        for id in state.instances.keys() {
            if !state.bindings.contains_key(id) {
                entries.push((id, "instance".to_string()));
            }
        }
        for (alias, target) in &state.aliases {
            entries.push((alias, format!("alias of {target}")));
        }
        entries.sort();

        let mut map = f.debug_struct("Container");
        for (id, kind) in &entries {
            map.field(id, kind);
        }
        map.finish()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Empty container without any known types
    pub fn new() -> Self {
        Container::with_reflector(TypeRegistry::new())
    }

    pub fn with_reflector(reflector: impl Reflector + 'static) -> Self {
        Container::with_config(Arc::new(reflector), ContainerConfig::default())
    }

    pub fn with_config(reflector: Arc<dyn Reflector>, config: ContainerConfig) -> Self {
        Container(Arc::new(ContainerInner {
            state: RwLock::new(ContainerState::default()),
            reflector,
            config,
        }))
    }

    /// True if `id` has a binding, instance or alias on this container
    pub fn is_bound(&self, id: &str) -> bool {
        self.0.state.read().has(id)
    }

    /// True once `id`, or the target it is aliased to, was resolved or holds an instance
    pub fn is_resolved(&self, id: &str) -> bool {
        let state = self.0.state.read();
        match state.canonical(id) {
            Ok(target) => state.resolved.contains(&target) || state.instances.contains_key(&target),
            Err(_) => false,
        }
    }

    /// True if resolving `id` returns the same value every time
    pub fn is_shared(&self, id: &str) -> bool {
        let state = self.0.state.read();
        match state.canonical(id) {
            Ok(target) => state.is_shared(&target),
            Err(_) => false,
        }
    }

    /// Resolves `id` with `scope` as the container nested lookups go through
    pub(crate) fn resolve_in(
        &self,
        scope: &dyn ServiceContainer,
        id: &str,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError> {
        let mut stack = stack.descend(id, self.0.config.max_build_depth)?;

        let lookup = self.0.state.read().lookup(id)?;
        let (concrete, extenders) = match lookup {
            Lookup::Alias(target) => {
                tracing::trace!("Resolving alias {} as {}", id, target);
                return scope.resolve_scoped(&target, parameters, &mut stack);
            }
            Lookup::Instance(instance) => {
                tracing::trace!("Returning cached instance of {}", id);
                return Ok(instance);
            }
            Lookup::Build {
                concrete,
                extenders,
            } => (concrete, extenders),
        };

        let mut object = match concrete {
            Concrete::Reflect => self.construct_in(scope, id, parameters, &mut stack)?,
            Concrete::Type(target) => scope.resolve_scoped(&target, parameters, &mut stack)?,
            Concrete::Resolver(resolver) => {
                let resolution = resolver.resolve(&ResolutionScope::new(scope, &mut stack))?;
                match resolution {
                    Resolution::Instance(instance) => instance,
                    Resolution::Redirect(target) => {
                        scope.resolve_scoped(&target, parameters, &mut stack)?
                    }
                }
            }
        };

        for extender in &extenders {
            object = extender.apply(object, &ResolutionScope::new(scope, &mut stack))?;
        }

        let mut state = self.0.state.write();
        if state.is_shared(id) {
            state.instances.insert(id.to_string(), object.clone());
        }
        state.resolved.insert(id.to_string());

        Ok(object)
    }

    /// Builds `type_id` from its descriptor, resolving parameters through `scope`
    pub(crate) fn construct_in(
        &self,
        scope: &dyn ServiceContainer,
        type_id: &str,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError> {
        let descriptor = self
            .0
            .reflector
            .describe(type_id)
            .ok_or_else(|| ResolutionError::UnknownType(type_id.to_string()))?;

        if !descriptor.is_instantiable() {
            return Err(ResolutionError::NotInstantiable {
                type_id: type_id.to_string(),
                building: stack.building().to_vec(),
            }
            .into());
        }

        let mut stack = stack.push(type_id)?;
        tracing::debug!("Constructing {}", type_id);

        if descriptor.parameters().is_empty() {
            return Ok(descriptor.instantiate(Arguments::default())?);
        }

        let supplied = parameters
            .clone()
            .key_by_name(descriptor.parameters().iter().map(|p| p.name.as_str()))
            .map_err(|index| ResolutionError::UnexpectedPositional {
                type_id: type_id.to_string(),
                index,
            })?;

        let mut args = Vec::with_capacity(descriptor.parameters().len());
        for parameter in descriptor.parameters() {
            let value = match supplied.get(&parameter.name) {
                Some(value) => value.clone(),
                None => self.resolve_parameter(scope, type_id, parameter, &mut stack)?,
            };
            args.push(value);
        }

        let instance = descriptor.instantiate(Arguments::new(args))?;
        tracing::debug!("Constructed instance of {}", instance.info.type_name);
        Ok(instance)
    }

    /// Fills a parameter no value was supplied for
    fn resolve_parameter(
        &self,
        scope: &dyn ServiceContainer,
        declared_in: &str,
        parameter: &ParameterInfo,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError> {
        let Some(required_type) = &parameter.required_type else {
            return parameter.default.clone().ok_or_else(|| {
                ResolutionError::UnresolvableParameter {
                    parameter: parameter.name.clone(),
                    declared_in: declared_in.to_string(),
                }
                .into()
            });
        };

        match scope.resolve_scoped(required_type, &Parameters::new(), stack) {
            Ok(instance) => Ok(instance),
            // Optional dependencies fall back to their default
            Err(ContainerError::Resolution(error)) => match &parameter.default {
                Some(default) => {
                    tracing::debug!(
                        "Using default for {} of {} - {}",
                        parameter.name,
                        declared_in,
                        error
                    );
                    Ok(default.clone())
                }
                None => Err(error.into()),
            },
            Err(error) => Err(error),
        }
    }

    /// Calls `target` with `scope` supplying its dependencies
    pub(crate) fn call_in(
        &self,
        scope: &dyn ServiceContainer,
        target: &CallTarget,
        parameters: &Parameters,
        default_method: Option<&str>,
    ) -> Result<Instance, ContainerError> {
        let mut stack = BuildStack::new();
        let name = target.describe();

        match target {
            CallTarget::Function(callable) => {
                self.invoke(scope, &name, callable, None, parameters, &mut stack)
            }
            CallTarget::Method { type_id, method } => {
                let method = method
                    .as_deref()
                    .or(default_method)
                    .ok_or_else(|| ResolutionError::MethodNotProvided(type_id.clone()))?;

                if !scope.has(type_id) && scope.reflector().describe(type_id).is_none() {
                    return Err(ContainerError::BindingNotFound(type_id.clone()));
                }

                let instance = scope.resolve_scoped(type_id, &Parameters::new(), &mut stack)?;
                let callable = self.receiver_method(scope, type_id, &instance, method)?;
                self.invoke(
                    scope,
                    &format!("{type_id}@{method}"),
                    &callable,
                    Some(&instance),
                    parameters,
                    &mut stack,
                )
            }
            CallTarget::Static { type_id, method } => {
                let descriptor = scope
                    .reflector()
                    .describe(type_id)
                    .ok_or_else(|| ContainerError::BindingNotFound(type_id.clone()))?;
                let callable = find_method(&descriptor, type_id, method)?;
                if !callable.is_static() {
                    return Err(ResolutionError::NotStatic {
                        type_id: type_id.clone(),
                        method: method.clone(),
                    }
                    .into());
                }
                self.invoke(scope, &name, callable, None, parameters, &mut stack)
            }
            CallTarget::Bound {
                instance,
                type_id,
                method,
            } => {
                let callable = self.receiver_method(scope, type_id, instance, method)?;
                self.invoke(scope, &name, &callable, Some(instance), parameters, &mut stack)
            }
        }
    }

    /// Finds `method` for a receiver resolved as `type_id`
    ///
    /// Looks at the descriptor of `type_id`, then of everything it is aliased or type bound to,
    /// then of the type that built the receiver and finally of its Rust type name. Interfaces
    /// bound to an implementation thereby dispatch to the implementation's methods.
    fn receiver_method(
        &self,
        scope: &dyn ServiceContainer,
        type_id: &str,
        instance: &Instance,
        method: &str,
    ) -> Result<Callable, ResolutionError> {
        let mut candidates = self.0.state.read().targets(type_id);
        candidates.extend(instance.built_as().map(str::to_string));
        candidates.push(instance.info.type_name.to_string());

        let reflector = scope.reflector();
        let mut described = false;
        for candidate in &candidates {
            let Some(descriptor) = reflector.describe(candidate) else {
                continue;
            };
            described = true;
            if let Some(callable) = descriptor.get_method(method) {
                return Ok(callable.clone());
            }
        }

        if described {
            Err(ResolutionError::UnknownMethod {
                type_id: type_id.to_string(),
                method: method.to_string(),
            })
        } else {
            Err(ResolutionError::UnknownType(type_id.to_string()))
        }
    }

    fn invoke(
        &self,
        scope: &dyn ServiceContainer,
        name: &str,
        callable: &Callable,
        receiver: Option<&Instance>,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError> {
        let mut remaining = parameters.clone();
        let mut args = Vec::with_capacity(callable.parameters().len() + remaining.len());
        for parameter in callable.parameters() {
            let value = match remaining.take(&parameter.name) {
                Some(value) => value,
                None => self.resolve_parameter(scope, name, parameter, stack)?,
            };
            args.push(value);
        }
        // Whatever was not consumed by name trails the declared parameters
        args.extend(remaining.into_values());

        tracing::debug!("Calling {}", name);
        match callable.invoke(receiver, Arguments::new(args)) {
            Some(Ok(result)) => Ok(result),
            Some(Err(source)) => Err(ResolutionError::Invocation {
                target: name.to_string(),
                source,
            }
            .into()),
            None => Err(ResolutionError::NotStatic {
                type_id: name.to_string(),
                method: callable.name().to_string(),
            }
            .into()),
        }
    }

    pub(crate) fn extend_in(
        &self,
        scope: &dyn ServiceContainer,
        id: &str,
        extender: Extender,
    ) -> Result<(), ContainerError> {
        let id = self.0.state.read().canonical(id)?;
        let existing = self.0.state.read().instances.get(&id).cloned();

        match existing {
            Some(instance) => {
                tracing::debug!("Extending instance of {}", id);
                let extended = extender.apply(instance, scope)?;
                self.0.state.write().instances.insert(id, extended);
            }
            None => {
                tracing::debug!("Queued extender for {}", id);
                self.0
                    .state
                    .write()
                    .extenders
                    .entry(id)
                    .or_default()
                    .push(extender);
            }
        }

        Ok(())
    }
}

fn find_method<'a>(
    descriptor: &'a TypeDescriptor,
    type_id: &str,
    method: &str,
) -> Result<&'a Callable, ResolutionError> {
    descriptor
        .get_method(method)
        .ok_or_else(|| ResolutionError::UnknownMethod {
            type_id: type_id.to_string(),
            method: method.to_string(),
        })
}

impl ServiceContainer for Container {
    fn has(&self, id: &str) -> bool {
        self.is_bound(id)
    }

    fn resolve_scoped(
        &self,
        id: &str,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError> {
        self.resolve_in(self, id, parameters, stack)
    }

    fn construct_scoped(
        &self,
        type_id: &str,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError> {
        self.construct_in(self, type_id, parameters, stack)
    }

    fn call(
        &self,
        target: &CallTarget,
        parameters: &Parameters,
        default_method: Option<&str>,
    ) -> Result<Instance, ContainerError> {
        self.call_in(self, target, parameters, default_method)
    }

    fn set(&self, id: &str, instance: Instance) {
        tracing::debug!("Set instance of {} as {}", instance.info.type_name, id);
        let mut state = self.0.state.write();
        state.aliases.remove(id);
        state.instances.insert(id.to_string(), instance);
    }

    fn bind(&self, id: &str, concrete: Concrete, shared: bool) {
        tracing::debug!("Bound {} (shared: {})", id, shared);
        let mut state = self.0.state.write();
        state.drop_stale_instances(id);
        state
            .bindings
            .insert(id.to_string(), Binding { concrete, shared });
    }

    fn alias(&self, id: &str, alias: &str) -> Result<(), ContainerError> {
        let mut state = self.0.state.write();

        // The new alias must not be reachable from its own target
        let mut current = id;
        loop {
            if current == alias {
                return Err(ResolutionError::AliasedToItself(alias.to_string()).into());
            }
            match state.aliases.get(current) {
                Some(next) => current = next.as_str(),
                None => break,
            }
        }

        tracing::debug!("Aliased {} as {}", id, alias);
        state.aliases.insert(alias.to_string(), id.to_string());
        Ok(())
    }

    fn extend(&self, id: &str, extender: Extender) -> Result<(), ContainerError> {
        self.extend_in(self, id, extender)
    }

    fn reflector(&self) -> Arc<dyn Reflector> {
        self.0.reflector.clone()
    }

    fn config(&self) -> ContainerConfig {
        self.0.config
    }
}

/// The container handed to resolvers and extenders while a resolution is in progress
///
/// Resolutions started through it continue the ongoing [BuildStack], so depth limits and
/// cycle detection see through resolver callbacks and errors keep the full build trail.
/// Calls start a fresh stack, like calls on the container itself.
struct ResolutionScope<'a> {
    scope: &'a dyn ServiceContainer,
    stack: Mutex<&'a mut BuildStack>,
}

impl<'a> ResolutionScope<'a> {
    fn new(scope: &'a dyn ServiceContainer, stack: &'a mut BuildStack) -> Self {
        ResolutionScope {
            scope,
            stack: Mutex::new(stack),
        }
    }
}

impl ServiceContainer for ResolutionScope<'_> {
    fn has(&self, id: &str) -> bool {
        self.scope.has(id)
    }

    fn resolve_with(&self, id: &str, parameters: &Parameters) -> Result<Instance, ContainerError> {
        let mut stack = self.stack.lock();
        self.scope.resolve_scoped(id, parameters, &mut **stack)
    }

    fn resolve_scoped(
        &self,
        id: &str,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError> {
        self.scope.resolve_scoped(id, parameters, stack)
    }

    fn construct(&self, type_id: &str, parameters: &Parameters) -> Result<Instance, ContainerError> {
        let mut stack = self.stack.lock();
        self.scope.construct_scoped(type_id, parameters, &mut **stack)
    }

    fn construct_scoped(
        &self,
        type_id: &str,
        parameters: &Parameters,
        stack: &mut BuildStack,
    ) -> Result<Instance, ContainerError> {
        self.scope.construct_scoped(type_id, parameters, stack)
    }

    fn call(
        &self,
        target: &CallTarget,
        parameters: &Parameters,
        default_method: Option<&str>,
    ) -> Result<Instance, ContainerError> {
        self.scope.call(target, parameters, default_method)
    }

    fn set(&self, id: &str, instance: Instance) {
        self.scope.set(id, instance)
    }

    fn bind(&self, id: &str, concrete: Concrete, shared: bool) {
        self.scope.bind(id, concrete, shared)
    }

    fn alias(&self, id: &str, alias: &str) -> Result<(), ContainerError> {
        self.scope.alias(id, alias)
    }

    fn extend(&self, id: &str, extender: Extender) -> Result<(), ContainerError> {
        self.scope.extend(id, extender)
    }

    fn reflector(&self) -> Arc<dyn Reflector> {
        self.scope.reflector()
    }

    fn config(&self) -> ContainerConfig {
        self.scope.config()
    }
}
