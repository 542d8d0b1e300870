//! Type introspection used for reflective construction and injected calls.
//!
//! Rust has no runtime reflection, so every type a container should be able to build
//! on its own is described up front by a [TypeDescriptor] and handed to the container
//! through a [Reflector] - usually a [TypeRegistry].

use std::{any::type_name, collections::HashMap, fmt::Debug, sync::Arc};

use crate::{
    errors::ResolutionError,
    types::{type_key, DynError, Injectable, Instance},
};

/// Description of one constructor or method parameter
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    pub name: String,
    /// Identifier to resolve from the container when no value is supplied
    pub required_type: Option<String>,
    pub default: Option<Instance>,
}

impl ParameterInfo {
    /// A parameter without type and without default - it has to be supplied
    pub fn new(name: impl Into<String>) -> Self {
        ParameterInfo {
            name: name.into(),
            required_type: None,
            default: None,
        }
    }

    /// A parameter resolved from the container under `type_id`
    pub fn typed(name: impl Into<String>, type_id: impl Into<String>) -> Self {
        ParameterInfo {
            required_type: Some(type_id.into()),
            ..ParameterInfo::new(name)
        }
    }

    /// A parameter resolved from the container under the type name of `T`
    pub fn of<T: 'static + ?Sized>(name: impl Into<String>) -> Self {
        ParameterInfo::typed(name, type_key::<T>())
    }

    pub fn with_default<T: Injectable>(self, default: T) -> Self {
        self.with_default_instance(Instance::new(default))
    }

    pub fn with_default_instance(mut self, default: Instance) -> Self {
        self.default = Some(default);
        self
    }

    /// Defaults to [Instance::null]
    pub fn nullable(self) -> Self {
        self.with_default_instance(Instance::null())
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Ordered arguments handed to a factory or callable
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Instance>,
}

impl Arguments {
    pub fn new(values: Vec<Instance>) -> Self {
        Arguments { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.values.get(index)
    }

    /// Downcasts the argument at `index`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>, ResolutionError> {
        let instance = self.values.get(index).ok_or(ResolutionError::DowncastFailed {
            required_type: type_name::<T>(),
            actual_type: "<missing>",
        })?;
        instance
            .downcast()
            .map_err(|actual_type| ResolutionError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// Like [Arguments::get] but maps a missing or null argument to `None`
    pub fn optional<T: Injectable>(&self, index: usize) -> Result<Option<Arc<T>>, ResolutionError> {
        match self.values.get(index) {
            None => Ok(None),
            Some(instance) if instance.is_null() => Ok(None),
            Some(_) => self.get(index).map(Some),
        }
    }

    /// Downcasts and clones the argument at `index`
    pub fn value<T: Injectable + Clone>(&self, index: usize) -> Result<T, ResolutionError> {
        self.get::<T>(index).map(|value| (*value).clone())
    }

    /// Arguments from `index` on, used for trailing values of injected calls
    pub fn rest(&self, index: usize) -> &[Instance] {
        self.values.get(index..).unwrap_or(&[])
    }

    pub fn into_vec(self) -> Vec<Instance> {
        self.values
    }
}

type FactoryFn = Arc<dyn Fn(Arguments) -> Result<Instance, DynError> + Send + Sync>;
type FreeFn = Arc<dyn Fn(Arguments) -> Result<Instance, DynError> + Send + Sync>;
type BoundFn = Arc<dyn Fn(&Instance, Arguments) -> Result<Instance, DynError> + Send + Sync>;

#[derive(Clone)]
enum Invoke {
    /// Needs no receiver - free functions and static methods
    Free(FreeFn),
    /// Needs the instance it is called on
    Bound(BoundFn),
}

/// Anything the container can call with injected arguments
#[derive(Clone)]
pub struct Callable {
    name: String,
    parameters: Vec<ParameterInfo>,
    invoke: Invoke,
}
impl Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("static", &self.is_static())
            .finish()
    }
}

impl Callable {
    /// A free function or closure
    pub fn function<R, F>(name: impl Into<String>, parameters: Vec<ParameterInfo>, function: F) -> Self
    where
        R: Injectable,
        F: Fn(Arguments) -> Result<R, DynError> + Send + Sync + 'static,
    {
        Callable {
            name: name.into(),
            parameters,
            invoke: Invoke::Free(Arc::new(move |args| function(args).map(Instance::new))),
        }
    }

    /// A method called on an instance of `T`
    pub fn method<T, R, F>(name: impl Into<String>, parameters: Vec<ParameterInfo>, method: F) -> Self
    where
        T: Injectable,
        R: Injectable,
        F: Fn(&T, Arguments) -> Result<R, DynError> + Send + Sync + 'static,
    {
        let invoke = move |receiver: &Instance, args: Arguments| -> Result<Instance, DynError> {
            let receiver = receiver
                .downcast::<T>()
                .map_err(|actual_type| ResolutionError::DowncastFailed {
                    required_type: type_name::<T>(),
                    actual_type,
                })?;
            method(&receiver, args).map(Instance::new)
        };

        Callable {
            name: name.into(),
            parameters,
            invoke: Invoke::Bound(Arc::new(invoke)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    pub fn is_static(&self) -> bool {
        matches!(self.invoke, Invoke::Free(_))
    }

    /// Invokes the callable - a static callable ignores the receiver
    ///
    /// Returns `None` if an instance method is called without a receiver.
    pub fn invoke(
        &self,
        receiver: Option<&Instance>,
        args: Arguments,
    ) -> Option<Result<Instance, DynError>> {
        match (&self.invoke, receiver) {
            (Invoke::Free(function), _) => Some(function(args)),
            (Invoke::Bound(method), Some(receiver)) => Some(method(receiver, args)),
            (Invoke::Bound(_), None) => None,
        }
    }
}

/// Everything the container needs to know to build a type
#[derive(Clone)]
pub struct TypeDescriptor {
    type_id: String,
    instantiable: bool,
    parameters: Vec<ParameterInfo>,
    factory: Option<FactoryFn>,
    methods: HashMap<String, Callable>,
}
impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("TypeDescriptor")
            .field("type_id", &self.type_id)
            .field("instantiable", &self.instantiable)
            .field("parameters", &self.parameters)
            .field("methods", &methods)
            .finish()
    }
}

impl TypeDescriptor {
    /// Describes an instantiable type, `factory` receives the constructor arguments in declaration order
    pub fn new<T, F>(type_id: impl Into<String>, factory: F) -> Self
    where
        T: Injectable,
        F: Fn(Arguments) -> Result<T, DynError> + Send + Sync + 'static,
    {
        TypeDescriptor {
            type_id: type_id.into(),
            instantiable: true,
            parameters: Vec::new(),
            factory: Some(Arc::new(move |args| factory(args).map(Instance::new))),
            methods: HashMap::new(),
        }
    }

    /// Describes `T` under its type name
    pub fn of<T: Injectable>(
        factory: impl Fn(Arguments) -> Result<T, DynError> + Send + Sync + 'static,
    ) -> Self {
        TypeDescriptor::new(type_key::<T>(), factory)
    }

    /// Describes an interface or abstract type - known, but never built by reflection
    pub fn abstract_type(type_id: impl Into<String>) -> Self {
        TypeDescriptor {
            type_id: type_id.into(),
            instantiable: false,
            parameters: Vec::new(),
            factory: None,
            methods: HashMap::new(),
        }
    }

    /// Appends a constructor parameter
    pub fn param(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn method(mut self, method: Callable) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn is_instantiable(&self) -> bool {
        self.instantiable && self.factory.is_some()
    }

    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    pub fn get_method(&self, name: &str) -> Option<&Callable> {
        self.methods.get(name)
    }

    /// Builds an instance from positional constructor arguments
    pub fn instantiate(&self, args: Arguments) -> Result<Instance, ResolutionError> {
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| ResolutionError::NotInstantiable {
                type_id: self.type_id.clone(),
                building: Vec::new(),
            })?;

        factory(args)
            .map(|instance| instance.with_origin(&self.type_id))
            .map_err(|source| ResolutionError::Instantiation {
                type_id: self.type_id.clone(),
                source,
            })
    }
}

/// Supplies type descriptors to a container
pub trait Reflector: Send + Sync {
    /// Returns the descriptor for `type_id`, or `None` if the type is unknown
    fn describe(&self, type_id: &str) -> Option<Arc<TypeDescriptor>>;
}

/// Reflector backed by explicitly registered descriptors
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, descriptor: TypeDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Adds a descriptor, replacing an earlier one for the same type
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Option<Arc<TypeDescriptor>> {
        tracing::debug!("Registered type descriptor for {}", descriptor.type_id);
        self.types
            .insert(descriptor.type_id.clone(), Arc::new(descriptor))
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Reflector for TypeRegistry {
    fn describe(&self, type_id: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(type_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        start: i64,
        step: i64,
    }

    fn counter() -> TypeDescriptor {
        TypeDescriptor::new("Counter", |args| {
            Ok(Counter {
                start: args.value(0)?,
                step: args.value(1)?,
            })
        })
        .param(ParameterInfo::new("start").with_default(0_i64))
        .param(ParameterInfo::new("step").with_default(1_i64))
    }

    #[test]
    fn instantiate_passes_positional_arguments() {
        let instance = counter()
            .instantiate(Arguments::new(vec![Instance::new(3_i64), Instance::new(4_i64)]))
            .unwrap();

        let counter = instance.downcast::<Counter>().unwrap();
        assert_eq!((counter.start, counter.step), (3, 4));
        assert_eq!(instance.built_as(), Some("Counter"));
    }

    #[test]
    fn factory_failure_is_wrapped() {
        let error = counter().instantiate(Arguments::default()).unwrap_err();

        assert!(matches!(error, ResolutionError::Instantiation { type_id, .. } if type_id == "Counter"));
    }

    #[test]
    fn abstract_types_are_not_instantiable() {
        let descriptor = TypeDescriptor::abstract_type("Cache");

        assert!(!descriptor.is_instantiable());
        assert!(matches!(
            descriptor.instantiate(Arguments::default()),
            Err(ResolutionError::NotInstantiable { .. })
        ));
    }

    #[test]
    fn bound_method_needs_receiver() {
        let method = Callable::method("start", vec![], |counter: &Counter, _| Ok(counter.start));
        let receiver = Instance::new(Counter { start: 7, step: 1 });

        assert!(method.invoke(None, Arguments::default()).is_none());
        let result = method
            .invoke(Some(&receiver), Arguments::default())
            .unwrap()
            .unwrap();
        assert_eq!(*result.downcast::<i64>().unwrap(), 7);
    }

    #[test]
    fn registry_describes_registered_types_only() {
        let registry = TypeRegistry::new().register(counter());

        assert!(registry.describe("Counter").is_some());
        assert!(registry.describe("Missing").is_none());
    }

    #[test]
    fn optional_argument_maps_null_to_none() {
        let args = Arguments::new(vec![Instance::null(), Instance::new(2_i64)]);

        assert!(args.optional::<i64>(0).unwrap().is_none());
        assert_eq!(*args.optional::<i64>(1).unwrap().unwrap(), 2);
        assert!(args.optional::<i64>(2).unwrap().is_none());
    }
}
