use thiserror::Error;

use crate::types::DynError;

/// Errors returned by any container operation
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Nothing is registered for the identifier
    #[error("Requested [{0}] binding cannot be found.")]
    BindingNotFound(String),
    /// Something is registered, or reflection was attempted, but producing the value failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl ContainerError {
    /// Wraps an arbitrary failure of a resolver or extender for `id`
    pub fn failed(id: impl Into<String>, error: impl Into<DynError>) -> Self {
        ResolutionError::Failed {
            id: id.into(),
            source: error.into(),
        }
        .into()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::BindingNotFound(_))
    }

    pub fn as_resolution(&self) -> Option<&ResolutionError> {
        match self {
            ContainerError::Resolution(error) => Some(error),
            ContainerError::BindingNotFound(_) => None,
        }
    }
}

/// Errors while producing a value
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The reflector has no descriptor for the type
    #[error("Target [{0}] class cannot be found.")]
    UnknownType(String),

    /// Abstract type without a binding
    #[error("Target [{type_id}] is not instantiable{}.", while_building(.building))]
    NotInstantiable {
        type_id: String,
        building: Vec<String>,
    },

    /// A parameter without a type, value or default
    #[error("Unresolvable dependency resolving [{parameter}] in class {declared_in}")]
    UnresolvableParameter {
        parameter: String,
        declared_in: String,
    },

    #[error("Positional parameter #{index} is out of range for [{type_id}]")]
    UnexpectedPositional { type_id: String, index: usize },

    #[error("[{0}] is aliased to itself.")]
    AliasedToItself(String),

    #[error("Circular dependency on [{type_id}] through {}", chain_path(.chain))]
    CircularDependency { type_id: String, chain: Vec<String> },

    #[error("Resolving [{id}] exceeded the maximum build depth of {max_depth}")]
    DepthExceeded { id: String, max_depth: usize },

    #[error("Method not provided for [{0}].")]
    MethodNotProvided(String),

    #[error("Method [{type_id}::{method}] does not exist.")]
    UnknownMethod { type_id: String, method: String },

    #[error("Method [{type_id}::{method}] needs an instance and cannot be called statically.")]
    NotStatic { type_id: String, method: String },

    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },

    /// The type's factory returned an error
    #[error("Failed to instantiate [{type_id}]: {source}")]
    Instantiation {
        type_id: String,
        #[source]
        source: DynError,
    },

    /// The called function returned an error
    #[error("Call to [{target}] failed: {source}")]
    Invocation {
        target: String,
        #[source]
        source: DynError,
    },

    /// A resolver or extender reported a failure of its own
    #[error("Resolving [{id}] failed: {source}")]
    Failed {
        id: String,
        #[source]
        source: DynError,
    },
}

fn while_building(building: &[String]) -> String {
    if building.is_empty() {
        String::new()
    } else {
        format!(" while building [{}]", building.join(", "))
    }
}

fn chain_path(chain: &[String]) -> String {
    chain.join(" -> ")
}
