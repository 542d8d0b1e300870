use crate::{reflection::Callable, types::Instance};

/// Something [crate::contract::ServiceContainer::call] can invoke
#[derive(Debug, Clone)]
pub enum CallTarget {
    /// A free function or closure
    Function(Callable),
    /// `Type@method` - the type is resolved from the container and the method called on it
    Method {
        type_id: String,
        /// `None` falls back to the default method passed to `call`
        method: Option<String>,
    },
    /// `Type::method` - a method that needs no instance
    Static { type_id: String, method: String },
    /// A method on an instance the caller already holds
    Bound {
        instance: Instance,
        type_id: String,
        method: String,
    },
}

impl CallTarget {
    pub fn method(type_id: impl Into<String>, method: impl Into<String>) -> Self {
        CallTarget::Method {
            type_id: type_id.into(),
            method: Some(method.into()),
        }
    }

    pub fn static_method(type_id: impl Into<String>, method: impl Into<String>) -> Self {
        CallTarget::Static {
            type_id: type_id.into(),
            method: method.into(),
        }
    }

    pub fn bound(instance: Instance, type_id: impl Into<String>, method: impl Into<String>) -> Self {
        CallTarget::Bound {
            instance,
            type_id: type_id.into(),
            method: method.into(),
        }
    }

    /// Parses `Type@method`, `Type::method` or a bare `Type`
    ///
    /// A bare type becomes a [CallTarget::Method] without method name. For `::` the last
    /// segment is the method, so paths like `app::Mailer::send` keep their module prefix.
    pub fn parse(target: &str) -> Self {
        if let Some((type_id, method)) = target.split_once('@') {
            return CallTarget::method(type_id, method);
        }
        if let Some((type_id, method)) = target.rsplit_once("::") {
            return CallTarget::static_method(type_id, method);
        }

        CallTarget::Method {
            type_id: target.to_string(),
            method: None,
        }
    }

    /// Readable name for error messages
    pub fn describe(&self) -> String {
        match self {
            CallTarget::Function(callable) => callable.name().to_string(),
            CallTarget::Method {
                type_id,
                method: Some(method),
            } => format!("{type_id}@{method}"),
            CallTarget::Method {
                type_id,
                method: None,
            } => type_id.clone(),
            CallTarget::Static { type_id, method } => format!("{type_id}::{method}"),
            CallTarget::Bound {
                type_id, method, ..
            } => format!("{type_id}@{method}"),
        }
    }
}

impl From<Callable> for CallTarget {
    fn from(callable: Callable) -> Self {
        CallTarget::Function(callable)
    }
}

impl From<&str> for CallTarget {
    fn from(target: &str) -> Self {
        CallTarget::parse(target)
    }
}
