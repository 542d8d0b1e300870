use std::{
    any::{Any, TypeId},
    fmt::Debug,
    sync::Arc,
};

/// All boxed causes must be shareable between threads
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Containers may be shared between threads
/// So anything stored in one needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// Stand-in value for a parameter whose default is "nothing"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Null;

/// A value held by, or produced by, a container
///
/// Cloning an instance clones the handle, not the value - use [Instance::ptr_eq] to check identity.
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
    /// Identifier of the type descriptor that built the value, if it was built by reflection
    origin: Option<Arc<str>>,
}
impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

impl Instance {
    pub fn new<ExistingInstance: Injectable>(instance: ExistingInstance) -> Self {
        Instance {
            info: TypeInfo::of::<ExistingInstance>(),
            instance: Arc::new(instance),
            origin: None,
        }
    }

    /// Wraps an already shared value without re-allocating it
    pub fn from_arc<ExistingInstance: Injectable>(instance: Arc<ExistingInstance>) -> Self {
        Instance {
            info: TypeInfo::of::<ExistingInstance>(),
            instance,
            origin: None,
        }
    }

    pub(crate) fn with_origin(mut self, type_id: &str) -> Self {
        self.origin = Some(Arc::from(type_id));
        self
    }

    /// Identifier of the type this value was constructed as
    pub fn built_as(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// The "no value" instance, used for nullable defaults
    pub fn null() -> Self {
        Instance::new(Null)
    }

    pub fn is_null(&self) -> bool {
        self.is::<Null>()
    }

    pub fn is<T: Injectable>(&self) -> bool {
        self.info.type_id == TypeId::of::<T>()
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// True if both handles point at the very same value
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.instance), Arc::as_ptr(&other.instance))
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// Identifier under which a Rust type is known to a container - its type name
pub fn type_key<T: 'static + ?Sized>() -> &'static str {
    std::any::type_name::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let a = Instance::new(String::from("a"));
        let b = a.clone();
        let c = Instance::new(String::from("a"));

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn downcast_reports_actual_type() {
        let instance = Instance::new(5_u32);

        assert_eq!(*instance.downcast::<u32>().unwrap(), 5);
        assert_eq!(instance.downcast::<String>().unwrap_err(), "u32");
    }

    #[test]
    fn null_is_recognised() {
        assert!(Instance::null().is_null());
        assert!(!Instance::new(0_i64).is_null());
    }
}
