//! Test types and the registry describing them
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use rstest::fixture;
use strata_di::{Callable, Container, ParameterInfo, TypeDescriptor, TypeRegistry};

#[derive(Debug)]
pub struct Counter {
    pub start: i64,
    pub step: i64,
}

#[derive(Debug)]
pub struct Filesystem {
    pub root: String,
    pub kind: String,
    pub options: Vec<String>,
}
impl Filesystem {
    pub fn new(root: &str, kind: &str) -> Self {
        Filesystem {
            root: root.to_string(),
            kind: kind.to_string(),
            options: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct FilesystemDecorator {
    pub filesystem: Arc<Filesystem>,
}

#[derive(Debug)]
pub struct Cache {
    pub filesystem: Arc<Filesystem>,
    pub options: Arc<HashMap<String, String>>,
}

/// Implementation bound to the abstract "Store"
#[derive(Debug)]
pub struct MemoryStore;

/// Needs a "Store", with no fallback
#[derive(Debug)]
pub struct Repository {
    pub store: Arc<MemoryStore>,
}

/// Works with or without a "Store"
#[derive(Debug)]
pub struct Report {
    pub store: Option<Arc<MemoryStore>>,
}

#[derive(Debug)]
pub struct Chicken;
#[derive(Debug)]
pub struct Egg;

/// Service whose methods check what was injected into them
#[derive(Debug)]
pub struct Witness {
    pub label: String,
}

/// Result of a witness method: `challenge + 1` and whether the injected witness is the receiver
pub type Checked = (i64, bool);

pub fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .register(
            TypeDescriptor::new("Counter", |args| {
                Ok(Counter {
                    start: args.value(0)?,
                    step: args.value(1)?,
                })
            })
            .param(ParameterInfo::new("start").with_default(0_i64))
            .param(ParameterInfo::new("step").with_default(1_i64)),
        )
        .register(
            TypeDescriptor::new("Filesystem", |args| {
                Ok(Filesystem {
                    root: args.value(0)?,
                    kind: args.value(1)?,
                    options: args.value(2)?,
                })
            })
            .param(ParameterInfo::new("root"))
            .param(ParameterInfo::new("kind").with_default("local".to_string()))
            .param(ParameterInfo::new("options").with_default(Vec::<String>::new())),
        )
        .register(
            TypeDescriptor::new("FilesystemDecorator", |args| {
                Ok(FilesystemDecorator {
                    filesystem: args.get(0)?,
                })
            })
            .param(ParameterInfo::typed("filesystem", "Filesystem")),
        )
        .register(
            TypeDescriptor::new("Cache", |args| {
                Ok(Cache {
                    filesystem: args.get(0)?,
                    options: args.get(1)?,
                })
            })
            .param(ParameterInfo::typed("filesystem", "Filesystem"))
            .param(ParameterInfo::new("options")),
        )
        .register(TypeDescriptor::abstract_type("Store"))
        .register(TypeDescriptor::abstract_type("Queue"))
        .register(
            TypeDescriptor::new("MemoryStore", |_| Ok(MemoryStore))
                .method(Callable::method("size", vec![], |_: &MemoryStore, _| Ok(0_usize))),
        )
        .register(
            TypeDescriptor::new("Repository", |args| Ok(Repository { store: args.get(0)? }))
                .param(ParameterInfo::typed("store", "Store")),
        )
        .register(
            TypeDescriptor::new("Report", |args| {
                Ok(Report {
                    store: args.optional(0)?,
                })
            })
            .param(ParameterInfo::typed("store", "Store").nullable()),
        )
        .register(
            TypeDescriptor::new("Chicken", |_| Ok(Chicken)).param(ParameterInfo::typed("egg", "Egg")),
        )
        .register(
            TypeDescriptor::new("Egg", |_| Ok(Egg)).param(ParameterInfo::typed("chicken", "Chicken")),
        )
        .register(witness_type())
}

fn witness_type() -> TypeDescriptor {
    let checked_params = || {
        vec![
            ParameterInfo::typed("witness", "Witness"),
            ParameterInfo::new("challenge"),
        ]
    };

    TypeDescriptor::new("Witness", |_| {
        Ok(Witness {
            label: "constructed".to_string(),
        })
    })
    .method(Callable::method("check", checked_params(), |receiver: &Witness, args| {
        let injected = args.get::<Witness>(0)?;
        let challenge: i64 = args.value(1)?;
        Ok::<Checked, _>((challenge + 1, std::ptr::eq(receiver, Arc::as_ptr(&injected))))
    }))
    .method(Callable::function("check_statically", checked_params(), |args| {
        let injected = args.get::<Witness>(0)?;
        let challenge: i64 = args.value(1)?;
        Ok::<Checked, _>((challenge + 1, !injected.label.is_empty()))
    }))
    .method(Callable::method("handle", vec![], |receiver: &Witness, _| {
        Ok(receiver.label.clone())
    }))
    .method(Callable::method("fail", vec![], |_: &Witness, _| {
        Err::<(), _>("witness failed".into())
    }))
}

#[fixture]
pub fn container() -> Container {
    Container::with_reflector(registry())
}

/// Shared call counter for resolvers and extenders
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);
impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
