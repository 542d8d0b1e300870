mod support;

use rstest::rstest;
use strata_di::{
    Concrete, Container, ContainerError, Instance, Resolution, ResolutionError, Resolver,
    ServiceContainer, ServiceContainerExt,
};
use support::{container, Calls, Filesystem, FilesystemDecorator, MemoryStore};

#[rstest]
fn resolves_services_bound_to_resolver(container: Container) {
    assert!(!container.has("fs"));

    container.bind_fn("fs", |_| Ok(Filesystem::new("/", "local")));

    assert!(container.has("fs"));
    assert_eq!(container.resolve_as::<Filesystem>("fs").unwrap().kind, "local");
}

#[rstest]
fn calls_resolver_on_every_resolve(container: Container) {
    let calls = Calls::default();
    let counted = calls.clone();
    container.bind_fn("fs", move |_| {
        counted.hit();
        Ok(Filesystem::new("/", "local"))
    });
    assert_eq!(calls.count(), 0);

    let first = container.resolve("fs").unwrap();
    let second = container.resolve("fs").unwrap();

    assert!(!first.ptr_eq(&second));
    assert_eq!(calls.count(), 2);
    assert!(!container.is_shared("fs"));
}

#[rstest]
fn singleton_resolver_runs_once(container: Container) {
    let calls = Calls::default();
    let counted = calls.clone();
    container.singleton_fn("fs", move |_| {
        counted.hit();
        Ok(Filesystem::new("/", "local"))
    });
    assert_eq!(calls.count(), 0);

    let first = container.resolve("fs").unwrap();
    let second = container.resolve("fs").unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(calls.count(), 1);
    assert!(container.is_shared("fs"));
}

#[rstest]
fn tracks_bound_and_resolved(container: Container) {
    assert!(!container.is_bound("now"));
    assert!(!container.is_resolved("now"));

    container.bind_fn("now", |_| Ok(std::time::Instant::now()));
    assert!(container.is_bound("now"));
    assert!(!container.is_resolved("now"));

    container.resolve("now").unwrap();
    assert!(container.is_resolved("now"));
}

#[rstest]
fn resolver_sees_the_container(container: Container) {
    container.set_value("root", "/srv".to_string());
    container.bind_fn("fs", |c| {
        let root = c.require::<String>("root")?;
        Ok(Filesystem::new(&root, "local"))
    });

    assert_eq!(container.resolve_as::<Filesystem>("fs").unwrap().root, "/srv");
}

#[rstest]
fn resolver_may_redirect(container: Container) {
    container.bind_resolver("Store", Resolver::redirect("MemoryStore"));

    assert!(container.resolve_as::<MemoryStore>("Store").is_ok());
}

#[rstest]
fn binds_abstract_type_to_implementation(container: Container) {
    container.bind("Store", Concrete::Type("MemoryStore".to_string()), true);

    let first = container.resolve("Store").unwrap();
    let second = container.resolve("Store").unwrap();

    assert!(first.is::<MemoryStore>());
    assert!(first.ptr_eq(&second));
}

#[rstest]
fn type_bound_to_itself_is_constructed(container: Container) {
    container.set_value("Filesystem", Filesystem::new("/", "local"));
    container.bind("FilesystemDecorator", Concrete::Type("FilesystemDecorator".to_string()), true);

    let decorator = container.resolve_as::<FilesystemDecorator>("FilesystemDecorator").unwrap();

    assert_eq!(decorator.filesystem.root, "/");
}

#[rstest]
fn rebinding_drops_cached_instance(container: Container) {
    container.singleton_fn("name", |_| Ok("first".to_string()));
    assert_eq!(*container.require::<String>("name").unwrap(), "first");

    container.singleton_fn("name", |_| Ok("second".to_string()));

    assert_eq!(*container.require::<String>("name").unwrap(), "second");
}

#[rstest]
fn resolver_failure_propagates(container: Container) {
    container.bind_resolver(
        "db",
        Resolver::new(|_| Err::<Resolution, _>(ContainerError::failed("db", "connection refused"))),
    );

    let error = container.get("db").unwrap_err();

    assert_eq!(error.to_string(), "Resolving [db] failed: connection refused");
    assert!(!container.is_resolved("db"));
}

#[rstest]
fn resolver_may_return_instances(container: Container) {
    let shared = Instance::new(7_u64);
    let returned = shared.clone();
    container.bind_resolver("seven", Resolver::new(move |_| Ok(returned.clone())));

    assert!(container.get("seven").unwrap().ptr_eq(&shared));
}

#[rstest]
fn redirect_loop_exceeds_depth() {
    let container = Container::with_config(
        std::sync::Arc::new(support::registry()),
        strata_di::ContainerConfig::default().with_max_build_depth(8),
    );
    container.bind("a", Concrete::Type("b".to_string()), false);
    container.bind("b", Concrete::Type("a".to_string()), false);

    let error = container.resolve("a").unwrap_err();

    assert!(matches!(
        error,
        ContainerError::Resolution(ResolutionError::DepthExceeded { max_depth: 8, .. })
    ));
}

#[rstest]
fn self_resolving_resolver_exceeds_depth() {
    let container = Container::with_config(
        std::sync::Arc::new(support::registry()),
        strata_di::ContainerConfig::default().with_max_build_depth(16),
    );
    container.bind_fn("a", |c| c.resolve("a").map(|_| 1_u8));

    let error = container.resolve("a").unwrap_err();

    assert!(matches!(
        error,
        ContainerError::Resolution(ResolutionError::DepthExceeded { max_depth: 16, .. })
    ));
}

#[rstest]
fn self_resolving_extender_exceeds_depth() {
    let container = Container::with_config(
        std::sync::Arc::new(support::registry()),
        strata_di::ContainerConfig::default().with_max_build_depth(16),
    );
    container.bind_fn("a", |_| Ok(1_u8));
    container
        .extend("a", strata_di::Extender::new(|_, c| c.resolve("a")))
        .unwrap();

    let error = container.resolve("a").unwrap_err();

    assert!(matches!(
        error,
        ContainerError::Resolution(ResolutionError::DepthExceeded { .. })
    ));
}
