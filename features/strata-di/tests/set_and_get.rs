mod support;

use rstest::rstest;
use strata_di::{Container, ContainerError, ResolutionError, ServiceContainer, ServiceContainerExt};
use support::{container, Filesystem};

#[rstest]
fn set_registers_service(container: Container) {
    assert!(!container.has("test"));

    container.set_value("test", Filesystem::new("/", "local"));

    assert!(container.has("test"));
    assert!(container.is_bound("test"));
}

#[rstest]
fn get_returns_the_set_instance(container: Container) {
    let filesystem = strata_di::Instance::new(Filesystem::new("/tmp", "local"));
    container.set("test", filesystem.clone());

    let first = container.get("test").unwrap();
    let second = container.resolve("test").unwrap();

    assert!(first.ptr_eq(&filesystem));
    assert!(second.ptr_eq(&filesystem));
    assert_eq!(container.require::<Filesystem>("test").unwrap().root, "/tmp");
}

#[rstest]
fn get_unknown_binding_is_not_found(container: Container) {
    let error = container.get("unicorn").unwrap_err();

    assert!(error.is_not_found());
    assert_eq!(error.to_string(), "Requested [unicorn] binding cannot be found.");
}

#[rstest]
fn resolve_unknown_binding_fails_to_resolve(container: Container) {
    let error = container.resolve("unicorn").unwrap_err();

    assert!(matches!(
        error,
        ContainerError::Resolution(ResolutionError::UnknownType(id)) if id == "unicorn"
    ));
}

#[rstest]
fn set_replaces_alias_of_same_name(container: Container) {
    container.set_value("original", 1_u8);
    container.alias("original", "copy").unwrap();
    assert_eq!(*container.require::<u8>("copy").unwrap(), 1);

    container.set_value("copy", 2_u8);

    assert_eq!(*container.require::<u8>("copy").unwrap(), 2);
    assert_eq!(*container.require::<u8>("original").unwrap(), 1);
}

#[rstest]
fn require_reports_wrong_type(container: Container) {
    container.set_value("number", 5_u32);

    let error = container.require::<String>("number").unwrap_err();

    assert!(matches!(
        error,
        ContainerError::Resolution(ResolutionError::DowncastFailed { actual_type: "u32", .. })
    ));
}

#[test]
fn clones_share_state() {
    let container = Container::new();
    let clone = container.clone();

    clone.set_value("shared", "yes".to_string());

    assert!(container.has("shared"));
}
