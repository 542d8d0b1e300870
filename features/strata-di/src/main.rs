use std::sync::Arc;

use strata_di::{
    Callable, CallTarget, ContainerBuilder, ContainerError, LayeredContainer, ParameterInfo,
    Parameters, ServiceContainer, ServiceContainerExt, TypeDescriptor,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), ContainerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let app = ContainerBuilder::new()
        .add_type(
            TypeDescriptor::new("Mailer", |args| {
                Ok(Mailer {
                    transport: args.get(0)?,
                    sender: args.value(1)?,
                })
            })
            .param(ParameterInfo::typed("transport", "Transport"))
            .param(ParameterInfo::new("sender").with_default("noreply@example.com".to_string()))
            .method(Callable::method("send", vec![ParameterInfo::new("to")], |mailer: &Mailer, args| {
                let to: String = args.value(0)?;
                Ok(mailer.send(&to))
            })),
        )
        .add_singleton("Transport", |_| Ok(Transport("smtp".to_string())))
        .add_alias("Mailer", "mailer")
        .build()?;

    println!("{:?}", app);
    let mailer = app.resolve_as::<Mailer>("mailer")?;
    println!("{}", mailer.send("ops@example.com"));

    // Tests swap the transport on a layer, the app keeps its own
    let test_layer = LayeredContainer::new(app.clone());
    test_layer.singleton_fn("Transport", |_| Ok(Transport("memory".to_string())));

    let sent = test_layer.call(
        &CallTarget::parse("Mailer@send"),
        &Parameters::new().named("to", "qa@example.com".to_string()),
        None,
    )?;
    println!("{}", sent.downcast::<String>().map_err(|actual| ContainerError::failed("Mailer@send", actual))?);

    let sent = app.call(
        &"Mailer@send".into(),
        &Parameters::new().named("to", "dev@example.com".to_string()),
        None,
    )?;
    println!("{:?}", sent.downcast::<String>());

    Ok(())
}

#[derive(Debug)]
struct Transport(String);

#[derive(Debug)]
struct Mailer {
    transport: Arc<Transport>,
    sender: String,
}
impl Mailer {
    fn send(&self, to: &str) -> String {
        format!("{} -> {} via {}", self.sender, to, self.transport.0)
    }
}
