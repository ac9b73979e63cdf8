use std::path::Path;

use classbuilder::{template, Builder, BuilderError, Value};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    if let Err(e) = run() {
        error!(error = %e, "demo failed");
        std::process::exit(1);
    }
}

// Builds a counter template, optionally seeded from a template file given as
// the first argument, and shows that two instances do not share state.
fn run() -> classbuilder::Result<()> {
    let mut builder = match std::env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading template");
            Builder::from_config(&template::from_file(Path::new(&path))?)?
        }
        None => Builder::new(),
    };
    if !builder.private().contains("counter") {
        builder.private_mut().insert("counter", 0);
    }
    builder.public_mut().insert_method("increment", |rx, _| {
        let n = rx.get("counter").expect_int()?;
        rx.set("counter", n + 1);
        Ok(Value::Undefined)
    });
    builder.public_mut().insert_method("getCounter", |rx, _| Ok(rx.get("counter")));

    let counter = builder.build();
    let a = counter.instantiate(&[])?;
    let b = counter.instantiate(&[])?;
    for _ in 0..3 {
        a.call("increment", &[])?;
    }
    info!(
        a = %a.call("getCounter", &[])?,
        b = %b.call("getCounter", &[])?,
        "counters"
    );
    for instance in [&a, &b] {
        let json = serde_json::to_string_pretty(instance)
            .map_err(|e| BuilderError::Execution(e.to_string()))?;
        println!("{}", json);
    }
    Ok(())
}
