use anyhow::Context;
use futures::StreamExt;
use statehouse::{LoggingInterceptor, PrintInterceptor, Store, StoreRegistry};
use statehouse_config::StoreConfig;

mod counter;
mod logger;

use counter::{CounterState, FETCH, INCREMENT};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = StoreConfig::load();
    logger::init(&config);

    log::info!("Starting statehouse-demo");

    let mut store = Store::with_config(CounterState::default(), config.clone())
        .with_reducer(counter::reducer())
        .with_interceptor(PrintInterceptor::stdout());

    // Interceptors execute in registration order
    if config.log_actions {
        store.register_interceptor(LoggingInterceptor::from_config(&config));
    }
    store
        .register_effects(counter::effects)
        .context("Failed to register counter effects")?;

    let running = store.spawn().context("Failed to start store")?;
    let mut registry = StoreRegistry::new();
    registry.register(running.handle().clone());

    // Any part of the app can now look the store up by its types
    let handle = registry
        .get::<CounterState, statehouse::AnonymousAction>()
        .context("Counter store not registered")?;

    let status = counter::status(&counter::double_counter());
    let mut statuses = handle.select(&status);
    if let Some(line) = statuses.next().await {
        println!("{}", line);
    }

    handle.dispatch(INCREMENT.create_with(5));
    handle.dispatch(INCREMENT.create_with(3));
    handle.dispatch(FETCH.create());

    // Fetch completes once the counter has been added twice
    while let Some(line) = statuses.next().await {
        println!("{}", line);
        if handle.project(|state| state.fetched.is_some()) {
            break;
        }
    }

    let store = running.stop().await.context("Failed to stop store")?;
    log::info!("Final counter: {}", store.state().counter);

    Ok(())
}
