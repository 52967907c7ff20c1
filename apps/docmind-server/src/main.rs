use std::sync::Arc;

use docmind_core::config::Config;
use docmind_server::AppState;
use docmind_service::DocumentService;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = config.settings()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Blocking HTTP clients must be built and dropped outside the async runtime,
    // so the service is created here and outlives `runtime`.
    let service = Arc::new(DocumentService::from_config(&settings)?);
    let state = Arc::new(AppState::new(Arc::clone(&service), settings.server));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(docmind_server::serve(state))?;
    drop(runtime);
    Ok(())
}
