use tracing_subscriber::EnvFilter;

use crate::config::Config;

const DEFAULT_DIRECTIVES: &str = "ofgdb=debug,ofgdb_executor=debug,ofgdb_storage=debug";

/// Install a stderr subscriber when `config.debug` is set. `RUST_LOG`
/// overrides the default directives. Returns false when debug logging is
/// off or another subscriber is already installed.
pub fn init_from_config(config: &Config) -> bool {
    if !config.debug {
        return false;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
