use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
/// Returns false if a subscriber was already set.
pub fn init() -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("xplorer_shell_lib=info"));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if installed {
        std::panic::set_hook(Box::new(|panic_info| {
            tracing::error!(panic = %panic_info, "panic");
        }));
    }
    installed
}
