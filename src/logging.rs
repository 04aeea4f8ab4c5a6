use tracing_subscriber::EnvFilter;

/// Initialise logging. When `debug` is set the level defaults to `debug`
/// and `RUST_LOG` may override it; otherwise `info` is forced so a stray
/// `RUST_LOG` in the environment cannot flood the terminal.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
