use tracing_subscriber::EnvFilter;

/// Install the global subscriber for a binary.
///
/// `RUST_LOG` takes precedence; without it everything at `info` and above is
/// printed. Logs go to stderr so reports on stdout stay machine-readable.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
