/// Installs the global tracing subscriber.
///
/// `RUST_LOG` selects the filter (default `macroledger=debug`);
/// `LOG_FORMAT=json` switches to JSON lines. Meant to be called once by the
/// host application; a second call returns an error.
pub fn init_tracing() -> anyhow::Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "macroledger=debug".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    let result = if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).try_init()
    };
    result.map_err(|e| anyhow::anyhow!("tracing subscriber already set: {e}"))
}
