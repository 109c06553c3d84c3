use tracing::debug;
use tracing_subscriber::filter::LevelFilter;

/// Installs the stderr subscriber; `level` is `off`, `error` … `trace`
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = level.parse::<LevelFilter>()?;

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install logger: {e}"))?;

    debug!(level, "logging initialized");
    Ok(())
}

#[cfg(test)]
pub fn init_for_tests() {
    use std::sync::Once;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(LevelFilter::DEBUG)
            .with_test_writer() // sends logs to captured test output
            .try_init();
    });
}
