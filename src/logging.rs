use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Initialize structured JSON logging for binaries and services.
///
/// Filtering comes from `LONGFORM_LOG`, defaulting to `error`. Safe to call
/// more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::builder()
        .with_env_var("LONGFORM_LOG")
        .with_default_directive(LevelFilter::ERROR.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
