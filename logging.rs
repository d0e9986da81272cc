/// Installs the process-wide logger. `RUST_LOG` overrides the default `info`
/// filter. Safe to call more than once.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
