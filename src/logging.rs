//! Logging setup. Call [`init`] once from `main` before spawning any task.

/// Initialize the global logger. Safe to call more than once; subsequent
/// calls are no-ops (matches `env_logger`'s own idempotence).
pub fn init() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .is_test(false)
        .try_init();
}
