mod custom_component_tests;
mod level_tests;

/// Route `log` output through the test harness when RUST_LOG is set.
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
