pub mod script;
pub mod session;

pub use script::{Edit, EditScript};
pub use session::{TestSession, sample_labels, split_fixture, tiered_labels};

/// Install a fmt subscriber filtered by `RUST_LOG`. Safe to call from every
/// test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
