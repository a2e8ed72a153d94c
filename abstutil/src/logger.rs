/// Intercept messages using the `log` crate and print them to STDERR. The default level is
/// `info`; override with the usual `RUST_LOG` environment variable.
pub fn setup() {
    use env_logger::{Builder, Env};
    Builder::from_env(Env::default().default_filter_or("info")).init();
}
