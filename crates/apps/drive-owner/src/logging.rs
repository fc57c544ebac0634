use log::error;
use std::fmt::Debug;

/// Initialize env_logger; RUST_LOG takes precedence over `default_filter`
pub fn init(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

pub fn log_and_return_error<T>(error: T) -> T
where
    T: Debug,
{
    error!("{error:?}");
    error
}
