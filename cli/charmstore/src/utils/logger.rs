use std::sync::OnceLock;

use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let log_filter = log_filter(verbosity.unwrap_or_default());

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    update_filters(filter_handle, log_filter);
}

fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,charmstore=error,charmstore_client=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,charmstore=warn,charmstore_client=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,charmstore=info,charmstore_client=info",
        // Also show debug from the client library
        Verbosity::Verbose(2) => "off,charmstore=debug,charmstore_client=debug",
        Verbosity::Verbose(3) => "off,charmstore=trace,charmstore_client=trace",
        // Also show the HTTP stack
        Verbosity::Verbose(4) => "debug,charmstore=trace,charmstore_client=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

/// `RUST_LOG` takes precedence over the verbosity derived filter.
fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

fn create_registry_and_filter_reload_handle() -> (
    impl tracing_subscriber::util::SubscriberInitExt,
    Handle<EnvFilter, Registry>,
) {
    // Start permissive, the actual filter is set right after by `update_filters`.
    let (filter, filter_reload_handle) =
        tracing_subscriber::reload::Layer::new(EnvFilter::new("trace"));
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(log_layer);

    (registry, filter_reload_handle)
}
