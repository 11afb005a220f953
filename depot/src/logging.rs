//! provides logging helpers

use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// initiate the global tracing subscriber
///
/// `level` takes precedence over `RUST_LOG` when given. Output goes to
/// stderr so command results on stdout stay clean.
pub fn init(level: Option<&str>) {
    let builder =
        filter::EnvFilter::builder().with_default_directive(filter::LevelFilter::INFO.into());
    let env_filter = match level {
        Some(directives) => builder.parse_lossy(directives),
        None => builder.from_env_lossy(),
    };

    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter);

    registry().with(fmt_layer).init();
}
