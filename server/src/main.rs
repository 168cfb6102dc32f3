use {
    crate::{
        metrics::{
            is_metrics,
            MetricsLayer,
        },
        server::start_server,
    },
    anyhow::Result,
    clap::Parser,
    std::io::IsTerminal,
    tracing_subscriber::{
        filter::{
            filter_fn,
            LevelFilter,
        },
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
        Layer,
    },
};

mod api;
mod auction;
mod config;
mod kernel;
mod metrics;
mod models;
mod notification;
mod server;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize a Tracing Subscriber
    let is_terminal = std::io::stderr().is_terminal();
    let registry = tracing_subscriber::registry().with(MetricsLayer.with_filter(filter_fn(is_metrics)));
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_ansi(is_terminal);

    // Use the compact formatter if we're in a terminal, otherwise use the JSON formatter.
    if is_terminal {
        registry.with(fmt_layer.compact().with_filter(env_filter)).init();
    } else {
        registry.with(fmt_layer.json().with_filter(env_filter)).init();
    }

    // Parse the command line arguments with clap, will exit automatically on `--help` or
    // with invalid arguments.
    match config::Options::parse() {
        config::Options::Run(opts) => start_server(opts).await,
    }
}
