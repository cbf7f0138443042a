//! Durable demo consumer
//!
//! Binary entry point; see the library crate for the service itself.

#[tokio::main]
async fn main() {
    core_config::tracing::install_color_eyre();

    if let Err(e) = demo_slow_consumer::run().await {
        let code = e.exit_code();
        eprintln!("Fatal error: {:?}", eyre::Report::new(e));
        std::process::exit(code);
    }
}
