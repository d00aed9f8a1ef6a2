use rust_quantized_mnist::runtime_interface;

fn main() {
    // Renders both native tracing events and `log` records from the library.
    tracing_subscriber::fmt::init();

    if let Err(e) = runtime_interface::run_cli() {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
