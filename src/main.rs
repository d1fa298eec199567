fn main() {
    if let Err(err) = questmap_renderer::run() {
        tracing::error!(error = %err, "qmap failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
