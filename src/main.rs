use billboard_editor::AppConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up logging for development
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!("Serving assets from {}", config.public_dir.display());

    // Background work (image loads, uploads, exports) runs on this runtime
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    billboard_editor::run_app(config)?;
    Ok(())
}
