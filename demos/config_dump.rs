use yi_dashcam::{ClientSettings, Configuration, Connection, DeviceInfo, Mode, YiDashcam};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut settings = ClientSettings::default();
    if let Some(host) = args.get(1) {
        settings = settings.with_host(host.as_str());
    }
    println!("Usage: {} [IP] (default {})", args[0], settings.host);

    let cam = YiDashcam::with_settings(settings)?;

    println!("Connecting to {}...", cam.host());
    cam.connect(Mode::Video).await?;

    println!("\n--- Device ---");
    match cam.firmware_version().await {
        Ok(version) => println!("Firmware: {}", version),
        Err(e) => eprintln!("Error getting firmware version: {}", e),
    }
    match cam.card_info().await {
        Ok(card) => println!("{:#?}", card),
        Err(e) => eprintln!("Error getting card info: {}", e),
    }

    println!("\n--- Configuration ---");
    let config = cam.get_config().await?;
    for (option, value) in config.iter() {
        let writable = if option.is_writable() { "" } else { " (read-only)" };
        println!("{:<18} {}{}", option.as_ref(), value, writable);
    }
    println!("\n{}", serde_json::to_string_pretty(&config)?);

    cam.disconnect().await?;
    println!("\nDisconnected.");
    Ok(())
}
