use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use yi_dashcam::{Capture, ClientSettings, Connection, FileManagement, Mode, YiDashcam};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut settings = ClientSettings::default();
    if let Some(host) = args.get(1) {
        settings = settings.with_host(host.as_str());
    }

    let cam = YiDashcam::with_settings(settings)?;
    cam.connect(Mode::Photo).await?;

    println!("Taking photo...");
    cam.take_photo().await?;

    let Some(photo) = cam.latest_photo().await? else {
        println!("No photo found on the card.");
        cam.disconnect().await?;
        return Ok(());
    };
    println!("Downloading {} ({} bytes)...", photo.name, photo.size);

    let mut stream = cam.file((&photo).into()).await?;
    let mut file = File::create(&photo.name).await?;
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    println!("Saved to {}", photo.name);

    cam.disconnect().await?;
    Ok(())
}
