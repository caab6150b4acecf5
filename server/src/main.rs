use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use file_preview::auth::{Authenticator, NoAuth, ProxyAuth};
use file_preview::files::LocalResolver;
use file_preview::http::{self, AppState};
use file_preview::img::ImageResizer;
use file_preview::preview::PreviewHandler;
use file_preview::{cache, PreviewSettings, User};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "preview_server")]
#[command(about = "Serves thumbnails and previews of stored images", long_about = None)]
struct Cli {
    /// Directory holding the stored files
    #[arg(short, long, default_value = "./storage")]
    root: PathBuf,

    #[arg(short, long, default_value = "127.0.0.1")]
    address: IpAddr,

    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Preview cache directory, defaults to the user cache dir
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Keep previews in memory instead of on disk
    #[arg(long, value_name = "ENTRIES")]
    memory_cache: Option<usize>,

    #[arg(long)]
    disable_thumbnails: bool,

    #[arg(long)]
    disable_resize_preview: bool,

    /// Sniff file contents when the extension does not reveal the type
    #[arg(long)]
    type_detection_by_header: bool,

    #[arg(long, default_value_t = 4)]
    image_processors: usize,

    #[arg(long, default_value_t = 4)]
    store_workers: usize,

    #[arg(long, default_value_t = 256)]
    store_queue: usize,

    /// Take the username from this header, set by a trusted proxy
    #[arg(long)]
    auth_header: Option<String>,
}

impl Cli {
    fn settings(&self) -> PreviewSettings {
        let mut settings = PreviewSettings::default()
            .with_thumbnails(!self.disable_thumbnails)
            .with_resize_preview(!self.disable_resize_preview)
            .with_header_detection(self.type_detection_by_header)
            .with_store_pool(self.store_workers, self.store_queue);
        settings.image_processors = self.image_processors;

        if let Some(entries) = self.memory_cache {
            settings = settings.with_cache_dir(None).with_memory_cache(entries);
        } else if let Some(dir) = &self.cache_dir {
            settings = settings.with_cache_dir(Some(dir.clone()));
        }
        settings
    }
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = cli.settings();
    info!(root = %cli.root.display(), ?settings, "starting preview server");

    let cache = cache::from_settings(&settings).await?;
    let handler = Arc::new(PreviewHandler::new(
        Arc::new(LocalResolver::new(&cli.root)),
        Arc::new(ImageResizer::new(settings.image_processors)),
        cache,
        &settings,
    ));

    let auth: Arc<dyn Authenticator> = match &cli.auth_header {
        Some(header) => Arc::new(ProxyAuth::new(header.clone(), User::new("proxy"))),
        None => Arc::new(NoAuth::new(User::new("admin"))),
    };

    let figment = rocket::Config::figment()
        .merge(("address", cli.address))
        .merge(("port", cli.port));
    let state = AppState {
        handler: Arc::clone(&handler),
        auth,
    };
    let rocket = http::mount(rocket::custom(figment), state).launch().await?;
    drop(rocket);

    match Arc::try_unwrap(handler) {
        Ok(handler) => handler.shutdown().await,
        Err(_) => warn!("preview handler still in use, pending cache writes abandoned"),
    }
    Ok(())
}
