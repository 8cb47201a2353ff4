#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    countrysign::wasm::mount();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    preview::run()
}

/// Headless preview: plays a seeded run of picks and writes the photo panel
/// and highlight map as PNG files.
#[cfg(not(target_arch = "wasm32"))]
mod preview {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::process::ExitCode;

    use clap::Parser;
    use countrysign::{
        AppConfig, Dataset, PhotoView, SessionState, demo_dataset, demo_photo, photo_view, screen,
        session_map,
    };
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tracing_subscriber::EnvFilter;

    #[derive(Debug, Parser)]
    #[command(name = "countrysign", about = "Render the country-sign quiz without a browser")]
    struct Args {
        /// JSON config file; missing keys keep their defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        /// City table (CSV). Overrides the config.
        #[arg(long)]
        cities: Option<PathBuf>,
        /// Boundary file (GeoJSON). Overrides the config.
        #[arg(long)]
        regions: Option<PathBuf>,
        /// Photo directory. Overrides the config.
        #[arg(long)]
        photos: Option<String>,
        /// Directory the PNG files are written to.
        #[arg(long, default_value = "out")]
        out: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
        /// Number of "next city" presses to simulate.
        #[arg(long, default_value_t = 1)]
        picks: usize,
        /// Reveal the last pick.
        #[arg(long)]
        reveal: bool,
        /// Use the built-in demo cities and photos instead of files.
        #[arg(long)]
        demo: bool,
    }

    #[derive(Debug, thiserror::Error)]
    enum PreviewError {
        #[error(transparent)]
        Config(#[from] countrysign::ConfigError),
        #[error(transparent)]
        Load(#[from] countrysign::LoadError),
        #[error(transparent)]
        Session(#[from] countrysign::SessionError),
        #[error(transparent)]
        Image(#[from] countrysign::ImageLoadError),
        #[error(transparent)]
        Map(#[from] countrysign::MapError),
        #[error("failed to write {path}: {source}")]
        Write {
            path: String,
            source: std::io::Error,
        },
    }

    pub fn run() -> ExitCode {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(true)
            .init();

        match execute(Args::parse()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                tracing::error!(%error, "preview failed");
                ExitCode::FAILURE
            }
        }
    }

    fn execute(args: Args) -> Result<(), PreviewError> {
        let mut config = match &args.config {
            Some(path) => AppConfig::from_path(path)?,
            None => AppConfig::default(),
        };
        if let Some(photos) = &args.photos {
            config.photo_dir = photos.clone();
        }

        let dataset = if args.demo {
            demo_dataset()
        } else {
            let cities = args
                .cities
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.city_table));
            let regions = args
                .regions
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.region_geometry));
            Dataset::load(cities, regions, &config)?
        };

        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut session = SessionState::new();
        for _ in 0..args.picks {
            let number = session.pick_next(&mut rng, dataset.catalog())?;
            tracing::debug!(number, "picked");
        }
        if args.reveal {
            session.reveal()?;
        }

        fs::create_dir_all(&args.out).map_err(|source| PreviewError::Write {
            path: args.out.display().to_string(),
            source,
        })?;

        let view_model = screen(&dataset, &session);
        let Some(card) = view_model.card else {
            tracing::info!("no city selected; nothing to render");
            return Ok(());
        };

        println!("{:03} {} ({:?})", card.number, card.name, view_model.phase);
        println!("特産品: {}", card.specialties.join(", "));
        println!("紹介: {}", card.info);
        println!("{}", card.figures);
        if !view_model.trail.is_empty() {
            println!("履歴: {}", view_model.trail);
        }

        let photo = if args.demo {
            Some(countrysign::mask::encode_png(&demo_photo(card.number))?)
        } else {
            read_photo(Path::new(&config.photo_path(card.number)))
        };
        let photo_config = if args.demo {
            AppConfig {
                photo_extension: "png".to_string(),
                ..config.clone()
            }
        } else {
            config.clone()
        };

        match photo_view(photo.as_deref(), card.number, session.is_revealed(), &photo_config)? {
            PhotoView::NotFound { path } => tracing::warn!(%path, "画像が見つかりません"),
            PhotoView::Masked(png) => write(&args.out.join("photo.png"), &png)?,
            PhotoView::Full { bytes, .. } => write(
                &args.out.join(format!("photo.{}", photo_config.photo_extension)),
                &bytes,
            )?,
        }

        if let Some(render) = session_map(&dataset, &session, &config.map)? {
            write(&args.out.join("map.png"), &render.encode_png()?)?;
        }

        Ok(())
    }

    fn read_photo(path: &Path) -> Option<Vec<u8>> {
        match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "photo not readable");
                None
            }
        }
    }

    fn write(path: &Path, bytes: &[u8]) -> Result<(), PreviewError> {
        fs::write(path, bytes).map_err(|source| PreviewError::Write {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "written");
        Ok(())
    }

}
