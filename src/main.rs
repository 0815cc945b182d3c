mod cli;

use crate::cli::{Args, Commands, Credentials};
use anyhow::{bail, Context, Result};
use clap::Parser;
use gamer_dl_lib::auth::{AuthService, AuthUser, FirebaseAuth};
use gamer_dl_lib::config::{AppConfig, API_KEY_ENV};
use gamer_dl_lib::downloader::{
    DownloadEngine, DownloadOutcome, DownloadService, FolderOpener, FormatChoice,
    SystemFolderOpener, ThumbnailLoader, VideoInfoService,
};
use gamer_dl_lib::session::{
    DownloadState, DownloaderSession, SessionEvent, SessionView, StatusKind,
};
use gamer_dl_lib::validators;
use gamer_dl_lib::ytdlp::YtDlpEngine;
use image::GenericImageView;
use indicatif::{ProgressBar, ProgressStyle};
use std::{io, path::Path, process, sync::Arc};
use tracing::{debug, error, warn, Level};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    let config = AppConfig::load(args.config.as_deref())?;
    debug!(cookies = %config.cookies_file.display(), "Loaded configuration");

    match args.command {
        Commands::Formats => {
            for choice in FormatChoice::ALL {
                println!("{:<14} {}", choice.label(), choice.selector());
            }
        }

        Commands::Login { credentials } => {
            let user = sign_in(&config, &credentials).await?;
            println!("✓ Signed in as {}", user.email);
        }

        Commands::Register { credentials } => {
            check_email(&credentials.email)?;
            let user = auth_service(&config)?
                .register(&credentials.email, &credentials.password)
                .await?;
            println!("✓ Account created for {}", user.email);
        }

        Commands::ResetPassword { email } => {
            check_email(&email)?;
            auth_service(&config)?.reset_password(&email).await?;
            println!("✓ Password reset e-mail sent to {}", email);
        }

        Commands::Info { url, credentials } => {
            sign_in(&config, &credentials).await?;
            validators::validate_url_or_err(&url)?;

            let service = VideoInfoService::new(engine(&config), config.cookies_file.clone());
            let info = service.get_video_info(&url).await?;

            println!("{}", info);
            if let Some(duration) = info.formatted_duration() {
                println!("⏱  {}", duration);
            }
            if let Some(thumb_url) = &info.thumbnail_url {
                let loader = ThumbnailLoader::new(config.thumbnail_timeout());
                match loader.load_thumbnail(thumb_url).await {
                    Some(image) => {
                        let (width, height) = image.dimensions();
                        println!("🖼  Thumbnail {}x{}", width, height);
                    }
                    None => println!("🖼  Thumbnail unavailable"),
                }
            }
        }

        Commands::Download {
            url,
            dest,
            format,
            title,
            no_open,
            credentials,
        } => {
            sign_in(&config, &credentials).await?;

            if FormatChoice::from_label(&format).is_none() {
                warn!(format = %format, "Unknown format label, using the default selector");
            }

            let engine = engine(&config);
            let opener: Arc<dyn FolderOpener> = if no_open {
                Arc::new(NoOpener)
            } else {
                Arc::new(SystemFolderOpener)
            };

            let mut session = DownloaderSession::new(
                Arc::new(DownloadService::new(engine.clone(), config.cookies_file.clone())),
                Arc::new(VideoInfoService::new(engine, config.cookies_file.clone())),
                ThumbnailLoader::new(config.thumbnail_timeout()),
                opener,
                TerminalView::new(),
            )
            .with_info_grace(config.thumbnail_timeout());

            let dest = dest.or_else(dirs::download_dir);
            if !session.start_download(&url, dest, &format, &title) {
                let reason = session.view().last_error.clone();
                bail!(reason.unwrap_or_else(|| "Download was not started".to_string()));
            }

            match session.wait().await {
                Some(DownloadOutcome::Succeeded) => {}
                Some(DownloadOutcome::Failed(message)) => bail!(message),
                None => bail!("Download worker stopped without a result"),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
}

fn engine(config: &AppConfig) -> Arc<dyn DownloadEngine> {
    Arc::new(YtDlpEngine::new(config.ytdlp_path.clone()))
}

fn auth_service(config: &AppConfig) -> Result<AuthService<FirebaseAuth>> {
    let provider = FirebaseAuth::new(&config.firebase).with_context(|| {
        format!(
            "set firebase.api_key in the config file or the {} environment variable",
            API_KEY_ENV
        )
    })?;
    Ok(AuthService::new(provider))
}

fn check_email(email: &str) -> Result<()> {
    if !validators::is_valid_email(email) {
        bail!("Invalid e-mail address: {}", email);
    }
    Ok(())
}

async fn sign_in(config: &AppConfig, credentials: &Credentials) -> Result<AuthUser> {
    check_email(&credentials.email)?;
    let user = auth_service(config)?
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(user)
}

/// Used with --no-open
struct NoOpener;

impl FolderOpener for NoOpener {
    fn open(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Renders a session on the terminal through an indicatif bar
struct TerminalView {
    bar: ProgressBar,
    last_error: Option<String>,
}

impl TerminalView {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {prefix} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        bar.set_style(style);

        Self {
            bar,
            last_error: None,
        }
    }
}

impl SessionView for TerminalView {
    fn render(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged(DownloadState::Succeeded) => self.bar.finish(),
            SessionEvent::StateChanged(DownloadState::Failed(_)) => self.bar.abandon(),
            SessionEvent::StateChanged(state) => debug!(?state, "Session state"),
            SessionEvent::Status {
                kind: StatusKind::Error,
                text,
            } => self.last_error = Some(text),
            SessionEvent::Status { text, .. } => self.bar.set_message(text),
            SessionEvent::Progress(progress) => {
                self.bar.set_position(progress.percent.clamp(0.0, 100.0) as u64);
                if let Some(speed) = progress.speed {
                    self.bar.set_prefix(speed);
                }
            }
            SessionEvent::VideoInfo(info) => {
                let line = match info.formatted_duration() {
                    Some(duration) => format!("{} ({})", info, duration),
                    None => info.to_string(),
                };
                self.bar.println(line);
            }
            SessionEvent::VideoInfoWarning(warning) => self.bar.println(warning),
            SessionEvent::Thumbnail(image) => {
                let (width, height) = image.dimensions();
                self.bar.println(format!("🖼  Thumbnail {}x{}", width, height));
            }
        }
    }
}
