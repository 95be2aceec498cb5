use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reel_cli::render;
use reel_cli::session::Session;
use reel_cli::settings::{Overrides, Settings};
use reel_core::{
    GenerationRequest, GenerationStatus, Msg, ProfileLink, VideoMode, VideoRef, VoiceFilter,
};
use reel_engine::{
    ensure_dir, EngineConfig, EngineHandle, FileStore, KeyValueStore, ProfileLinks,
    ReqwestBackend,
};
use reel_logging::{reel_info, reel_warn};

/// Margin on top of the backend's own timeouts before the CLI stops waiting.
const WAIT_MARGIN: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "reel")]
#[command(version, about = "Turn a creator's top video into an avatar video", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file in RON format
    #[arg(long, env = "REEL_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the wizard backend
    #[arg(long, env = "REEL_SERVER")]
    server: Option<String>,

    /// Directory for saved links and cached video lists
    #[arg(long, env = "REEL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log destination (terminal, file, both, off)
    #[arg(long, env = "REEL_LOG")]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage saved profile links
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },
    /// List a profile's most viewed videos
    Videos {
        /// Profile link, or the position of a saved link
        link: String,
        /// List short videos instead of regular ones
        #[arg(long)]
        shorts: bool,
        /// Reveal this many more batches after the first one
        #[arg(long, default_value_t = 0)]
        more: usize,
        /// Print the reference of the video at this position (1-based)
        #[arg(long)]
        select: Option<usize>,
    },
    /// Print the transcript of a video (YouTube id or Instagram URL)
    Transcript { video: String },
    /// Write alternative scripts from a video's transcript
    Scenarios { video: String },
    /// List usable avatars
    Avatars,
    /// List usable voices
    Voices {
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        gender: Option<String>,
    },
    /// Render an avatar video and wait for it
    Generate {
        #[arg(long, conflicts_with = "text_file", required_unless_present = "text_file")]
        text: Option<String>,
        #[arg(long)]
        text_file: Option<PathBuf>,
        #[arg(long)]
        avatar: String,
        #[arg(long)]
        voice: String,
        /// Stop waiting after this many seconds; the job keeps running server-side
        #[arg(long)]
        wait: Option<u64>,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Save a profile link
    Add { url: String },
    /// Show saved profile links
    List,
    /// Forget the saved link at a position
    Remove { index: usize },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?.with_overrides(Overrides {
        server: cli.server,
        data_dir: cli.data_dir,
        log: cli.log,
    });
    ensure_dir(&settings.data_dir)
        .with_context(|| format!("cannot use data dir {}", settings.data_dir.display()))?;
    reel_logging::initialize(
        settings.log_destination()?,
        settings.log_level()?,
        &settings.log_file(),
    );
    reel_info!(
        "reel v{} with backend {}",
        env!("CARGO_PKG_VERSION"),
        settings.server
    );

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(settings.data_dir.clone()));

    match cli.command {
        Commands::Links { action } => run_links(store, action),
        Commands::Videos {
            link,
            shorts,
            more,
            select,
        } => run_videos(&settings, store, &link, VideoMode::from_shorts(shorts), more, select),
        Commands::Transcript { video } => {
            let video = parse_video(&video)?;
            let backend = ReqwestBackend::new(settings.backend())?;
            let transcript = block_on(backend.transcript(&video))??;
            println!("{transcript}");
            Ok(())
        }
        Commands::Scenarios { video } => {
            let video = parse_video(&video)?;
            let backend = ReqwestBackend::new(settings.backend())?;
            let scenarios = block_on(async {
                let transcript = backend.transcript(&video).await?;
                backend.generate_scenarios(&transcript).await
            })??;
            print!("{}", render::scenarios(&scenarios));
            Ok(())
        }
        Commands::Avatars => {
            let backend = ReqwestBackend::new(settings.backend())?;
            let avatars = block_on(backend.avatars())??;
            print!("{}", render::avatars(&avatars));
            Ok(())
        }
        Commands::Voices { language, gender } => {
            let backend = ReqwestBackend::new(settings.backend())?;
            let voices = block_on(backend.voices())??;
            let filter = VoiceFilter { language, gender };
            print!("{}", render::voices(&filter.apply(&voices)));
            Ok(())
        }
        Commands::Generate {
            text,
            text_file,
            avatar,
            voice,
            wait,
        } => {
            let text = match (text, text_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("cannot read {}", path.display()))?,
                (None, None) => bail!("either --text or --text-file is required"),
            };
            let request = GenerationRequest::new(text, avatar, voice);
            run_generate(&settings, store, request, wait.map(Duration::from_secs))
        }
    }
}

fn run_links(store: Arc<dyn KeyValueStore>, action: LinkAction) -> Result<()> {
    let links = ProfileLinks::new(store);
    match action {
        LinkAction::Add { url } => {
            let link = links.add(&url)?;
            println!("Saved {}", link.url());
        }
        LinkAction::List => print!("{}", render::links(&links.list()?)),
        LinkAction::Remove { index } => {
            let removed = links.remove(index)?;
            println!("Removed {removed}");
        }
    }
    Ok(())
}

fn run_videos(
    settings: &Settings,
    store: Arc<dyn KeyValueStore>,
    link: &str,
    mode: VideoMode,
    more: usize,
    select: Option<usize>,
) -> Result<()> {
    let link = match link.parse::<usize>() {
        Ok(index) => ProfileLinks::new(store.clone()).get(index)?.url().to_string(),
        Err(_) => link.to_string(),
    };

    // A single-video link needs no list.
    if let Some(video_id) = ProfileLink::parse(&link).and_then(|link| link.watch_video_id()) {
        println!("{link} is a single video; its reference is {video_id}");
        return Ok(());
    }

    let engine = start_engine(settings, store)?;
    let mut session = Session::new(engine);
    let limit = settings.backend().request_timeout + WAIT_MARGIN;

    session.dispatch(Msg::ProfileOpened { link, mode });
    let mut view = session.run_until(limit, |view| !view.loading)?;
    for _ in 0..more {
        if !view.can_show_more {
            break;
        }
        session.dispatch(Msg::ShowMoreClicked);
        view = session.run_until(limit, |view| !view.loading)?;
    }

    print!("{}", render::video_list(&view));

    if let Some(position) = select {
        session.dispatch(Msg::VideoSelected(position.saturating_sub(1)));
        match session.view().selected {
            Some(video) => println!("Selected {}", video_reference(&video)),
            None => bail!("no visible video at position {position}"),
        }
    }
    if view.last_error.is_some() && view.rows.is_empty() {
        bail!("no videos could be loaded");
    }
    Ok(())
}

fn run_generate(
    settings: &Settings,
    store: Arc<dyn KeyValueStore>,
    request: GenerationRequest,
    wait: Option<Duration>,
) -> Result<()> {
    let engine = start_engine(settings, store)?;
    let mut session = Session::new(engine);
    let limit = wait.unwrap_or(settings.poll().timeout + WAIT_MARGIN);

    session.dispatch(Msg::GenerateClicked(request));
    let status = match session.run_until(limit, |view| !view.generation.is_in_flight()) {
        Ok(view) => view.generation,
        Err(err) => {
            let job = session.view().generation;
            reel_warn!("Stopped waiting: {}", err);
            session.dispatch(Msg::CancelGenerationClicked);
            if let GenerationStatus::Waiting { job_id } = job {
                bail!("stopped waiting for job {job_id}; it may still finish on the server");
            }
            return Err(err);
        }
    };

    println!("{}", render::generation(&status));
    match status {
        GenerationStatus::Ready { .. } => Ok(()),
        _ => bail!("no video was produced"),
    }
}

fn start_engine(settings: &Settings, store: Arc<dyn KeyValueStore>) -> Result<EngineHandle> {
    let config = EngineConfig {
        backend: settings.backend(),
        poll: settings.poll(),
        cache: settings.cache()?,
        store,
        clock: None,
    };
    Ok(EngineHandle::new(config)?)
}

fn parse_video(raw: &str) -> Result<VideoRef> {
    VideoRef::parse(raw).with_context(|| format!("'{raw}' is neither a video id nor a video link"))
}

fn video_reference(video: &VideoRef) -> &str {
    match video {
        VideoRef::YouTube { video_id } => video_id.as_str(),
        VideoRef::Instagram { url } => url.as_str(),
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
