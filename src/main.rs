use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use video_review::review::SESSION_TITLE;
use video_review::{
    AnnotationStore, Config, ConsolePlayer, HttpExtractionClient, PreviewRegistry,
    ReviewController, UploadOrchestrator, UploadStatus, VideoFile,
};

const HELP: &str = "Commands:
  chapters        list chapters
  seek <n>        jump to chapter n (1-based)
  status          show upload status
  review          open the flashcard review
  flip            show the other side of the card
  next | prev     move between cards
  close           close the review
  upload <path>   upload another video
  help            show this help
  quit            exit";

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Video Review")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Chapter timeline and flashcard review for uploaded videos")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("VIDEO")
                .help("Video file to review")
                .required(true)
        )
        .arg(
            Arg::new("endpoint")
                .short('e')
                .long("endpoint")
                .value_name("URL")
                .help("Extraction service upload URL")
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
        )
        .get_matches();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };
    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        config.extraction.endpoint = endpoint.clone();
    }

    // Initialize logging
    let filter = if matches.get_flag("verbose") {
        "video_review=debug,info".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    config.validate()?;
    info!("{}", config.summary());

    let file = matches
        .get_one::<String>("file")
        .ok_or_else(|| anyhow!("--file is required"))?;
    let detect = config.player.detect_duration;
    let video = select_video(file, detect).await?;

    let previews = PreviewRegistry::new();
    let client = Arc::new(HttpExtractionClient::new(config.extraction.clone())?);
    let uploads = UploadOrchestrator::new(
        client,
        AnnotationStore::new(),
        previews.clone(),
        config.extraction.accepted_extensions.clone(),
    );
    let player = ConsolePlayer::new(previews);
    let mut controller = ReviewController::new(&uploads, player, config.review.on_replace);

    // Preview is playable before the upload returns
    let _upload = uploads.spawn_submit(video)?;
    controller.sync();
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_command(&mut controller, &uploads, line.trim(), detect).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            changed = controller.changed() => {
                if changed {
                    print_status(&controller);
                }
            }
        }
    }

    uploads.shutdown();
    info!("👋 Bye");
    Ok(())
}

/// Wrap a selected file, reading its duration when enabled
async fn select_video(path: &str, detect_duration: bool) -> video_review::Result<VideoFile> {
    let video = VideoFile::new(path)?;
    if detect_duration {
        Ok(video.with_detected_duration().await)
    } else {
        Ok(video)
    }
}

/// Run one command; returns false to quit
async fn handle_command(
    controller: &mut ReviewController<ConsolePlayer>,
    uploads: &UploadOrchestrator,
    line: &str,
    detect_duration: bool,
) -> bool {
    let mut parts = line.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or("");
    let arg = parts.next().map(str::trim);

    controller.sync();
    match (command, arg) {
        ("", _) => {}
        ("chapters", _) => print_chapters(controller),
        ("seek", Some(n)) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => match controller.seek_chapter(n - 1) {
                Some(position) => println!("Now at {:.1}s", position),
                None => println!("No chapter {}", n),
            },
            _ => println!("Usage: seek <n>"),
        },
        ("status", _) => print_status(controller),
        ("review", _) => {
            match controller.open_review() {
                Ok(()) => print_card(controller),
                Err(e) => println!("{}", e),
            }
        }
        ("flip", _) => {
            controller.flip();
            print_card(controller);
        }
        ("next", _) => {
            controller.next_card();
            print_card(controller);
        }
        ("prev", _) => {
            controller.prev_card();
            print_card(controller);
        }
        ("close", _) => controller.close_review(),
        ("upload", Some(path)) => match select_video(path, detect_duration).await {
            Ok(video) => {
                if let Err(e) = uploads.spawn_submit(video) {
                    warn!("Upload not started: {}", e);
                }
                controller.sync();
            }
            Err(e) => println!("{}", e),
        },
        ("help", _) => println!("{}", HELP),
        ("quit", _) | ("exit", _) => return false,
        _ => println!("Unknown command, try 'help'"),
    }
    true
}

fn print_chapters(controller: &ReviewController<ConsolePlayer>) {
    let lines = controller.markers().panel_lines();
    if lines.is_empty() {
        match controller.status() {
            UploadStatus::Failed { .. } => println!("Chapters unavailable"),
            _ => println!("No chapters"),
        }
        return;
    }
    for (i, line) in lines.iter().enumerate() {
        println!("{:>3}. {}", i + 1, line);
    }
}

fn print_card(controller: &ReviewController<ConsolePlayer>) {
    let session = controller.session();
    if let (Some(face), Some(progress)) = (session.face(), session.progress()) {
        println!("{}", SESSION_TITLE);
        println!("{}", face.heading());
        println!("  {}", face.text());
        println!("[prev] [next]   {}", progress);
    }
}

fn print_status(controller: &ReviewController<ConsolePlayer>) {
    match controller.status() {
        UploadStatus::Idle => println!("No upload"),
        UploadStatus::Uploading { sequence, file_name } => {
            println!("Upload #{} in progress: {}", sequence, file_name)
        }
        UploadStatus::Ready { sequence, chapters, flashcards } => println!(
            "Upload #{} ready: {} chapters, {} flashcards",
            sequence, chapters, flashcards
        ),
        UploadStatus::Failed { sequence, reason } => {
            println!("Upload #{} failed: {} (video still playable)", sequence, reason)
        }
    }
}
