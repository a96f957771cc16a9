#![forbid(unsafe_code)]

//! Command-line front end for the playlist tracker.
//!
//! Every subcommand opens the store, performs one operation and exits;
//! the JSON file under the data root is the only shared state between
//! invocations. Destructive operations print what they did, lookups print
//! human-readable tables.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use playtrack::config::{
    DEFAULT_ENV_PATH, RuntimeOverrides, RuntimePaths, resolve_runtime_paths, upsert_env_value,
};
use playtrack::fetch::{FetchOutcome, Fetcher, PlaylistMetadata, VideoMetadata};
use playtrack::ids::embed_url;
use playtrack::notes::NotesStore;
use playtrack::sort::{SortMode, filter_playlists, sorted_videos};
use playtrack::stats::{overall_stats, playlist_stats};
use playtrack::store::{NewVideo, PlaylistPatch, PlaylistStore, VideoPatch, VideoStatus};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "playtrack", version, about = "Track progress through video playlists")]
struct Cli {
    /// Data directory (defaults to PLAYTRACK_DATA_ROOT or .playtrack).
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,
    /// Environment file to read configuration from (defaults to .env).
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List playlists with their completion stats.
    List {
        /// Only show playlists whose title, description or video titles
        /// contain this text (case-insensitive).
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one playlist and its videos.
    Show {
        playlist_id: String,
        #[arg(long, value_enum, default_value = "default")]
        sort: SortMode,
    },
    /// Create an empty playlist.
    AddPlaylist {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change a playlist's title or description.
    EditPlaylist {
        playlist_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
    },
    /// Delete a playlist and every video in it.
    DeletePlaylist { playlist_id: String },
    /// Add a video to a playlist by hand.
    AddVideo {
        playlist_id: String,
        title: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        thumbnail: Option<String>,
        #[arg(long)]
        duration: Option<String>,
    },
    /// Change a video's descriptive fields.
    EditVideo {
        playlist_id: String,
        video_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_url")]
        url: Option<String>,
        #[arg(long)]
        clear_url: bool,
        #[arg(long, conflicts_with = "clear_thumbnail")]
        thumbnail: Option<String>,
        #[arg(long)]
        clear_thumbnail: bool,
        #[arg(long, conflicts_with = "clear_duration")]
        duration: Option<String>,
        #[arg(long)]
        clear_duration: bool,
    },
    /// Remove a video from its playlist.
    DeleteVideo {
        playlist_id: String,
        video_id: String,
    },
    /// Flip a video between completed and not started.
    Toggle {
        playlist_id: String,
        video_id: String,
    },
    /// Set a video's status explicitly.
    SetStatus {
        playlist_id: String,
        video_id: String,
        #[arg(value_enum)]
        status: StatusArg,
    },
    /// Mark every video in a playlist completed.
    CompleteAll { playlist_id: String },
    /// Record a playback position in seconds.
    Progress {
        playlist_id: String,
        video_id: String,
        seconds: u32,
    },
    /// Resolve a YouTube or Vimeo URL and save what it points at.
    Fetch {
        url: String,
        /// Add the resolved video(s) to this playlist instead of creating
        /// a new one.
        #[arg(long)]
        into: Option<String>,
    },
    /// Write the whole collection to a JSON snapshot.
    Export {
        /// Defaults to playtrack-YYYY-MM-DD.json in the working directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace the whole collection with a JSON snapshot.
    Import { file: PathBuf },
    /// Read, set or clear the note attached to a video.
    Notes {
        video_id: String,
        #[arg(long, conflicts_with = "clear")]
        set: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    /// Print the embeddable player URL for a video link.
    EmbedUrl { url: String },
    /// Manage stored configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Save the YouTube Data API key into the environment file.
    SetKey { key: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    NotStarted,
    InProgress,
    Completed,
}

impl From<StatusArg> for VideoStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::NotStarted => VideoStatus::NotStarted,
            StatusArg::InProgress => VideoStatus::InProgress,
            StatusArg::Completed => VideoStatus::Completed,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = resolve_runtime_paths(RuntimeOverrides {
        data_root: cli.data_root,
        env_path: cli.env_file.clone(),
        ..RuntimeOverrides::default()
    })?;
    let env_path = cli
        .env_file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_PATH));
    run(cli.command, &runtime, &env_path)
}

fn run(command: Command, runtime: &RuntimePaths, env_path: &Path) -> Result<()> {
    match command {
        Command::List { search } => {
            let store = PlaylistStore::open(&runtime.storage_file);
            list_playlists(&store, search.as_deref().unwrap_or(""));
        }
        Command::Show { playlist_id, sort } => {
            let store = PlaylistStore::open(&runtime.storage_file);
            show_playlist(&store, &playlist_id, sort)?;
        }
        Command::AddPlaylist { title, description } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            let playlist = store.add_playlist(&title, description, false)?;
            println!("Created playlist {} ({})", playlist.title, playlist.id);
        }
        Command::EditPlaylist {
            playlist_id,
            title,
            description,
            clear_description,
        } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            require_playlist(&store, &playlist_id)?;
            store.update_playlist(
                &playlist_id,
                PlaylistPatch {
                    title,
                    description: patch_field(description, clear_description),
                },
            )?;
            println!("Updated playlist {playlist_id}");
        }
        Command::DeletePlaylist { playlist_id } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            require_playlist(&store, &playlist_id)?;
            store.delete_playlist(&playlist_id)?;
            println!("Deleted playlist {playlist_id}");
        }
        Command::AddVideo {
            playlist_id,
            title,
            url,
            thumbnail,
            duration,
        } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            require_playlist(&store, &playlist_id)?;
            store.add_video(
                &playlist_id,
                NewVideo {
                    title,
                    url,
                    thumbnail,
                    duration,
                },
            )?;
            println!("Added video to {playlist_id}");
        }
        Command::EditVideo {
            playlist_id,
            video_id,
            title,
            url,
            clear_url,
            thumbnail,
            clear_thumbnail,
            duration,
            clear_duration,
        } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            require_video(&store, &playlist_id, &video_id)?;
            store.update_video(
                &playlist_id,
                &video_id,
                VideoPatch {
                    title,
                    url: patch_field(url, clear_url),
                    thumbnail: patch_field(thumbnail, clear_thumbnail),
                    duration: patch_field(duration, clear_duration),
                },
            )?;
            println!("Updated video {video_id}");
        }
        Command::DeleteVideo {
            playlist_id,
            video_id,
        } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            require_video(&store, &playlist_id, &video_id)?;
            store.delete_video(&playlist_id, &video_id)?;
            println!("Deleted video {video_id}");
        }
        Command::Toggle {
            playlist_id,
            video_id,
        } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            require_video(&store, &playlist_id, &video_id)?;
            store.toggle_video_status(&playlist_id, &video_id)?;
            let status = video_status(&store, &playlist_id, &video_id)?;
            println!("Video {video_id} is now {}", status_label(status));
        }
        Command::SetStatus {
            playlist_id,
            video_id,
            status,
        } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            require_video(&store, &playlist_id, &video_id)?;
            store.set_video_status(&playlist_id, &video_id, status.into())?;
            println!("Video {video_id} is now {}", status_label(status.into()));
        }
        Command::CompleteAll { playlist_id } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            require_playlist(&store, &playlist_id)?;
            store.mark_playlist_completed(&playlist_id)?;
            let stats = playlist_stats(require_playlist(&store, &playlist_id)?);
            println!("Marked {} video(s) completed", stats.total);
        }
        Command::Progress {
            playlist_id,
            video_id,
            seconds,
        } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            require_video(&store, &playlist_id, &video_id)?;
            store.update_video_progress(&playlist_id, &video_id, seconds)?;
            // One-shot invocation; force the coalesced write out now.
            store.flush()?;
            println!("Saved position {seconds}s for video {video_id}");
        }
        Command::Fetch { url, into } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            let fetcher = Fetcher::new(
                runtime.youtube_api_key.clone(),
                runtime.proxy_base.clone(),
            );
            match fetcher.resolve(&url) {
                FetchOutcome::Video(meta) => save_fetched_video(&mut store, &url, meta, into)?,
                FetchOutcome::Playlist(meta) => save_fetched_playlist(&mut store, meta, into)?,
                FetchOutcome::Error(message) => bail!("{message}"),
            }
        }
        Command::Export { output } => {
            let store = PlaylistStore::open(&runtime.storage_file);
            let path = output.unwrap_or_else(default_export_path);
            let snapshot = store.export_data()?;
            fs::write(&path, snapshot)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Exported {} playlist(s) to {}", store.playlists().len(), path.display());
        }
        Command::Import { file } => {
            let mut store = PlaylistStore::open(&runtime.storage_file);
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            store.import_data(&raw)?;
            println!("Imported {} playlist(s)", store.playlists().len());
        }
        Command::Notes { video_id, set, clear } => {
            let notes = NotesStore::new(&runtime.notes_dir);
            if clear {
                notes.clear(&video_id)?;
                println!("Cleared note for {video_id}");
            } else if let Some(text) = set {
                notes.set(&video_id, &text)?;
                println!("Saved note for {video_id}");
            } else {
                match notes.get(&video_id)? {
                    Some(text) => println!("{text}"),
                    None => println!("(no note)"),
                }
            }
        }
        Command::EmbedUrl { url } => match embed_url(&url) {
            Some(embed) => println!("{embed}"),
            None => bail!("no embeddable player for {url}"),
        },
        Command::Config(ConfigCommand::SetKey { key }) => {
            upsert_env_value(env_path, "YOUTUBE_API_KEY", &key)?;
            println!("Saved YouTube API key to {}", env_path.display());
        }
    }
    Ok(())
}

fn list_playlists(store: &PlaylistStore, query: &str) {
    let matches = filter_playlists(store.playlists(), query);
    if matches.is_empty() {
        if query.trim().is_empty() {
            println!("No playlists yet. Try `playtrack fetch <url>`.");
        } else {
            println!("No playlists match {query:?}.");
        }
        return;
    }
    for playlist in &matches {
        let stats = playlist_stats(playlist);
        println!(
            "{:>3}% [{}/{}] {}  {}",
            stats.percent, stats.completed, stats.total, playlist.id, playlist.title
        );
    }
    if query.trim().is_empty() {
        let overall = overall_stats(store.playlists());
        println!(
            "-- {} playlist(s), {}/{} videos completed ({}%)",
            matches.len(),
            overall.completed,
            overall.total,
            overall.percent
        );
    }
}

fn show_playlist(store: &PlaylistStore, playlist_id: &str, sort: SortMode) -> Result<()> {
    let playlist = require_playlist(store, playlist_id)?;
    let stats = playlist_stats(playlist);
    println!("{} ({})", playlist.title, playlist.id);
    if let Some(description) = &playlist.description {
        println!("{description}");
    }
    println!("{}/{} completed ({}%)", stats.completed, stats.total, stats.percent);
    for video in sorted_videos(&playlist.videos, sort) {
        let mut line = format!("{} {}  {}", status_marker(video.status), video.id, video.title);
        if let Some(duration) = &video.duration {
            line.push_str(&format!(" [{duration}]"));
        }
        if let Some(progress) = video.progress
            && video.status != VideoStatus::Completed
        {
            line.push_str(&format!(" (at {progress}s)"));
        }
        println!("{line}");
    }
    Ok(())
}

fn save_fetched_video(
    store: &mut PlaylistStore,
    url: &str,
    meta: VideoMetadata,
    into: Option<String>,
) -> Result<()> {
    let title = if meta.title.is_empty() {
        url.to_string()
    } else {
        meta.title.clone()
    };
    let video = NewVideo {
        title: title.clone(),
        // The resolved metadata omits the URL for single videos; the pasted
        // one is authoritative anyway.
        url: Some(url.trim().to_string()),
        thumbnail: meta.thumbnail,
        duration: meta.duration,
    };
    match into {
        Some(playlist_id) => {
            require_playlist(store, &playlist_id)?;
            store.add_video(&playlist_id, video)?;
            println!("Added \"{title}\" to {playlist_id}");
        }
        None => {
            let playlist = store.add_playlist(&title, None, true)?;
            store.add_video(&playlist.id, video)?;
            println!("Saved \"{title}\" as playlist {}", playlist.id);
        }
    }
    Ok(())
}

fn save_fetched_playlist(
    store: &mut PlaylistStore,
    meta: PlaylistMetadata,
    into: Option<String>,
) -> Result<()> {
    let playlist_id = match into {
        Some(id) => {
            require_playlist(store, &id)?;
            id
        }
        None => {
            store
                .add_playlist(&meta.title, meta.description.clone(), false)?
                .id
        }
    };
    let count = meta.videos.len();
    for video in meta.videos {
        store.add_video(
            &playlist_id,
            NewVideo {
                title: video.title,
                url: video.url,
                thumbnail: video.thumbnail,
                duration: video.duration,
            },
        )?;
    }
    println!("Saved \"{}\" with {count} video(s) as {playlist_id}", meta.title);
    Ok(())
}

/// Maps an optional new value plus a clear flag onto the store's two-level
/// patch convention.
fn patch_field(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear { Some(None) } else { value.map(Some) }
}

fn require_playlist<'a>(store: &'a PlaylistStore, playlist_id: &str) -> Result<&'a playtrack::store::Playlist> {
    store
        .get(playlist_id)
        .with_context(|| format!("no playlist with id {playlist_id}"))
}

fn require_video(store: &PlaylistStore, playlist_id: &str, video_id: &str) -> Result<()> {
    let playlist = require_playlist(store, playlist_id)?;
    if !playlist.videos.iter().any(|v| v.id == video_id) {
        bail!("no video with id {video_id} in playlist {playlist_id}");
    }
    Ok(())
}

fn video_status(store: &PlaylistStore, playlist_id: &str, video_id: &str) -> Result<VideoStatus> {
    let playlist = require_playlist(store, playlist_id)?;
    playlist
        .videos
        .iter()
        .find(|v| v.id == video_id)
        .map(|v| v.status)
        .with_context(|| format!("no video with id {video_id}"))
}

fn status_marker(status: VideoStatus) -> &'static str {
    match status {
        VideoStatus::NotStarted => "[ ]",
        VideoStatus::InProgress => "[~]",
        VideoStatus::Completed => "[x]",
    }
}

fn status_label(status: VideoStatus) -> &'static str {
    match status {
        VideoStatus::NotStarted => "not started",
        VideoStatus::InProgress => "in progress",
        VideoStatus::Completed => "completed",
    }
}

fn default_export_path() -> PathBuf {
    PathBuf::from(format!("playtrack-{}.json", Utc::now().format("%Y-%m-%d")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn patch_field_maps_onto_the_two_level_convention() {
        assert_eq!(patch_field(None, false), None);
        assert_eq!(patch_field(Some("x".into()), false), Some(Some("x".into())));
        assert_eq!(patch_field(None, true), Some(None));
        assert_eq!(patch_field(Some("ignored".into()), true), Some(None));
    }

    #[test]
    fn default_export_path_is_dated_json() {
        let name = default_export_path();
        let name = name.to_string_lossy();
        assert!(name.starts_with("playtrack-"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn status_markers_cover_every_state() {
        assert_eq!(status_marker(VideoStatus::NotStarted), "[ ]");
        assert_eq!(status_marker(VideoStatus::InProgress), "[~]");
        assert_eq!(status_marker(VideoStatus::Completed), "[x]");
    }

    #[test]
    fn fetched_video_becomes_a_single_video_playlist() {
        let dir = TempDir::new().unwrap();
        let mut store = PlaylistStore::open(dir.path().join("playlists.json"));
        save_fetched_video(
            &mut store,
            "https://youtu.be/abc12345678",
            VideoMetadata {
                title: "Talk".into(),
                thumbnail: Some("https://img.youtube.com/vi/abc12345678/hqdefault.jpg".into()),
                ..VideoMetadata::default()
            },
            None,
        )
        .unwrap();

        let playlist = &store.playlists()[0];
        assert!(playlist.is_single_video);
        assert_eq!(playlist.title, "Talk");
        assert_eq!(playlist.videos.len(), 1);
        assert_eq!(
            playlist.videos[0].url.as_deref(),
            Some("https://youtu.be/abc12345678")
        );
    }

    #[test]
    fn fetched_playlist_lands_in_an_existing_one_with_into() {
        let dir = TempDir::new().unwrap();
        let mut store = PlaylistStore::open(dir.path().join("playlists.json"));
        let existing = store.add_playlist("Queue", None, false).unwrap();
        save_fetched_playlist(
            &mut store,
            PlaylistMetadata {
                title: "Course".into(),
                thumbnail: None,
                description: None,
                author: None,
                videos: vec![
                    VideoMetadata { title: "One".into(), ..VideoMetadata::default() },
                    VideoMetadata { title: "Two".into(), ..VideoMetadata::default() },
                ],
            },
            Some(existing.id.clone()),
        )
        .unwrap();

        assert_eq!(store.playlists().len(), 1);
        assert_eq!(store.get(&existing.id).unwrap().videos.len(), 2);
    }
}
