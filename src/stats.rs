#![forbid(unsafe_code)]

//! Completion statistics, derived from the video list on every call.
//! Nothing here is cached or stored; the store mutates freely in between.

use crate::store::{Playlist, VideoStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistStats {
    pub total: usize,
    pub completed: usize,
    /// 0..=100, rounded half-up. 0 for an empty playlist.
    pub percent: u8,
}

pub fn playlist_stats(playlist: &Playlist) -> PlaylistStats {
    counts_to_stats(
        playlist.videos.len(),
        playlist
            .videos
            .iter()
            .filter(|v| v.status == VideoStatus::Completed)
            .count(),
    )
}

/// Aggregate across every playlist, for the dashboard header.
pub fn overall_stats(playlists: &[Playlist]) -> PlaylistStats {
    let total = playlists.iter().map(|p| p.videos.len()).sum();
    let completed = playlists
        .iter()
        .map(|p| playlist_stats(p).completed)
        .sum();
    counts_to_stats(total, completed)
}

fn counts_to_stats(total: usize, completed: usize) -> PlaylistStats {
    let percent = if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as u8
    };
    PlaylistStats {
        total,
        completed,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Video;
    use chrono::Utc;

    fn video(status: VideoStatus) -> Video {
        Video {
            id: "v".into(),
            title: "t".into(),
            url: None,
            thumbnail: None,
            duration: None,
            status,
            completed_at: None,
            created_at: Utc::now(),
            progress: None,
        }
    }

    fn playlist(videos: Vec<Video>) -> Playlist {
        let now = Utc::now();
        Playlist {
            id: "p".into(),
            title: "t".into(),
            description: None,
            videos,
            is_single_video: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_playlist_is_zero_percent() {
        let stats = playlist_stats(&playlist(vec![]));
        assert_eq!(stats, PlaylistStats { total: 0, completed: 0, percent: 0 });
    }

    #[test]
    fn counts_completed_videos_only() {
        let stats = playlist_stats(&playlist(vec![
            video(VideoStatus::Completed),
            video(VideoStatus::InProgress),
            video(VideoStatus::NotStarted),
            video(VideoStatus::Completed),
        ]));
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.percent, 50);
    }

    #[test]
    fn percent_rounds_half_up() {
        // 1/3 -> 33.33 -> 33; 2/3 -> 66.67 -> 67; 1/8 -> 12.5 -> 13.
        let one_third = playlist(vec![
            video(VideoStatus::Completed),
            video(VideoStatus::NotStarted),
            video(VideoStatus::NotStarted),
        ]);
        assert_eq!(playlist_stats(&one_third).percent, 33);

        let two_thirds = playlist(vec![
            video(VideoStatus::Completed),
            video(VideoStatus::Completed),
            video(VideoStatus::NotStarted),
        ]);
        assert_eq!(playlist_stats(&two_thirds).percent, 67);

        let mut videos = vec![video(VideoStatus::Completed)];
        videos.extend((0..7).map(|_| video(VideoStatus::NotStarted)));
        assert_eq!(playlist_stats(&playlist(videos)).percent, 13);
    }

    #[test]
    fn overall_stats_aggregate_across_playlists() {
        let playlists = vec![
            playlist(vec![video(VideoStatus::Completed), video(VideoStatus::NotStarted)]),
            playlist(vec![video(VideoStatus::Completed)]),
            playlist(vec![]),
        ];
        let stats = overall_stats(&playlists);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.percent, 67);
    }
}
