use serde::{Deserialize, Serialize};
use url::Url;

use crate::VideoRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    YouTube,
    Instagram,
}

impl Platform {
    /// Anything that is not a YouTube link is served by the Instagram endpoints.
    pub fn detect(link: &str) -> Self {
        if link.contains("youtube") {
            Platform::YouTube
        } else {
            Platform::Instagram
        }
    }
}

/// Which listing of a profile is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VideoMode {
    #[default]
    Regular,
    Shorts,
}

impl VideoMode {
    pub fn from_shorts(shorts: bool) -> Self {
        if shorts {
            VideoMode::Shorts
        } else {
            VideoMode::Regular
        }
    }

    pub fn is_shorts(self) -> bool {
        self == VideoMode::Shorts
    }

    fn as_str(self) -> &'static str {
        match self {
            VideoMode::Regular => "regular",
            VideoMode::Shorts => "shorts",
        }
    }
}

/// A normalized profile (or single video) link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileLink {
    url: String,
    platform: Platform,
}

impl ProfileLink {
    /// Normalizes `raw`; returns `None` when it is not an http(s) URL.
    pub fn parse(raw: &str) -> Option<Self> {
        let url = normalize_profile_link(raw)?;
        let platform = Platform::detect(&url);
        Some(Self { url, platform })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// First path segment of an instagram.com link.
    pub fn instagram_username(&self) -> Option<String> {
        let parsed = Url::parse(&self.url).ok()?;
        if !is_instagram_host(parsed.host_str()?) {
            return None;
        }
        parsed
            .path_segments()?
            .next()
            .filter(|segment| !segment.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Video id of a `watch?v=` link, which lets the wizard skip the video list.
    pub fn watch_video_id(&self) -> Option<String> {
        if !self.url.contains("watch?") {
            return None;
        }
        let parsed = Url::parse(&self.url).ok()?;
        parsed
            .query_pairs()
            .find(|(name, _)| name == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|id| !id.is_empty())
    }
}

/// Identifies one persisted video collection: a profile plus a listing mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceKey {
    pub profile: ProfileLink,
    pub mode: VideoMode,
}

impl SourceKey {
    pub fn new(profile: ProfileLink, mode: VideoMode) -> Self {
        Self { profile, mode }
    }

    pub fn storage_key(&self) -> String {
        format!("videos|{}|{}", self.mode.as_str(), self.profile.url())
    }
}

/// The video handed from the selection step to the scenario step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoRef {
    YouTube { video_id: String },
    Instagram { url: String },
}

impl VideoRef {
    pub fn for_record(platform: Platform, record: &VideoRecord) -> Option<Self> {
        match platform {
            Platform::YouTube => Some(VideoRef::YouTube {
                video_id: record.video_id.clone(),
            }),
            Platform::Instagram => record
                .url
                .clone()
                .map(|url| VideoRef::Instagram { url }),
        }
    }

    /// Accepts either a bare YouTube video id or an Instagram post URL.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let link = ProfileLink::parse(raw)?;
            return match link.platform() {
                Platform::YouTube => link
                    .watch_video_id()
                    .map(|video_id| VideoRef::YouTube { video_id }),
                Platform::Instagram => Some(VideoRef::Instagram {
                    url: link.url().to_string(),
                }),
            };
        }
        Some(VideoRef::YouTube {
            video_id: raw.to_string(),
        })
    }

    /// Link a user can open to watch the video.
    pub fn watch_url(&self) -> String {
        match self {
            VideoRef::YouTube { video_id } => format!("https://www.youtube.com/watch?v={video_id}"),
            VideoRef::Instagram { url } => url.clone(),
        }
    }
}

/// Canonical form of a profile link, used as the identity of cached data.
///
/// Instagram links lose their query, `youtu.be` short links expand to a
/// `watch?v=` URL, `youtube.com` gains the `www.` prefix and handle links
/// (`/@name`) lose their query. Other links keep their query.
pub fn normalize_profile_link(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();

    if is_instagram_host(&host) {
        return Some(origin_and_path(&parsed));
    }

    if host == "youtu.be" {
        let video_id = parsed.path().trim_start_matches('/');
        return Some(format!("https://www.youtube.com/watch?v={video_id}"));
    }

    if host == "youtube.com" {
        parsed.set_host(Some("www.youtube.com")).ok()?;
    }

    if parsed.path().starts_with("/@") {
        return Some(origin_and_path(&parsed));
    }

    let mut normalized = origin_and_path(&parsed);
    if let Some(query) = parsed.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    Some(normalized)
}

fn is_instagram_host(host: &str) -> bool {
    host == "instagram.com" || host == "www.instagram.com"
}

fn origin_and_path(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}
