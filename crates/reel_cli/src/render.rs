use std::fmt::Write;

use reel_core::{AppViewModel, Avatar, GenerationStatus, VideoMode, Voice};

pub fn video_list(view: &AppViewModel) -> String {
    let mut out = String::new();
    let mode = match view.mode {
        VideoMode::Regular => "videos",
        VideoMode::Shorts => "shorts",
    };
    let profile = view.profile.as_deref().unwrap_or("(no profile)");
    let _ = writeln!(out, "Top {mode} of {profile}");

    if let Some(error) = &view.last_error {
        let _ = writeln!(out, "! {error}");
    }
    if view.rows.is_empty() {
        if view.last_error.is_none() {
            let _ = writeln!(out, "  no videos found");
        }
        return out;
    }

    for row in &view.rows {
        let title = if row.title.is_empty() { "(untitled)" } else { row.title.as_str() };
        let _ = writeln!(
            out,
            "{:>3}. {}  [{} views | {} likes | {}]",
            row.index + 1,
            title,
            row.views,
            row.likes,
            row.duration
        );
        if let Some(url) = &row.watch_url {
            let _ = writeln!(out, "     {url}");
        }
    }

    let _ = write!(out, "Showing {} of {} loaded", view.rows.len(), view.total_loaded);
    if view.can_show_more {
        out.push_str("; more available");
    }
    out.push('\n');
    out
}

pub fn generation(status: &GenerationStatus) -> String {
    match status {
        GenerationStatus::Idle => "No generation started".to_string(),
        GenerationStatus::Submitting => "Submitting generation request...".to_string(),
        GenerationStatus::Waiting { job_id } => format!("Rendering (job {job_id})..."),
        GenerationStatus::Ready { video_url } => format!("Video ready: {video_url}"),
        GenerationStatus::Failed { message } => format!("Generation failed: {message}"),
        GenerationStatus::Rejected { message } => {
            format!("Generation request rejected: {message}")
        }
        GenerationStatus::TransportError { message } => {
            format!("Lost contact with the backend while rendering: {message}")
        }
        GenerationStatus::TimedOut => "Gave up waiting for the video".to_string(),
    }
}

pub fn links(links: &[String]) -> String {
    if links.is_empty() {
        return "No saved profile links\n".to_string();
    }
    let mut out = String::new();
    for (index, link) in links.iter().enumerate() {
        let _ = writeln!(out, "{index:>3}  {link}");
    }
    out
}

pub fn scenarios(scenarios: &[String]) -> String {
    let mut out = String::new();
    for (index, scenario) in scenarios.iter().enumerate() {
        let _ = writeln!(out, "--- Scenario {} ---", index + 1);
        let _ = writeln!(out, "{}", scenario.trim());
    }
    out
}

pub fn avatars(avatars: &[Avatar]) -> String {
    let mut out = String::new();
    for avatar in avatars {
        let _ = writeln!(
            out,
            "{}  {} ({})",
            avatar.avatar_id, avatar.avatar_name, avatar.gender
        );
    }
    out
}

pub fn voices(voices: &[&Voice]) -> String {
    let mut out = String::new();
    for voice in voices {
        let _ = writeln!(
            out,
            "{}  {} ({}, {})",
            voice.voice_id, voice.name, voice.language, voice.gender
        );
    }
    out
}
