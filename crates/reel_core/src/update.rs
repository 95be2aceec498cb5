use crate::{
    AppState, Effect, GenerationOutcome, GenerationStatus, Msg, ProfileLink, VideoMode,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ProfileOpened { link, mode } => {
            let Some(profile) = ProfileLink::parse(&link) else {
                state.set_invalid_profile(&link);
                return (state, Vec::new());
            };
            let previous = state.current_source();
            let source = state.open_source(profile, mode);
            let mut effects = Vec::with_capacity(2);
            if let Some(previous) = previous.filter(|previous| *previous != source) {
                effects.push(Effect::InvalidateVideos { source: previous });
            }
            effects.push(Effect::LoadVideos { source });
            effects
        }
        Msg::ShortsToggled(shorts) => {
            let mode = VideoMode::from_shorts(shorts);
            if mode == state.mode() {
                return (state, Vec::new());
            }
            match state.current_source() {
                Some(previous) => {
                    let source = state.open_source(previous.profile.clone(), mode);
                    vec![
                        Effect::InvalidateVideos { source: previous },
                        Effect::LoadVideos { source },
                    ]
                }
                None => {
                    state.set_mode_without_source(mode);
                    Vec::new()
                }
            }
        }
        Msg::VideosLoaded {
            source,
            items,
            next_page,
        } => {
            // A response for a source the user already left is dropped.
            if state.current_source().as_ref() == Some(&source) {
                state.apply_loaded(items, next_page);
            }
            Vec::new()
        }
        Msg::VideosFailed {
            source,
            message,
            retained,
        } => {
            if state.current_source().as_ref() == Some(&source) {
                state.apply_failed(message, retained);
            }
            Vec::new()
        }
        Msg::ShowMoreClicked => match state.show_more() {
            Some((source, page)) => vec![Effect::LoadMoreVideos { source, page }],
            None => Vec::new(),
        },
        Msg::VideoSelected(index) => {
            state.select(index);
            Vec::new()
        }
        Msg::GenerateClicked(request) => {
            if state.generation().is_in_flight() {
                return (state, Vec::new());
            }
            state.set_generation(GenerationStatus::Submitting);
            vec![Effect::SubmitGeneration(request)]
        }
        Msg::GenerationSubmitted(handle) => {
            if *state.generation() != GenerationStatus::Submitting {
                return (state, Vec::new());
            }
            state.set_generation(GenerationStatus::Waiting {
                job_id: handle.id.clone(),
            });
            vec![Effect::WatchJob(handle)]
        }
        Msg::GenerationRejected(message) => {
            if *state.generation() == GenerationStatus::Submitting {
                state.set_generation(GenerationStatus::Rejected { message });
            }
            Vec::new()
        }
        Msg::GenerationFinished(outcome) => {
            let watching = matches!(
                state.generation(),
                GenerationStatus::Waiting { job_id } if job_id == outcome.job_id()
            );
            if watching {
                state.set_generation(finished_status(outcome));
            }
            Vec::new()
        }
        Msg::CancelGenerationClicked => match state.generation().clone() {
            GenerationStatus::Waiting { job_id } => {
                state.set_generation(GenerationStatus::Idle);
                vec![Effect::CancelWatch { job_id }]
            }
            GenerationStatus::Submitting => {
                state.set_generation(GenerationStatus::Idle);
                Vec::new()
            }
            _ => Vec::new(),
        },
    };

    (state, effects)
}

fn finished_status(outcome: GenerationOutcome) -> GenerationStatus {
    match outcome {
        GenerationOutcome::Ready { video_url, .. } => GenerationStatus::Ready { video_url },
        GenerationOutcome::Failed { message, .. } => GenerationStatus::Failed { message },
        GenerationOutcome::TransportError { message, .. } => {
            GenerationStatus::TransportError { message }
        }
        GenerationOutcome::TimedOut { .. } => GenerationStatus::TimedOut,
    }
}
