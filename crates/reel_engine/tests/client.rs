mod support;

use pretty_assertions::assert_eq;
use reel_core::{
    GenerationRequest, JobHandle, JobStatus, PageRequest, ProfileLink, SourceKey, VideoMode,
    VideoRef,
};
use reel_engine::{BackendSettings, FailureKind, JobBackend, ReqwestBackend, VideoSource};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> ReqwestBackend {
    ReqwestBackend::new(BackendSettings {
        base_url: server.uri(),
        ..BackendSettings::default()
    })
    .expect("valid settings")
}

fn instagram(mode: VideoMode) -> SourceKey {
    SourceKey::new(
        ProfileLink::parse("https://www.instagram.com/creator/?hl=en").unwrap(),
        mode,
    )
}

#[test]
fn rejects_unusable_base_url() {
    let err = ReqwestBackend::new(BackendSettings {
        base_url: "not a url".to_string(),
        ..BackendSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn youtube_listing_sends_profile_and_offset() {
    support::init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("profile_url", "https://www.youtube.com/@creator"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "videos": [
                {"video_id": "v1", "title": "First", "views": 1200, "likes": 30, "duration": "PT1M"},
                {"video_id": "v2", "views": 10}
            ],
            "next_offset": 20
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = backend(&server)
        .fetch_page(&support::channel(VideoMode::Regular), &PageRequest::first(20))
        .await
        .expect("page");

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].title, "First");
    assert_eq!(page.items[0].views, 1200);
    assert_eq!(page.items[1].likes, 0);
    assert_eq!(
        page.next_page,
        Some(PageRequest::Offset {
            offset: 20,
            limit: 20
        })
    );
}

#[tokio::test]
async fn listing_tolerates_null_and_float_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "videos": [
                {"video_id": "a", "views": null, "likes": 3},
                {"video_id": "b", "views": 1200.0, "likes": 2.6}
            ]
        })))
        .mount(&server)
        .await;

    let page = backend(&server)
        .fetch_page(&support::channel(VideoMode::Regular), &PageRequest::first(20))
        .await
        .expect("page");

    let counts: Vec<_> = page
        .items
        .iter()
        .map(|video| (video.video_id.as_str(), video.views, video.likes))
        .collect();
    assert_eq!(counts, vec![("a", 0, 3), ("b", 1200, 3)]);
}

#[tokio::test]
async fn shorts_listing_uses_shorts_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/short_videos"))
        .and(query_param("profile_url", "https://www.youtube.com/@creator"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"videos": []})))
        .expect(1)
        .mount(&server)
        .await;

    let page = backend(&server)
        .fetch_page(&support::channel(VideoMode::Shorts), &PageRequest::first(20))
        .await
        .expect("page");

    assert!(page.items.is_empty());
    assert_eq!(page.next_page, None);
}

#[tokio::test]
async fn instagram_listing_sends_username_and_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/insta_short_videos"))
        .and(query_param("username", "creator"))
        .and(query_param("cursor", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "videos": [{"video_id": "r1", "url": "https://www.instagram.com/reel/r1/", "views": 5}],
            "next_page_token": "tok-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = backend(&server)
        .fetch_page(
            &instagram(VideoMode::Shorts),
            &PageRequest::Cursor {
                token: "tok-1".to_string(),
                limit: 12,
            },
        )
        .await
        .expect("page");

    assert_eq!(page.items[0].url.as_deref(), Some("https://www.instagram.com/reel/r1/"));
    assert_eq!(
        page.next_page,
        Some(PageRequest::Cursor {
            token: "tok-2".to_string(),
            limit: 12
        })
    );
}

#[tokio::test]
async fn error_status_maps_to_http_status_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/insta_videos"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = backend(&server)
        .fetch_page(&instagram(VideoMode::Regular), &PageRequest::first(20))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(502));
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/avatar_list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
        .mount(&server)
        .await;
    let backend = ReqwestBackend::new(BackendSettings {
        base_url: server.uri(),
        max_bytes: 16,
        ..BackendSettings::default()
    })
    .unwrap();

    let err = backend.avatars().await.unwrap_err();

    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 16, .. }));
}

#[tokio::test]
async fn submit_posts_request_and_reads_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate_video"))
        .and(body_json(json!({
            "text": "Hello there",
            "avatar_id": "av-1",
            "voice_id": "vo-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "task-9"})))
        .expect(1)
        .mount(&server)
        .await;

    let job_id = backend(&server)
        .submit(&GenerationRequest::new("Hello there", "av-1", "vo-1"))
        .await
        .expect("submitted");

    assert_eq!(job_id, "task-9");
}

#[tokio::test]
async fn numeric_task_id_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate_video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": 77})))
        .mount(&server)
        .await;

    let job_id = backend(&server)
        .submit(&GenerationRequest::new("Hello", "av-1", "vo-1"))
        .await
        .unwrap();

    assert_eq!(job_id, "77");
}

#[tokio::test]
async fn task_status_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/task_status/task-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "video_url": "https://cdn.example/out.mp4"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/task_status/task-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed",
            "error": "quota exceeded",
            "video_url": "ignored"
        })))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let done = backend.status("task-9").await.unwrap();
    let failed = backend.status("task-10").await.unwrap();

    assert_eq!(
        done,
        JobHandle::from_parts(
            "task-9",
            JobStatus::Completed,
            Some("https://cdn.example/out.mp4".to_string()),
            None
        )
    );
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.result, None);
    assert_eq!(failed.error_message.as_deref(), Some("quota exceeded"));
}

#[tokio::test]
async fn unknown_task_status_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/task_status/task-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "rendering"})))
        .mount(&server)
        .await;

    let err = backend(&server).status("task-1").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn transcript_accepts_json_string_or_plain_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transcript_video"))
        .and(query_param("video_id", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("spoken words")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/insta_transcript"))
        .and(query_param("url", "https://www.instagram.com/reel/r1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain words"))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let youtube = backend
        .transcript(&VideoRef::YouTube {
            video_id: "abc123".to_string(),
        })
        .await
        .unwrap();
    let insta = backend
        .transcript(&VideoRef::Instagram {
            url: "https://www.instagram.com/reel/r1/".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(youtube, "spoken words");
    assert_eq!(insta, "plain words");
}

#[tokio::test]
async fn scenarios_are_generated_from_transcription() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate_text"))
        .and(body_json(json!({"transcription": "spoken words"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["one", "two", "three"])))
        .expect(1)
        .mount(&server)
        .await;

    let scenarios = backend(&server)
        .generate_scenarios("spoken words")
        .await
        .unwrap();

    assert_eq!(scenarios, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn catalogs_drop_unknown_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/avatar_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"avatar_id": "a1", "avatar_name": "Ann", "gender": "female"},
            {"avatar_id": "a2", "avatar_name": "Bot", "gender": "unknown"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/voice_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"voice_id": "v1", "name": "Vic", "language": "English", "gender": "Male"},
            {"voice_id": "v2", "name": "Odd", "language": "unknown", "gender": "female"}
        ])))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let avatars = backend.avatars().await.unwrap();
    let voices = backend.voices().await.unwrap();

    assert_eq!(avatars.len(), 1);
    assert_eq!(avatars[0].avatar_id, "a1");
    assert_eq!(voices.len(), 1);
    assert_eq!(voices[0].gender, "male");
}
