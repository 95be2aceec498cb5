mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use reel_core::{CachedCollection, PageRequest, SourceKey, VideoMode, VideoRecord};
use reel_engine::{
    CacheError, CacheSettings, Clock, FailureKind, KeyValueStore, ListCache, MemoryStore,
    VideoPage,
};

use support::{channel, network_error, page, shared, video, FakeSource};

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
}

fn fixed_clock(now: DateTime<Utc>) -> Clock {
    Arc::new(move || now)
}

fn cache_at(source: Arc<FakeSource>, store: Arc<MemoryStore>, now: DateTime<Utc>) -> ListCache {
    ListCache::new(source, store, CacheSettings::default()).with_clock(fixed_clock(now))
}

fn persist(store: &MemoryStore, key: &SourceKey, items: Vec<VideoRecord>, fetched_at: DateTime<Utc>) -> CachedCollection {
    let collection = CachedCollection {
        source_key: key.storage_key(),
        items,
        fetched_at,
        next_page: None,
    };
    store
        .set(&key.storage_key(), &serde_json::to_string(&collection).unwrap())
        .unwrap();
    collection
}

fn stored(store: &MemoryStore, key: &SourceKey) -> Option<CachedCollection> {
    store
        .get(&key.storage_key())
        .unwrap()
        .map(|text| serde_json::from_str(&text).unwrap())
}

fn ids(collection: &CachedCollection) -> Vec<&str> {
    collection.items.iter().map(|v| v.video_id.as_str()).collect()
}

#[tokio::test]
async fn fresh_collection_is_served_without_fetching() {
    support::init_logging();
    let key = channel(VideoMode::Regular);
    let store = shared(MemoryStore::new());
    let persisted = persist(
        &store,
        &key,
        vec![video("a", 10, 1)],
        noon() - chrono::Duration::hours(1),
    );
    let source = shared(FakeSource::new(vec![page(vec![video("b", 99, 9)])]));
    let cache = cache_at(source.clone(), store.clone(), noon());

    let loaded = cache.load(&key, cache.first_page()).await.unwrap();

    assert_eq!(loaded, persisted);
    assert_eq!(source.calls(), 0);
    assert_eq!(cache.view(&key), Some(persisted));
}

#[tokio::test]
async fn collection_exactly_at_window_edge_is_still_fresh() {
    let key = channel(VideoMode::Regular);
    let store = shared(MemoryStore::new());
    persist(&store, &key, vec![video("a", 10, 1)], noon() - chrono::Duration::days(3));
    let source = shared(FakeSource::default());
    let cache = cache_at(source.clone(), store, noon());

    cache.load(&key, cache.first_page()).await.unwrap();

    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn stale_collection_is_refetched_once_and_merged() {
    let key = channel(VideoMode::Regular);
    let store = shared(MemoryStore::new());
    persist(
        &store,
        &key,
        vec![video("a", 10, 1), video("b", 5, 0)],
        noon() - chrono::Duration::days(4),
    );
    let source = shared(FakeSource::new(vec![page(vec![
        video("c", 7, 3),
        video("a", 99, 99),
    ])]));
    let cache = cache_at(source.clone(), store.clone(), noon());

    let loaded = cache.load(&key, cache.first_page()).await.unwrap();

    assert_eq!(source.calls(), 1);
    assert_eq!(source.requests(), vec![PageRequest::first(20)]);
    assert_eq!(ids(&loaded), vec!["a", "c", "b"]);
    // The stored copy of a video wins over a refetched duplicate.
    assert_eq!(loaded.items[0].views, 10);
    assert_eq!(loaded.fetched_at, noon());
    assert_eq!(stored(&store, &key), Some(loaded));
}

#[tokio::test]
async fn cold_load_fetches_and_persists() {
    let key = channel(VideoMode::Shorts);
    let store = shared(MemoryStore::new());
    let source = shared(FakeSource::new(vec![Ok(VideoPage {
        items: vec![video("s1", 3, 0), video("s2", 30, 2)],
        next_page: Some(PageRequest::Offset {
            offset: 20,
            limit: 20,
        }),
    })]));
    let cache = cache_at(source.clone(), store.clone(), noon());

    let loaded = cache.load(&key, cache.first_page()).await.unwrap();

    assert_eq!(ids(&loaded), vec!["s2", "s1"]);
    assert_eq!(loaded.source_key, key.storage_key());
    assert_eq!(
        loaded.next_page,
        Some(PageRequest::Offset {
            offset: 20,
            limit: 20
        })
    );
    assert_eq!(stored(&store, &key), Some(loaded));
    assert!(stored(&store, &channel(VideoMode::Regular)).is_none());
}

#[tokio::test]
async fn load_more_always_fetches_and_grows_the_list() {
    let key = channel(VideoMode::Regular);
    let store = shared(MemoryStore::new());
    persist(
        &store,
        &key,
        vec![video("a", 10, 1)],
        noon() - chrono::Duration::minutes(5),
    );
    let source = shared(FakeSource::new(vec![page(vec![video("b", 20, 0)])]));
    let cache = cache_at(source.clone(), store.clone(), noon());
    let next = PageRequest::Cursor {
        token: "abc".to_string(),
        limit: 20,
    };

    let loaded = cache.load_more(&key, next.clone()).await.unwrap();

    assert_eq!(source.requests(), vec![next]);
    assert_eq!(ids(&loaded), vec!["b", "a"]);
    assert_eq!(stored(&store, &key), Some(loaded));
}

#[tokio::test]
async fn fetch_error_returns_retained_collection_and_keeps_store() {
    let key = channel(VideoMode::Regular);
    let store = shared(MemoryStore::new());
    let persisted = persist(
        &store,
        &key,
        vec![video("a", 10, 1)],
        noon() - chrono::Duration::days(5),
    );
    let source = shared(FakeSource::new(vec![Err(network_error())]));
    let cache = cache_at(source.clone(), store.clone(), noon());

    let err = cache.load(&key, cache.first_page()).await.unwrap_err();

    match err {
        CacheError::Fetch { error, retained } => {
            assert_eq!(error.kind, FailureKind::Network);
            assert_eq!(retained, Some(persisted.clone()));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(stored(&store, &key), Some(persisted));
}

#[tokio::test]
async fn fetch_error_without_cache_retains_nothing() {
    let key = channel(VideoMode::Regular);
    let store = shared(MemoryStore::new());
    let source = shared(FakeSource::new(vec![Err(network_error())]));
    let cache = cache_at(source, store.clone(), noon());

    let err = cache.load(&key, cache.first_page()).await.unwrap_err();

    assert!(matches!(err, CacheError::Fetch { retained: None, .. }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn empty_page_still_refreshes_timestamp() {
    let key = channel(VideoMode::Regular);
    let store = shared(MemoryStore::new());
    let persisted = persist(
        &store,
        &key,
        vec![video("a", 10, 1)],
        noon() - chrono::Duration::days(4),
    );
    let source = shared(FakeSource::new(vec![page(Vec::new())]));
    let cache = cache_at(source, store.clone(), noon());

    let loaded = cache.load(&key, cache.first_page()).await.unwrap();

    assert_eq!(loaded.items, persisted.items);
    assert_eq!(loaded.fetched_at, noon());
}

#[tokio::test]
async fn unreadable_cache_entry_is_refetched() {
    let key = channel(VideoMode::Regular);
    let store = shared(MemoryStore::new());
    store.set(&key.storage_key(), "{not json").unwrap();
    let source = shared(FakeSource::new(vec![page(vec![video("a", 1, 1)])]));
    let cache = cache_at(source.clone(), store.clone(), noon());

    let loaded = cache.load(&key, cache.first_page()).await.unwrap();

    assert_eq!(source.calls(), 1);
    assert_eq!(ids(&loaded), vec!["a"]);
    assert_eq!(stored(&store, &key), Some(loaded));
}

#[tokio::test]
async fn invalidate_drops_only_the_in_memory_view() {
    let regular = channel(VideoMode::Regular);
    let shorts = channel(VideoMode::Shorts);
    let store = shared(MemoryStore::new());
    persist(&store, &regular, vec![video("a", 1, 1)], noon());
    persist(&store, &shorts, vec![video("s", 1, 1)], noon());
    let source = shared(FakeSource::default());
    let cache = cache_at(source.clone(), store.clone(), noon());
    cache.load(&regular, cache.first_page()).await.unwrap();
    cache.load(&shorts, cache.first_page()).await.unwrap();

    cache.invalidate(&regular);

    assert_eq!(cache.view(&regular), None);
    assert!(cache.view(&shorts).is_some());
    assert!(stored(&store, &regular).is_some());
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn freshness_follows_the_clock() {
    let key = channel(VideoMode::Regular);
    let store = shared(MemoryStore::new());
    let now = Arc::new(Mutex::new(noon()));
    let clock_now = now.clone();
    let clock: Clock = Arc::new(move || *clock_now.lock().unwrap());
    let source = shared(FakeSource::new(vec![
        page(vec![video("a", 1, 1)]),
        page(vec![video("b", 2, 2)]),
    ]));
    let cache = ListCache::new(source.clone(), store, CacheSettings::default()).with_clock(clock);

    cache.load(&key, cache.first_page()).await.unwrap();
    *now.lock().unwrap() = noon() + chrono::Duration::days(2);
    cache.load(&key, cache.first_page()).await.unwrap();
    assert_eq!(source.calls(), 1);

    *now.lock().unwrap() = noon() + chrono::Duration::days(3) + chrono::Duration::seconds(1);
    let loaded = cache.load(&key, cache.first_page()).await.unwrap();
    assert_eq!(source.calls(), 2);
    assert_eq!(ids(&loaded), vec!["b", "a"]);
}

#[tokio::test]
async fn overlapping_loads_of_one_key_do_not_lose_pages() {
    let key = channel(VideoMode::Regular);
    let store = shared(MemoryStore::new());
    let source = shared(
        FakeSource::new(vec![
            page(vec![video("a", 1, 0)]),
            page(vec![video("b", 2, 0)]),
        ])
        .with_delay(Duration::from_millis(20)),
    );
    let cache = cache_at(source.clone(), store.clone(), noon());
    let next = PageRequest::Offset {
        offset: 20,
        limit: 20,
    };

    let (first, second) = tokio::join!(
        cache.load_more(&key, cache.first_page()),
        cache.load_more(&key, next)
    );
    first.unwrap();
    second.unwrap();

    let persisted = stored(&store, &key).unwrap();
    assert_eq!(ids(&persisted), vec!["b", "a"]);
}
