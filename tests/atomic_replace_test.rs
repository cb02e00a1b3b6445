mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::{MockCatalog, tagged_course};
use uwcourses::db::open_term_store;
use uwcourses::models::CourseKey;
use uwcourses::services::CatalogCache;

const SNAPSHOTS: [(&str, usize); 2] = [("A", 3), ("B", 7)];

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_observe_a_partial_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_term_store(dir.path(), common::TERM).await.expect("store");
    let catalog = MockCatalog::new();
    let cache = Arc::new(CatalogCache::new(
        store.clone(),
        catalog.clone(),
        Duration::ZERO,
        Duration::from_secs(1),
    ));
    let key = CourseKey::new(common::TERM, "CS", "135");
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let cache = cache.clone();
        let catalog = catalog.clone();
        let key = key.clone();
        let done = done.clone();
        tokio::spawn(async move {
            for round in 0..40 {
                let (tag, count) = SNAPSHOTS[round % 2];
                catalog.set_records("CS", "135", tagged_course(tag, count));
                cache.ensure_fresh(&key).await.expect("refresh");
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let mut readers = Vec::new();
    for _ in 0..3 {
        let store = store.clone();
        let key = key.clone();
        let done = done.clone();
        readers.push(tokio::spawn(async move {
            let mut observed = 0;
            while !done.load(Ordering::SeqCst) {
                if let Some(snapshot) = store.load_course_snapshot(&key).await.expect("read") {
                    let tag = snapshot.course.title.clone();
                    let (_, count) = SNAPSHOTS
                        .iter()
                        .find(|(t, _)| *t == tag)
                        .expect("known snapshot tag");
                    assert_eq!(snapshot.sections.len(), count + 1, "snapshot {}", tag);
                    for entry in snapshot.sections.iter().filter(|e| e.label().starts_with("TUT")) {
                        assert_eq!(entry.section.campus, tag);
                    }
                    observed += 1;
                }
                tokio::task::yield_now().await;
            }
            observed
        }));
    }

    writer.await.expect("writer");
    for reader in readers {
        reader.await.expect("reader");
    }

    let last = store
        .load_course_snapshot(&key)
        .await
        .expect("read")
        .expect("stored");
    assert_eq!(last.course.title, "B");
    assert_eq!(last.sections.len(), 8);
}
