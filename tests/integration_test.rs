//! End-to-end tests over the in-memory backend
//!
//! Exercise complete garbage collection and optimization runs through the
//! public API, the same way the binaries drive them.


use std::sync::{Arc, Mutex};

use catalog_storage_gc::application::gc::{GarbageCollector, GcConfig, GcError, RunMode};
use catalog_storage_gc::application::optimizer::OptimizerError;
use catalog_storage_gc::application::ports::{FixedConfirmation, ImageTranscoder};
use catalog_storage_gc::domain::authorization::AuthorizationGate;
use catalog_storage_gc::infrastructure::imaging::WebpTranscoder;
use catalog_storage_gc::infrastructure::memory::{Faults, InMemoryBackend};
use catalog_storage_gc::value_objects::{BlobId, EntityKind, ImageFormat};

use test_fixtures::*;

fn guarded_gate() -> AuthorizationGate {
    AuthorizationGate::new(Some(SECRET))
}

#[tokio::test]
async fn test_confirmed_delete_removes_exactly_the_dangling_blob() {
    let backend = guarded_backend();
    let gc = garbage_collector(&backend, guarded_gate());

    let prompts = Mutex::new(Vec::new());
    let approve = |prompt: &str| {
        prompts.lock().unwrap().push(prompt.to_string());
        true
    };

    let summary = gc
        .run(RunMode::Delete, Some(SECRET), &approve)
        .await
        .unwrap();

    assert_eq!(summary.enumerated, 5);
    assert_eq!(summary.referenced, 4);
    assert_eq!(summary.dangling, 1);
    assert_eq!(summary.dangling_bytes, 500);
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.confirmed, Some(true));
    assert!(summary.is_success());

    assert!(!backend.contains_blob("e"));
    for id in ["a", "b", "c", "d"] {
        assert!(backend.contains_blob(id), "{} must survive", id);
    }

    let prompts = prompts.into_inner().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Delete 1 dangling blobs"));

    let second = gc
        .run(RunMode::DryRun, None, &FixedConfirmation(false))
        .await
        .unwrap();
    assert_eq!(second.dangling, 0);
}

#[tokio::test]
async fn test_dry_run_never_mutates() {
    let backend = guarded_backend();
    let gc = garbage_collector(&backend, guarded_gate());

    let summary = gc
        .run(RunMode::DryRun, None, &FixedConfirmation(true))
        .await
        .unwrap();

    assert_eq!(summary.dangling, 1);
    assert_eq!(summary.deleted, 0);
    assert_eq!(summary.confirmed, None);
    assert_eq!(backend.counters().deletes, 0);
    assert_eq!(backend.blob_ids().len(), 5);
}

#[tokio::test]
async fn test_reconciliation_is_idempotent() {
    let backend = guarded_backend();
    let gc = garbage_collector(&backend, guarded_gate());

    let first = gc.reconcile().await.unwrap();
    let second = gc.reconcile().await.unwrap();

    assert_eq!(first.dangling_ids(), second.dangling_ids());
    assert_eq!(first.dangling_ids(), vec![BlobId::new("e").unwrap()]);
}

#[tokio::test]
async fn test_declined_confirmation_deletes_nothing() {
    let backend = guarded_backend();
    let gc = garbage_collector(&backend, guarded_gate());

    let summary = gc
        .run(RunMode::Delete, Some(SECRET), &FixedConfirmation(false))
        .await
        .unwrap();

    assert_eq!(summary.confirmed, Some(false));
    assert_eq!(summary.deleted, 0);
    assert!(backend.contains_blob("e"));
}

#[tokio::test]
async fn test_wrong_or_missing_token_is_rejected() {
    let backend = guarded_backend();
    let gc = garbage_collector(&backend, guarded_gate());

    for token in [Some("not-the-secret"), None] {
        let err = gc
            .run(RunMode::Delete, token, &FixedConfirmation(true))
            .await
            .unwrap_err();
        assert!(matches!(err, GcError::Unauthorized { .. }));
    }

    assert_eq!(backend.counters().deletes, 0);
    assert_eq!(backend.counters().delete_batch_calls, 0);
    assert!(backend.contains_blob("e"));
}

#[tokio::test]
async fn test_refused_deletion_still_reports_reconciliation() {
    let backend = guarded_backend();
    let gc = garbage_collector(&backend, guarded_gate());

    let err = gc
        .run(RunMode::Delete, Some("not-the-secret"), &FixedConfirmation(true))
        .await
        .unwrap_err();

    let summary = err.partial_summary().unwrap();
    assert!(summary.refused);
    assert_eq!(summary.enumerated, SEEDED_BLOBS.len());
    assert_eq!(summary.referenced, 4);
    assert_eq!(summary.dangling, 1);
    assert_eq!(summary.dangling_bytes, 500);
    assert_eq!(summary.deleted, 0);
    assert!(!summary.is_success());
    assert!(summary.summary().contains("refused"));
    assert!(summary.details().contains("Deletion refused"));
    assert_eq!(backend.counters().deletes, 0);
}

#[tokio::test]
async fn test_open_gate_deletes_without_token() {
    let backend = seeded_backend(AuthorizationGate::open(), None);
    let gc = garbage_collector(&backend, AuthorizationGate::open());

    let summary = gc
        .run(RunMode::Delete, None, &FixedConfirmation(true))
        .await
        .unwrap();

    assert_eq!(summary.deleted, 1);
    assert!(!backend.contains_blob("e"));
}

#[tokio::test]
async fn test_metadata_failure_degrades_to_ids() {
    let backend = guarded_backend();
    backend.set_faults(Faults {
        fail_metadata: true,
        ..Faults::default()
    });
    let gc = garbage_collector(&backend, guarded_gate());

    let reconciliation = gc.reconcile().await.unwrap();
    assert!(!reconciliation.metadata_available);
    assert_eq!(reconciliation.dangling.len(), 1);
    assert_eq!(reconciliation.dangling[0].size_bytes, None);

    let summary = gc
        .run(RunMode::DryRun, None, &FixedConfirmation(false))
        .await
        .unwrap();
    assert_eq!(summary.dangling, 1);
    assert_eq!(summary.dangling_bytes, 0);
    assert_eq!(summary.warnings.len(), 1);
    assert!(summary.errors.is_empty());
    assert!(summary.is_success());
}

#[tokio::test]
async fn test_listing_failure_aborts_the_run() {
    let backend = guarded_backend();
    backend.set_faults(Faults {
        fail_list_call: Some(2),
        ..Faults::default()
    });
    let gc = GarbageCollector::new(&context(&backend, guarded_gate()), GcConfig::new(2, 10));

    let err = gc
        .run(RunMode::Delete, Some(SECRET), &FixedConfirmation(true))
        .await
        .unwrap_err();

    assert!(matches!(err, GcError::Enumeration(_)));
    assert_eq!(backend.counters().deletes, 0);
}

#[tokio::test]
async fn test_scan_failure_aborts_the_run() {
    let backend = guarded_backend();
    backend.set_faults(Faults {
        fail_scan_kind: Some(EntityKind::Review),
        ..Faults::default()
    });
    let gc = garbage_collector(&backend, guarded_gate());

    let err = gc
        .run(RunMode::Delete, Some(SECRET), &FixedConfirmation(true))
        .await
        .unwrap_err();

    // d is only referenced by the review; a partial scan would delete it
    assert!(matches!(err, GcError::Scan(_)));
    assert!(backend.contains_blob("d"));
    assert_eq!(backend.counters().deletes, 0);
}

#[tokio::test]
async fn test_small_pages_enumerate_everything() {
    let backend = guarded_backend();
    let gc = GarbageCollector::new(&context(&backend, guarded_gate()), GcConfig::new(2, 10));

    let reconciliation = gc.reconcile().await.unwrap();

    assert_eq!(reconciliation.enumerated, 5);
    assert_eq!(backend.counters().list_calls, 3);
}

fn unreferenced_backend(count: usize) -> Arc<InMemoryBackend> {
    let backend = InMemoryBackend::new();
    for i in 0..count {
        backend
            .insert_blob(&format!("x{:02}", i), vec![1u8; 10], Some("image/png"))
            .unwrap();
    }
    Arc::new(backend)
}

#[tokio::test]
async fn test_deletion_runs_in_batches_of_ten() {
    let backend = unreferenced_backend(25);
    let gc = garbage_collector(&backend, AuthorizationGate::open());

    let summary = gc
        .run(RunMode::Delete, None, &FixedConfirmation(true))
        .await
        .unwrap();

    assert_eq!(summary.deleted, 25);
    assert_eq!(backend.counters().delete_batch_calls, 3);
    assert!(backend.blob_ids().is_empty());
}

#[tokio::test]
async fn test_failed_batch_does_not_stop_later_batches() {
    let backend = unreferenced_backend(25);
    backend.set_faults(Faults {
        fail_delete_batch_call: Some(2),
        ..Faults::default()
    });
    let gc = garbage_collector(&backend, AuthorizationGate::open());

    let summary = gc
        .run(RunMode::Delete, None, &FixedConfirmation(true))
        .await
        .unwrap();

    assert_eq!(summary.deleted, 15);
    assert_eq!(summary.failed, 10);
    assert_eq!(summary.deleted + summary.failed, 25);
    assert_eq!(summary.errors.len(), 10);
    assert_eq!(backend.counters().delete_batch_calls, 3);
    assert_eq!(backend.blob_ids().len(), 10);
}

#[tokio::test]
async fn test_storage_stats() {
    let backend = guarded_backend();
    let gc = garbage_collector(&backend, guarded_gate());

    let stats = gc.storage_stats().await.unwrap();

    assert_eq!(stats.blob_count, 5);
    assert_eq!(stats.total_bytes, 1500);
    assert_eq!(stats.without_metadata, 0);
    assert_eq!(stats.by_content_type["image/jpeg"].blobs, 5);
    assert_eq!(backend.counters().deletes, 0);
}

/// Catalog with two PNG slots and one slot already in WebP
fn image_backend() -> Arc<InMemoryBackend> {
    let backend = InMemoryBackend::new();
    let webp = WebpTranscoder::new(80.0).encode(&png_bytes(8, 8)).unwrap();

    backend
        .insert_blob("png1", png_bytes(32, 32), Some("image/png"))
        .unwrap();
    backend
        .insert_blob("png2", png_bytes(16, 16), Some("image/png"))
        .unwrap();
    backend.insert_blob("webp1", webp, Some("image/webp")).unwrap();
    backend
        .set_record(EntityKind::Product, "p1", &["png1"])
        .unwrap();
    backend
        .set_record(EntityKind::Review, "r1", &["webp1", "png2"])
        .unwrap();
    Arc::new(backend)
}

#[tokio::test]
async fn test_optimizer_reencodes_and_repoints() {
    let backend = image_backend();
    let optimizer = optimizer(&backend, AuthorizationGate::open());

    let stats = optimizer.optimize_all(None).await.unwrap();

    assert_eq!(stats.processed, 3);
    assert_eq!(stats.optimized, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(
        stats.optimized + stats.skipped + stats.failed,
        stats.processed
    );
    assert_eq!(stats.per_kind[&EntityKind::Review].processed, 2);

    let product = backend.record_slots(EntityKind::Product, "p1").unwrap();
    assert_ne!(product[0].as_str(), "png1");
    assert_eq!(
        backend.blob_content_type(&product[0]).as_deref(),
        Some("image/webp")
    );
    let encoded = backend.blob_bytes(&product[0]).unwrap();
    assert_eq!(ImageFormat::sniff(&encoded), ImageFormat::Webp);

    let review = backend.record_slots(EntityKind::Review, "r1").unwrap();
    assert_eq!(review.len(), 2);
    assert_eq!(review[0].as_str(), "webp1");
    assert_ne!(review[1].as_str(), "png2");

    // Originals stay until the collector runs
    assert!(backend.contains_blob("png1"));
    assert!(backend.contains_blob("png2"));
}

#[tokio::test]
async fn test_replaced_originals_become_dangling() {
    let backend = image_backend();
    optimizer(&backend, AuthorizationGate::open())
        .optimize_all(None)
        .await
        .unwrap();

    let reconciliation = garbage_collector(&backend, AuthorizationGate::open())
        .reconcile()
        .await
        .unwrap();

    let dangling: Vec<&str> = reconciliation
        .dangling
        .iter()
        .map(|d| d.id.as_str())
        .collect();
    assert_eq!(dangling, vec!["png1", "png2"]);
}

#[tokio::test]
async fn test_optimizer_rerun_skips_everything() {
    let backend = image_backend();
    let optimizer = optimizer(&backend, AuthorizationGate::open());

    optimizer.optimize_all(None).await.unwrap();
    let uploads = backend.counters().uploads;
    let stats = optimizer.optimize_all(None).await.unwrap();

    assert_eq!(stats.skipped, 3);
    assert_eq!(stats.optimized, 0);
    assert_eq!(backend.counters().uploads, uploads);
}

#[tokio::test]
async fn test_optimizer_continues_past_broken_images() {
    let backend = image_backend();
    backend
        .insert_blob("broken", b"not an image".to_vec(), Some("image/png"))
        .unwrap();
    backend
        .set_record(EntityKind::Cafe, "c1", &["broken"])
        .unwrap();
    backend
        .set_record(EntityKind::User, "u1", &["missing"])
        .unwrap();

    let stats = optimizer(&backend, AuthorizationGate::open())
        .optimize_all(None)
        .await
        .unwrap();

    assert_eq!(stats.processed, 5);
    assert_eq!(stats.optimized, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.errors.len(), 2);
    assert_eq!(
        backend.record_slots(EntityKind::Cafe, "c1").unwrap()[0].as_str(),
        "broken"
    );
}

#[tokio::test]
async fn test_failed_listing_keeps_counts_of_earlier_kinds() {
    let backend = Arc::new(InMemoryBackend::new());
    backend
        .insert_blob("cafe-png", png_bytes(24, 24), Some("image/png"))
        .unwrap();
    backend
        .set_record(EntityKind::Cafe, "c1", &["cafe-png"])
        .unwrap();
    backend.set_faults(Faults {
        fail_scan_kind: Some(EntityKind::User),
        ..Faults::default()
    });

    let err = optimizer(&backend, AuthorizationGate::open())
        .optimize_all(None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OptimizerError::Scan { ref error, .. } if error.kind == EntityKind::User
    ));
    let partial = err.partial_stats().unwrap();
    assert_eq!(partial.processed, 1);
    assert_eq!(partial.optimized, 1);
    assert_eq!(partial.per_kind[&EntityKind::Cafe].optimized, 1);
    assert!(!partial.per_kind.contains_key(&EntityKind::User));

    assert_eq!(backend.counters().uploads, 1);
    assert_eq!(backend.counters().record_updates, 1);
    assert_ne!(
        backend.record_slots(EntityKind::Cafe, "c1").unwrap()[0].as_str(),
        "cafe-png"
    );
}

#[tokio::test]
async fn test_optimizer_rejects_wrong_token() {
    let backend = image_backend();
    let optimizer = optimizer(&backend, guarded_gate());

    let err = optimizer.optimize_all(Some("guess")).await.unwrap_err();

    assert!(matches!(err, OptimizerError::Unauthorized(_)));
    assert_eq!(backend.counters().uploads, 0);
    assert_eq!(backend.counters().downloads, 0);
}
