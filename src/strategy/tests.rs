use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use super::*;
use crate::cache::testing::{CountingBackend, FaultyBackend};
use crate::cache::MemoryBackend;

const TABLE: &str = "example";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn registry() -> DirectiveRegistry {
    DirectiveRegistry::builder()
        .entity(TABLE, |e| {
            e.primary_get("get", "id")
                .reference_get("getByName", ["name"], "get")
                .uncached("getNoCache")
        })
        .build()
}

fn strategy<B: CacheBackend>(backend: B) -> RowStrategy<B> {
    init_tracing();
    RowStrategy::new(backend, DirectiveResolver::new(registry()), KeyBuilder::default())
}

fn fake_row() -> Row {
    json!({ "id": 1, "name": "lilei" }).as_object().unwrap().clone()
}

fn row(id: i64, name: &str) -> Row {
    json!({ "id": id, "name": name }).as_object().unwrap().clone()
}

async fn seed(backend: &MemoryBackend, key: &str, value: &str) {
    backend.set(key, value.to_string()).await.unwrap();
}

async fn seed_row(backend: &MemoryBackend, key: &str, row: &Row) {
    backend.set(key, serde_json::to_string(row).unwrap()).await.unwrap();
}

#[tokio::test]
async fn test_before_query_hit_through_pointer() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));
    let row = fake_row();

    seed(&backend, "dao:example:getByName:lilei", "dao:example:get:1").await;
    seed_row(&backend, "dao:example:get:1", &row).await;

    let cached = strategy.before_query(TABLE, "getByName", &[json!("lilei")]).await;
    assert_eq!(cached, Some(row));

    backend.delete("dao:example:get:1").await.unwrap();
    let cached = strategy.before_query(TABLE, "getByName", &[json!("lilei")]).await;
    assert_eq!(cached, None);

    let stats = strategy.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_before_query_dangling_pointer_misses() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    seed(&backend, "dao:example:getByName:lilei", "dao:example:get:1").await;

    let cached = strategy.before_query(TABLE, "getByName", &[json!("lilei")]).await;
    assert_eq!(cached, None);
    assert_eq!(strategy.stats().backend_faults, 0);
}

#[tokio::test]
async fn test_refilled_primary_does_not_revive_old_pointer() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    strategy.after_query(TABLE, "getByName", &[json!("lilei")], Some(&fake_row())).await;
    strategy.after_update(TABLE, "update", &[json!(1)]).await;
    strategy.after_query(TABLE, "get", &[json!(1)], Some(&row(1, "lucy"))).await;

    // The pointer for "lilei" now leads to a row named "lucy".
    assert!(backend.contains("dao:example:getByName:lilei"));
    assert_eq!(strategy.before_query(TABLE, "getByName", &[json!("lilei")]).await, None);
    assert_eq!(
        strategy.before_query(TABLE, "get", &[json!(1)]).await,
        Some(row(1, "lucy"))
    );

    strategy.after_query(TABLE, "getByName", &[json!("lucy")], Some(&row(1, "lucy"))).await;
    assert_eq!(
        strategy.before_query(TABLE, "getByName", &[json!("lucy")]).await,
        Some(row(1, "lucy"))
    );
}

#[tokio::test]
async fn test_reference_match_normalizes_scalars() {
    let backend = Arc::new(MemoryBackend::default());
    init_tracing();
    let registry = DirectiveRegistry::builder()
        .entity("order", |e| {
            e.primary_get("get", "id")
                .reference_get("getBySn", ["sn"], "get")
                .reference_get("getByPaid", ["paid"], "get")
        })
        .build();
    let strategy = RowStrategy::new(
        Arc::clone(&backend),
        DirectiveResolver::new(registry),
        KeyBuilder::default(),
    );
    let order = json!({ "id": 3, "sn": 2024, "paid": true }).as_object().unwrap().clone();

    strategy.after_query("order", "getBySn", &[json!("2024")], Some(&order)).await;
    assert_eq!(
        strategy.before_query("order", "getBySn", &[json!("2024")]).await,
        Some(order.clone())
    );

    // A boolean column is not matched by its string spelling.
    seed(&backend, "dao:order:getByPaid:true", "dao:order:get:3").await;
    assert_eq!(strategy.before_query("order", "getByPaid", &[json!("true")]).await, None);

    strategy.after_query("order", "getByPaid", &[json!(true)], Some(&order)).await;
    assert_eq!(
        strategy.before_query("order", "getByPaid", &[json!(true)]).await,
        Some(order)
    );
}

#[tokio::test]
async fn test_before_query_empty_backend_misses() {
    let strategy = strategy(MemoryBackend::default());
    assert_eq!(strategy.before_query(TABLE, "getByName", &[json!("lilei")]).await, None);
    assert_eq!(strategy.before_query(TABLE, "get", &[json!(1)]).await, None);
}

#[tokio::test]
async fn test_before_query_uncached_method() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    seed_row(&backend, "dao:example:getNoCache:1", &fake_row()).await;
    seed_row(&backend, "dao:example:get:1", &fake_row()).await;

    assert_eq!(strategy.before_query(TABLE, "getNoCache", &[json!(1)]).await, None);
    // Uncached lookups are not counted as misses.
    assert_eq!(strategy.stats().misses, 0);
}

#[tokio::test]
async fn test_before_query_undeclared_method_ignores_backend() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    seed(&backend, "dao:example:findByName:lilei", "dao:example:get:1").await;
    seed_row(&backend, "dao:example:get:1", &fake_row()).await;

    assert_eq!(strategy.before_query(TABLE, "findByName", &[json!("lilei")]).await, None);
}

#[tokio::test]
async fn test_primary_round_trip() {
    let strategy = strategy(MemoryBackend::default());
    let row = row(7, "hanmeimei");

    strategy.after_query(TABLE, "get", &[json!(7)], Some(&row)).await;

    assert_eq!(strategy.before_query(TABLE, "get", &[json!(7)]).await, Some(row));
}

#[tokio::test]
async fn test_primary_key_taken_from_result_identity() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));
    let row = row(7, "hanmeimei");

    // Identity passed as a string, row carries it as a number.
    strategy.after_query(TABLE, "get", &[json!("7")], Some(&row)).await;

    assert!(backend.contains("dao:example:get:7"));
    assert_eq!(strategy.before_query(TABLE, "get", &[json!("7")]).await, Some(row));
}

#[tokio::test]
async fn test_after_query_reference_populates_pointer_and_primary() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));
    let row = fake_row();

    strategy.after_query(TABLE, "getByName", &[json!("lilei")], Some(&row)).await;

    let pointer = backend.get("dao:example:getByName:lilei").await.unwrap();
    assert_eq!(pointer.as_deref(), Some("dao:example:get:1"));

    let stored = backend.get("dao:example:get:1").await.unwrap().unwrap();
    let stored: Row = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored, row);

    assert_eq!(
        strategy.before_query(TABLE, "getByName", &[json!("lilei")]).await,
        Some(row.clone())
    );
    assert_eq!(strategy.before_query(TABLE, "get", &[json!(1)]).await, Some(row));
}

#[tokio::test]
async fn test_after_query_uncached_writes_nothing() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    strategy.after_query(TABLE, "getNoCache", &[json!(1)], Some(&fake_row())).await;
    strategy.after_query(TABLE, "findByName", &[json!("lilei")], Some(&fake_row())).await;

    assert!(!backend.contains("dao:example:getNoCache:1"));
    assert!(!backend.contains("dao:example:findByName:lilei"));
    assert!(!backend.contains("dao:example:get:1"));
    assert_eq!(backend.entry_count(), 0);
}

#[tokio::test]
async fn test_after_query_never_caches_empty_result() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    strategy.after_query(TABLE, "getByName", &[json!("nobody")], None).await;
    strategy.after_query(TABLE, "get", &[json!(3)], Some(&Row::new())).await;

    assert_eq!(backend.entry_count(), 0);
}

#[tokio::test]
async fn test_after_query_row_without_identity() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));
    let nameless = json!({ "name": "lilei" }).as_object().unwrap().clone();

    strategy.after_query(TABLE, "getByName", &[json!("lilei")], Some(&nameless)).await;

    assert_eq!(backend.entry_count(), 0);
    assert_eq!(strategy.stats().metadata_faults, 1);
}

#[tokio::test]
async fn test_after_delete_invalidates_primary() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));
    let row = fake_row();

    strategy.after_query(TABLE, "getByName", &[json!("lilei")], Some(&row)).await;
    strategy.after_delete(TABLE, "delete", &[json!(1)]).await;

    assert!(!backend.contains("dao:example:get:1"));
    // The pointer stays but can no longer produce a hit.
    assert!(backend.contains("dao:example:getByName:lilei"));
    assert_eq!(strategy.before_query(TABLE, "get", &[json!(1)]).await, None);
    assert_eq!(strategy.before_query(TABLE, "getByName", &[json!("lilei")]).await, None);
    assert_eq!(strategy.stats().invalidations, 1);
}

#[tokio::test]
async fn test_after_update_invalidates_primary() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    strategy.after_query(TABLE, "get", &[json!(1)], Some(&fake_row())).await;
    strategy.after_update(TABLE, "update", &[json!(1), json!({ "name": "lucy" })]).await;

    assert_eq!(strategy.before_query(TABLE, "get", &[json!(1)]).await, None);
}

#[tokio::test]
async fn test_after_delete_without_identity_is_harmless() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));
    seed_row(&backend, "dao:example:get:1", &fake_row()).await;

    strategy.after_delete(TABLE, "delete", &[]).await;

    assert!(backend.contains("dao:example:get:1"));
    assert_eq!(strategy.stats().metadata_faults, 1);
}

#[tokio::test]
async fn test_after_wave_invalidates_listed_ids_only() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    for id in 1..=3 {
        strategy.after_query(TABLE, "get", &[json!(id)], Some(&row(id, "n"))).await;
    }

    strategy.after_wave(TABLE, "wave", &[json!([1, 2])], 2).await;

    assert!(!backend.contains("dao:example:get:1"));
    assert!(!backend.contains("dao:example:get:2"));
    assert!(backend.contains("dao:example:get:3"));
    assert_eq!(strategy.stats().invalidations, 2);
}

#[tokio::test]
async fn test_after_wave_ignores_affected_count() {
    let backend = Arc::new(CountingBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    strategy.after_wave(TABLE, "wave", &[json!([1, 2, 3])], 0).await;
    assert_eq!(backend.deletes(), 3);

    strategy.after_wave(TABLE, "wave", &[json!([4])], 100).await;
    assert_eq!(backend.deletes(), 4);
}

#[tokio::test]
async fn test_after_wave_with_bare_identity() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));
    seed_row(&backend, "dao:example:get:1", &fake_row()).await;

    strategy.after_wave(TABLE, "wave", &[json!(1)], 1).await;
    assert!(!backend.contains("dao:example:get:1"));

    strategy.after_wave(TABLE, "wave", &[], 0).await;
    assert_eq!(strategy.stats().metadata_faults, 1);
}

#[tokio::test]
async fn test_reference_lookup_reads_pointer_then_primary() {
    let backend = Arc::new(CountingBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    strategy.after_query(TABLE, "getByName", &[json!("lilei")], Some(&fake_row())).await;
    assert_eq!(backend.sets(), 2);

    strategy.before_query(TABLE, "getByName", &[json!("lilei")]).await;
    assert_eq!(backend.gets(), 2);

    strategy.before_query(TABLE, "get", &[json!(1)]).await;
    assert_eq!(backend.gets(), 3);
}

#[tokio::test]
async fn test_backend_faults_degrade_to_miss() {
    let strategy = strategy(FaultyBackend);

    assert_eq!(strategy.before_query(TABLE, "get", &[json!(1)]).await, None);
    assert_eq!(strategy.before_query(TABLE, "getByName", &[json!("lilei")]).await, None);

    strategy.after_query(TABLE, "getByName", &[json!("lilei")], Some(&fake_row())).await;
    strategy.after_delete(TABLE, "delete", &[json!(1)]).await;
    strategy.after_wave(TABLE, "wave", &[json!([1, 2])], 2).await;

    let stats = strategy.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 2);
    // 2 reads, 1 primary write (pointer write skipped), 3 deletes.
    assert_eq!(stats.backend_faults, 6);
    assert_eq!(stats.invalidations, 0);
}

#[tokio::test]
async fn test_corrupt_primary_entry_misses() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    seed(&backend, "dao:example:get:1", "not json").await;
    seed(&backend, "dao:example:get:2", "[1,2]").await;

    assert_eq!(strategy.before_query(TABLE, "get", &[json!(1)]).await, None);
    assert_eq!(strategy.before_query(TABLE, "get", &[json!(2)]).await, None);
    assert_eq!(strategy.stats().backend_faults, 2);
}

#[tokio::test]
async fn test_pointer_to_another_entity_is_ignored() {
    let backend = Arc::new(MemoryBackend::default());
    let strategy = strategy(Arc::clone(&backend));

    seed(&backend, "dao:example:getByName:lilei", "dao:user:get:1").await;
    seed_row(&backend, "dao:user:get:1", &fake_row()).await;

    assert_eq!(strategy.before_query(TABLE, "getByName", &[json!("lilei")]).await, None);
}

#[tokio::test]
async fn test_missing_identity_argument_misses() {
    let strategy = strategy(MemoryBackend::default());
    assert_eq!(strategy.before_query(TABLE, "get", &[]).await, None);
    assert_eq!(strategy.stats().metadata_faults, 1);
}

#[tokio::test]
async fn test_entities_do_not_share_entries() {
    let backend = Arc::new(MemoryBackend::default());
    init_tracing();
    let registry = DirectiveRegistry::builder()
        .entity("order", |e| e.primary_get("get", "id"))
        .entity("order_item", |e| e.primary_get("get", "id"))
        .build();
    let strategy = RowStrategy::new(
        Arc::clone(&backend),
        DirectiveResolver::new(registry),
        KeyBuilder::default(),
    );

    strategy.after_query("order", "get", &[json!(1)], Some(&fake_row())).await;

    assert!(strategy.before_query("order", "get", &[json!(1)]).await.is_some());
    assert!(strategy.before_query("order_item", "get", &[json!(1)]).await.is_none());
}

#[tokio::test]
async fn test_settings_namespace_and_kill_switch() {
    init_tracing();
    let backend = Arc::new(MemoryBackend::default());

    let settings = Settings {
        namespace: "biz".to_string(),
        ..Settings::default()
    };
    let strategy = RowStrategy::from_settings(Arc::clone(&backend), registry(), &settings);
    assert_eq!(strategy.keys().namespace(), "biz");
    assert!(strategy.resolver().is_enabled());
    strategy.after_query(TABLE, "get", &[json!(1)], Some(&fake_row())).await;
    assert!(backend.contains("biz:example:get:1"));

    let disabled = Settings {
        enabled: false,
        ..settings
    };
    let strategy = RowStrategy::from_settings(Arc::clone(&backend), registry(), &disabled);
    assert!(!strategy.resolver().is_enabled());
    assert_eq!(strategy.before_query(TABLE, "get", &[json!(1)]).await, None);

    // Invalidation still runs with caching switched off.
    strategy.after_delete(TABLE, "delete", &[json!(1)]).await;
    assert!(!backend.contains("biz:example:get:1"));
}
