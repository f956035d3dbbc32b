//! Relay behavior over time, driven through the public handle.
//!
//! Time is paused so `tokio::time::advance` moves the relay's clock.

use std::time::Duration;

use sharer_core::config::RelayConfig;
use sharer_core::Halves;
use sharer_relay::spawn;

const MAX_AGE: Duration = Duration::from_secs(300);

fn config() -> RelayConfig {
    RelayConfig {
        max_age_secs: MAX_AGE.as_secs(),
        queue_depth: 8,
    }
}

#[tokio::test(start_paused = true)]
async fn data_only_slot_expires_for_get_all() {
    let relay = spawn(&config());
    relay.store_data("encrypted-half").await.unwrap();

    tokio::time::advance(MAX_AGE + Duration::from_secs(1)).await;

    assert_eq!(relay.get_all().await.unwrap(), Halves::default());
}

#[tokio::test(start_paused = true)]
async fn eviction_is_sticky() {
    let relay = spawn(&config());
    relay.store_key("key-half").await.unwrap();

    tokio::time::advance(MAX_AGE + Duration::from_secs(1)).await;
    assert_eq!(relay.get_key().await.unwrap(), None);

    // Later reads do not resurrect the evicted value.
    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(relay.get_key().await.unwrap(), None);
    assert_eq!(relay.get_all().await.unwrap(), Halves::default());
}

#[tokio::test(start_paused = true)]
async fn values_survive_until_max_age() {
    let relay = spawn(&config());
    relay.store_data("d").await.unwrap();

    tokio::time::advance(MAX_AGE - Duration::from_secs(1)).await;
    assert_eq!(relay.get_data().await.unwrap().as_deref(), Some("d"));
}

#[tokio::test(start_paused = true)]
async fn write_after_eviction_starts_fresh() {
    let relay = spawn(&config());
    relay.store_data("old").await.unwrap();
    relay.store_key("old-key").await.unwrap();

    tokio::time::advance(MAX_AGE * 2).await;
    relay.store_data("new").await.unwrap();

    let halves = relay.get_all().await.unwrap();
    assert_eq!(halves.data.as_deref(), Some("new"));
    assert_eq!(halves.key, None, "expired key must not come back with a new write");
}

#[tokio::test(start_paused = true)]
async fn write_to_other_half_after_expiry_does_not_revive_stale_half() {
    let relay = spawn(&config());
    relay.store_data("stale-data").await.unwrap();

    tokio::time::advance(MAX_AGE * 2).await;
    relay.store_key("fresh-key").await.unwrap();

    let halves = relay.get_all().await.unwrap();
    assert_eq!(halves.data, None);
    assert_eq!(halves.key.as_deref(), Some("fresh-key"));
}

#[tokio::test]
async fn last_write_wins() {
    let relay = spawn(&config());
    relay.store_data("first").await.unwrap();
    relay.store_data("second").await.unwrap();

    assert_eq!(relay.get_data().await.unwrap().as_deref(), Some("second"));
}

#[tokio::test]
async fn concurrent_writers_never_interleave() {
    let relay = spawn(&config());

    let mut tasks = Vec::new();
    for i in 0..32 {
        let relay = relay.clone();
        tasks.push(tokio::spawn(async move {
            relay.store_data(&format!("payload-{i:02}")).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let data = relay.get_data().await.unwrap().unwrap();
    let n: usize = data.strip_prefix("payload-").unwrap().parse().unwrap();
    assert!(n < 32, "stored value must be exactly one writer's payload");
}

#[tokio::test]
async fn relay_outlives_individual_page_handles() {
    let relay = spawn(&config());

    {
        let first_page = relay.clone();
        first_page.store_data("from-first-load").await.unwrap();
    }

    let second_page = relay.clone();
    second_page.store_key("from-second-load").await.unwrap();

    let halves = second_page.get_all().await.unwrap();
    assert_eq!(halves.data.as_deref(), Some("from-first-load"));
    assert_eq!(halves.key.as_deref(), Some("from-second-load"));
}
