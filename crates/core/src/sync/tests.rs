use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::*;
use crate::errors::{Error, Result, SyncError};
use crate::events::{ChangeFeed, DataChange};
use crate::fuels::FuelEvent;
use crate::preferences::{PreferencesRepositoryTrait, UserProfile};
use crate::vehicles::Vehicle;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeCloud {
    collections: Mutex<HashMap<CloudCollection, BTreeMap<String, Value>>>,
    commits: AtomicUsize,
    unavailable: AtomicBool,
}

impl FakeCloud {
    fn documents(&self, collection: CloudCollection) -> BTreeMap<String, Value> {
        self.collections
            .lock()
            .unwrap()
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    fn put(&self, collection: CloudCollection, id: &str, data: Value) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection)
            .or_default()
            .insert(id.to_string(), data);
    }

    fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SyncError::remote("service unavailable").into());
        }
        Ok(())
    }
}

#[async_trait]
impl CloudDocumentStore for FakeCloud {
    async fn list_documents(
        &self,
        _session: &AccountSession,
        collection: CloudCollection,
    ) -> Result<Vec<CloudDocument>> {
        self.check_available()?;
        Ok(self
            .documents(collection)
            .into_iter()
            .map(|(id, data)| CloudDocument { id, data })
            .collect())
    }

    async fn commit(&self, _session: &AccountSession, writes: Vec<CloudWrite>) -> Result<()> {
        self.check_available()?;
        let mut collections = self.collections.lock().unwrap();
        for write in writes {
            match write {
                CloudWrite::Set {
                    collection,
                    id,
                    data,
                } => {
                    collections.entry(collection).or_default().insert(id, data);
                }
                CloudWrite::Delete { collection, id } => {
                    collections.entry(collection).or_default().remove(&id);
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct FakeLocal {
    state: Mutex<MirrorSnapshot>,
}

impl FakeLocal {
    fn with(vehicles: Vec<Vehicle>, fuels: Vec<FuelEvent>) -> Self {
        Self {
            state: Mutex::new(MirrorSnapshot { vehicles, fuels }),
        }
    }

    fn snapshot(&self) -> MirrorSnapshot {
        let mut snapshot = self.state.lock().unwrap().clone();
        snapshot.vehicles.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.fuels.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot
    }
}

fn merge_records<T: MirrorRecord + Clone>(
    local: &mut Vec<T>,
    remote: Vec<T>,
    summary: &mut MergeSummary,
) {
    for record in remote {
        let existing = local
            .iter()
            .position(|row| row.record_id() == record.record_id());
        match resolve_lww(existing.map(|i| local[i].updated_at()), record.updated_at()) {
            MergeAction::Insert => {
                local.push(record);
                summary.inserted += 1;
            }
            MergeAction::Replace => {
                if let Some(i) = existing {
                    local[i] = record;
                }
                summary.replaced += 1;
            }
            MergeAction::KeepLocal => summary.kept_local += 1,
        }
    }
}

#[async_trait]
impl LocalMirrorStore for FakeLocal {
    fn load_snapshot(&self) -> Result<MirrorSnapshot> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn merge_remote(&self, remote: MirrorSnapshot) -> Result<MergeSummary> {
        let mut state = self.state.lock().unwrap();
        let mut summary = MergeSummary::default();
        merge_records(&mut state.vehicles, remote.vehicles, &mut summary);

        let (known, orphans): (Vec<_>, Vec<_>) = remote.fuels.into_iter().partition(|fuel| {
            state.vehicles.iter().any(|vehicle| vehicle.id == fuel.vehicle_id)
        });
        summary.skipped += orphans.len();
        merge_records(&mut state.fuels, known, &mut summary);
        Ok(summary)
    }
}

#[derive(Default)]
struct FakePreferences {
    user: Mutex<Option<UserProfile>>,
}

#[async_trait]
impl PreferencesRepositoryTrait for FakePreferences {
    fn get_locale(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set_locale(&self, _locale: &str) -> Result<()> {
        Ok(())
    }

    fn get_user(&self) -> Result<Option<UserProfile>> {
        Ok(self.user.lock().unwrap().clone())
    }

    async fn save_user(&self, profile: UserProfile) -> Result<()> {
        *self.user.lock().unwrap() = Some(profile);
        Ok(())
    }

    async fn clear_user(&self) -> Result<()> {
        self.user.lock().unwrap().take();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 6, 0, 0).unwrap()
}

fn session() -> AccountSession {
    AccountSession::new("uid-42", "token-42")
}

fn vehicle(id: &str, name: &str, updated_offset_secs: i64) -> Vehicle {
    Vehicle {
        id: id.to_string(),
        name: name.to_string(),
        manufacturer: "Honda".to_string(),
        model: "PCX".to_string(),
        year: 2023,
        max_fuel_capacity: 8.0,
        created_at: base_time(),
        updated_at: base_time() + ChronoDuration::seconds(updated_offset_secs),
    }
}

fn fuel(id: &str, vehicle_id: &str, fuel_added: f64) -> FuelEvent {
    FuelEvent {
        id: id.to_string(),
        vehicle_id: vehicle_id.to_string(),
        date: base_time(),
        odometer: 1200,
        trip: 200,
        fuel_added,
        fuel_type: "Pertamax".to_string(),
        price_per_liter: 12_950.0,
        total_cost: fuel_added * 12_950.0,
        fuel_economy: 0.1 + 0.2,
        cost_per_km: fuel_added * 12_950.0 / 200.0,
        fuel_remaining: 8.0 - fuel_added,
        created_at: base_time(),
        updated_at: base_time(),
    }
}

fn service(local: Arc<FakeLocal>, cloud: Arc<FakeCloud>) -> Arc<CloudSyncService> {
    Arc::new(CloudSyncService::new(local, cloud))
}

// ---------------------------------------------------------------------------
// Pull / push
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pull_requires_session() {
    let local = Arc::new(FakeLocal::with(vec![vehicle("v1", "Mine", 0)], vec![]));
    let cloud = Arc::new(FakeCloud::default());
    let svc = service(local.clone(), cloud);

    let err = svc.sync_from_cloud(None).await.unwrap_err();
    assert!(matches!(err, Error::Sync(SyncError::NotSignedIn)));
    assert_eq!(local.snapshot().vehicles.len(), 1);
}

#[tokio::test]
async fn backup_without_session_is_a_no_op() {
    let local = Arc::new(FakeLocal::with(vec![vehicle("v1", "Mine", 0)], vec![]));
    let cloud = Arc::new(FakeCloud::default());
    let svc = service(local, cloud.clone());

    assert_eq!(svc.backup_to_cloud(None).await.unwrap(), BackupOutcome::Skipped);
    assert_eq!(cloud.commit_count(), 0);
}

#[tokio::test]
async fn backup_replaces_remote_state_and_deletes_stale_documents() {
    let local = Arc::new(FakeLocal::with(
        vec![vehicle("v1", "Mine", 0)],
        vec![fuel("f1", "v1", 4.0)],
    ));
    let cloud = Arc::new(FakeCloud::default());
    cloud.put(
        CloudCollection::Vehicles,
        "gone",
        serde_json::to_value(vehicle("gone", "Sold", 0)).unwrap(),
    );
    cloud.put(
        CloudCollection::Fuels,
        "f-gone",
        serde_json::to_value(fuel("f-gone", "gone", 2.0)).unwrap(),
    );
    let svc = service(local, cloud.clone());

    let outcome = svc.backup_to_cloud(Some(&session())).await.unwrap();
    assert_eq!(
        outcome,
        BackupOutcome::Committed {
            deleted: 2,
            written: 2
        }
    );
    assert_eq!(cloud.commit_count(), 1);
    let vehicles = cloud.documents(CloudCollection::Vehicles);
    assert_eq!(vehicles.keys().collect::<Vec<_>>(), vec!["v1"]);
    assert_eq!(vehicles["v1"]["name"], "Mine");
    let fuels = cloud.documents(CloudCollection::Fuels);
    assert_eq!(fuels.keys().collect::<Vec<_>>(), vec!["f1"]);
}

#[tokio::test]
async fn push_then_pull_into_clean_store_reproduces_records() {
    let source = Arc::new(FakeLocal::with(
        vec![vehicle("v1", "Mine", 5), vehicle("v2", "Spare", 9)],
        vec![fuel("f1", "v1", 4.25), fuel("f2", "v2", 6.5)],
    ));
    let cloud = Arc::new(FakeCloud::default());
    service(source.clone(), cloud.clone())
        .backup_to_cloud(Some(&session()))
        .await
        .unwrap();

    let target = Arc::new(FakeLocal::default());
    let summary = service(target.clone(), cloud)
        .sync_from_cloud(Some(&session()))
        .await
        .unwrap();

    assert_eq!(summary.inserted, 4);
    assert_eq!(target.snapshot(), source.snapshot());
}

#[tokio::test]
async fn pull_twice_is_idempotent() {
    let cloud = Arc::new(FakeCloud::default());
    cloud.put(
        CloudCollection::Vehicles,
        "v1",
        serde_json::to_value(vehicle("v1", "Remote", 0)).unwrap(),
    );
    cloud.put(
        CloudCollection::Fuels,
        "f1",
        serde_json::to_value(fuel("f1", "v1", 3.0)).unwrap(),
    );
    let local = Arc::new(FakeLocal::default());
    let svc = service(local.clone(), cloud);

    let first = svc.sync_from_cloud(Some(&session())).await.unwrap();
    let after_first = local.snapshot();
    let second = svc.sync_from_cloud(Some(&session())).await.unwrap();

    assert_eq!(first.inserted, 2);
    assert!(!second.changed());
    assert_eq!(second.kept_local, 2);
    assert_eq!(local.snapshot(), after_first);
}

#[tokio::test]
async fn newer_remote_wins_and_older_remote_loses() {
    let cloud = Arc::new(FakeCloud::default());
    cloud.put(
        CloudCollection::Vehicles,
        "v1",
        serde_json::to_value(vehicle("v1", "Remote newer", 60)).unwrap(),
    );
    cloud.put(
        CloudCollection::Vehicles,
        "v2",
        serde_json::to_value(vehicle("v2", "Remote older", 0)).unwrap(),
    );
    let local = Arc::new(FakeLocal::with(
        vec![vehicle("v1", "Local older", 30), vehicle("v2", "Local newer", 30)],
        vec![],
    ));

    let summary = service(local.clone(), cloud)
        .sync_from_cloud(Some(&session()))
        .await
        .unwrap();

    assert_eq!(summary.replaced, 1);
    assert_eq!(summary.kept_local, 1);
    let names: Vec<_> = local
        .snapshot()
        .vehicles
        .into_iter()
        .map(|v| v.name)
        .collect();
    assert_eq!(names, vec!["Remote newer", "Local newer"]);
}

#[tokio::test]
async fn orphan_remote_fuel_is_skipped() {
    let cloud = Arc::new(FakeCloud::default());
    cloud.put(
        CloudCollection::Fuels,
        "f1",
        serde_json::to_value(fuel("f1", "nowhere", 3.0)).unwrap(),
    );
    let local = Arc::new(FakeLocal::default());

    let summary = service(local.clone(), cloud)
        .sync_from_cloud(Some(&session()))
        .await
        .unwrap();
    assert_eq!(summary.skipped, 1);
    assert!(local.snapshot().fuels.is_empty());
}

#[tokio::test]
async fn invalid_document_aborts_pull_before_merging() {
    let cloud = Arc::new(FakeCloud::default());
    cloud.put(
        CloudCollection::Vehicles,
        "v1",
        serde_json::to_value(vehicle("v1", "Fine", 0)).unwrap(),
    );
    cloud.put(
        CloudCollection::Fuels,
        "f1",
        serde_json::json!({ "id": "f2", "vehicleId": "v1" }),
    );
    let local = Arc::new(FakeLocal::default());

    let err = service(local.clone(), cloud)
        .sync_from_cloud(Some(&session()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Sync(SyncError::InvalidDocument { .. })));
    assert_eq!(local.snapshot(), MirrorSnapshot::default());
}

#[tokio::test]
async fn remote_failure_is_reported_and_nothing_changes() {
    let cloud = Arc::new(FakeCloud::default());
    cloud.unavailable.store(true, Ordering::SeqCst);
    let local = Arc::new(FakeLocal::with(vec![vehicle("v1", "Mine", 0)], vec![]));
    let svc = service(local.clone(), cloud.clone());

    let pull = svc.sync_from_cloud(Some(&session())).await.unwrap_err();
    assert!(pull.is_sync_failure());
    let push = svc.backup_to_cloud(Some(&session())).await.unwrap_err();
    assert!(matches!(push, Error::Sync(SyncError::Remote(_))));
    assert_eq!(local.snapshot().vehicles.len(), 1);
    assert_eq!(cloud.commit_count(), 0);
}

#[tokio::test]
async fn float_fields_survive_the_round_trip_exactly() {
    let original = fuel("f1", "v1", 4.33);
    let source = Arc::new(FakeLocal::with(vec![vehicle("v1", "Mine", 0)], vec![original.clone()]));
    let cloud = Arc::new(FakeCloud::default());
    service(source, cloud.clone())
        .backup_to_cloud(Some(&session()))
        .await
        .unwrap();

    let target = Arc::new(FakeLocal::default());
    service(target.clone(), cloud)
        .sync_from_cloud(Some(&session()))
        .await
        .unwrap();
    let pulled = &target.snapshot().fuels[0];
    assert_eq!(pulled.fuel_economy.to_bits(), original.fuel_economy.to_bits());
    assert_eq!(pulled.cost_per_km.to_bits(), original.cost_per_km.to_bits());
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

struct ObserverHarness {
    feed: ChangeFeed,
    cloud: Arc<FakeCloud>,
    sessions: Arc<SessionStore>,
    observer: SyncObserver,
}

fn observer_harness(signed_in: bool) -> ObserverHarness {
    let feed = ChangeFeed::new();
    let cloud = Arc::new(FakeCloud::default());
    let local = Arc::new(FakeLocal::with(vec![vehicle("v1", "Mine", 0)], vec![]));
    let sessions = Arc::new(SessionStore::new());
    if signed_in {
        sessions.set(session());
    }
    let observer = SyncObserver::with_debounce(
        service(local, cloud.clone()),
        sessions.clone(),
        feed.clone(),
        Duration::from_millis(2000),
    );
    ObserverHarness {
        feed,
        cloud,
        sessions,
        observer,
    }
}

#[tokio::test(start_paused = true)]
async fn burst_of_changes_pushes_once_after_quiet_period() {
    let h = observer_harness(true);
    h.observer.start_syncing().await;

    for _ in 0..5 {
        h.feed.notify(DataChange::Fuels);
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    assert_eq!(h.cloud.commit_count(), 0);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(h.cloud.commit_count(), 0);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(h.cloud.commit_count(), 1);
    assert!(h.observer.is_syncing().await);
}

#[tokio::test(start_paused = true)]
async fn existing_records_are_pushed_once_after_start() {
    let h = observer_harness(true);
    h.observer.start_syncing().await;

    tokio::time::sleep(Duration::from_millis(1900)).await;
    assert_eq!(h.cloud.commit_count(), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.cloud.commit_count(), 1);
    let remote: Vec<String> = h
        .cloud
        .documents(CloudCollection::Vehicles)
        .into_keys()
        .collect();
    assert_eq!(remote, vec!["v1".to_string()]);

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(h.cloud.commit_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn signed_out_observer_never_pushes() {
    let h = observer_harness(false);
    h.observer.start_syncing().await;

    h.feed.notify(DataChange::Vehicles);
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(h.cloud.commit_count(), 0);

    h.sessions.set(session());
    h.feed.notify(DataChange::Vehicles);
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(h.cloud.commit_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_pending_debounce() {
    let h = observer_harness(true);
    h.observer.start_syncing().await;

    h.feed.notify(DataChange::Vehicles);
    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.observer.stop_syncing().await;
    assert!(!h.observer.is_syncing().await);

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(h.cloud.commit_count(), 0);
    assert_eq!(h.feed.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn restarting_replaces_previous_run() {
    let h = observer_harness(true);
    h.observer.start_syncing().await;
    h.observer.start_syncing().await;

    h.feed.notify(DataChange::Fuels);
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(h.cloud.commit_count(), 1);
}

// ---------------------------------------------------------------------------
// Account flow
// ---------------------------------------------------------------------------

struct AccountHarness {
    cloud: Arc<FakeCloud>,
    preferences: Arc<FakePreferences>,
    observer: Arc<SyncObserver>,
    sessions: Arc<SessionStore>,
    account: AccountSync,
}

fn account_harness() -> AccountHarness {
    let cloud = Arc::new(FakeCloud::default());
    let local = Arc::new(FakeLocal::default());
    let preferences = Arc::new(FakePreferences::default());
    let sessions = Arc::new(SessionStore::new());
    let cloud_sync = service(local, cloud.clone());
    let observer = Arc::new(SyncObserver::new(
        cloud_sync.clone(),
        sessions.clone(),
        ChangeFeed::new(),
    ));
    let account = AccountSync::new(
        sessions.clone(),
        preferences.clone(),
        cloud_sync,
        observer.clone(),
    );
    AccountHarness {
        cloud,
        preferences,
        observer,
        sessions,
        account,
    }
}

fn profile() -> UserProfile {
    UserProfile {
        display_name: "Rei".to_string(),
        email: "rei@example.com".to_string(),
        photo_url: None,
    }
}

#[tokio::test]
async fn sign_in_pulls_then_observes() {
    let h = account_harness();
    h.cloud.put(
        CloudCollection::Vehicles,
        "v1",
        serde_json::to_value(vehicle("v1", "Remote", 0)).unwrap(),
    );

    let summary = h.account.sign_in(session(), profile()).await.unwrap();
    assert_eq!(summary.inserted, 1);
    assert!(h.observer.is_syncing().await);
    assert_eq!(h.preferences.get_user().unwrap(), Some(profile()));
}

#[tokio::test]
async fn failed_pull_on_sign_in_does_not_start_observer() {
    let h = account_harness();
    h.cloud.unavailable.store(true, Ordering::SeqCst);

    assert!(h.account.sign_in(session(), profile()).await.is_err());
    assert!(!h.observer.is_syncing().await);
}

#[tokio::test]
async fn sign_out_clears_profile_and_stops() {
    let h = account_harness();
    h.account.sign_in(session(), profile()).await.unwrap();

    h.account.sign_out().await.unwrap();
    assert!(!h.observer.is_syncing().await);
    assert!(h.preferences.get_user().unwrap().is_none());
    assert!(h.sessions.current_session().is_none());
}

#[tokio::test]
async fn resume_needs_complete_profile_and_session() {
    let h = account_harness();
    assert_eq!(h.account.resume_on_launch().await.unwrap(), None);

    h.preferences
        .save_user(UserProfile {
            email: String::new(),
            ..profile()
        })
        .await
        .unwrap();
    h.sessions.set(session());
    assert_eq!(h.account.resume_on_launch().await.unwrap(), None);
    assert!(!h.observer.is_syncing().await);

    h.preferences.save_user(profile()).await.unwrap();
    assert!(h.account.resume_on_launch().await.unwrap().is_some());
    assert!(h.observer.is_syncing().await);
}
