//! Integration tests for the refresh scheduler driven by a scripted source.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use forecast_core::{
    DashboardView, FetchError, ForecastSnapshot, ForecastSource, Location, Phase, RefreshScheduler,
    config::RefreshSettings,
};
use tokio::sync::{Notify, watch};

#[derive(Debug, Default)]
struct ScriptedSource {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    finished: AtomicUsize,
}

impl ScriptedSource {
    fn gate(&self, city: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(city.to_string(), Arc::clone(&notify));
        notify
    }

    fn set_failing(&self, city: &str, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(city.to_string());
        } else {
            set.remove(city);
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastSource for ScriptedSource {
    async fn fetch(&self, city: &str) -> Result<ForecastSnapshot, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let gate = self.gates.lock().unwrap().get(city).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failing = self.failing.lock().unwrap().contains(city);
        self.finished.fetch_add(1, Ordering::SeqCst);
        if failing {
            return Err(FetchError::MalformedResponse {
                endpoint: "weather",
                reason: "scripted failure".to_string(),
            });
        }

        let mut snap = ForecastSnapshot::unavailable(city, Utc::now());
        snap.location = Location {
            name: city.to_string(),
            country: "RU".to_string(),
        };
        snap.current.temp = call as i32;
        Ok(snap)
    }
}

fn settings(interval_secs: u64) -> RefreshSettings {
    RefreshSettings {
        interval_secs,
        tick_millis: 20,
        fetch_deadline_secs: 5,
    }
}

async fn wait_until(
    rx: &mut watch::Receiver<DashboardView>,
    what: &str,
    pred: impl FnMut(&DashboardView) -> bool,
) -> DashboardView {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
        .expect("scheduler stopped")
        .clone()
}

fn shows(view: &DashboardView, city: &str) -> bool {
    view.phase == Phase::Ready
        && view
            .snapshot
            .as_ref()
            .is_some_and(|s| s.location.name == city)
}

#[tokio::test]
async fn initial_load_publishes_ready_view() {
    let source = Arc::new(ScriptedSource::default());
    let handle = RefreshScheduler::spawn(source.clone(), settings(900), "Волгоград");
    let mut rx = handle.subscribe();

    let view = wait_until(&mut rx, "first snapshot", |v| shows(v, "Волгоград")).await;

    assert!(!view.is_loading);
    assert!(!view.is_error);
    assert!(
        view.refresh.remaining_label == "15:00" || view.refresh.remaining_label == "14:59",
        "unexpected label {}",
        view.refresh.remaining_label
    );
    assert_eq!(source.calls(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn city_change_wins_over_outstanding_fetch() {
    let source = Arc::new(ScriptedSource::default());
    let handle = RefreshScheduler::spawn(source.clone(), settings(900), "Волгоград");
    let mut rx = handle.subscribe();
    wait_until(&mut rx, "first snapshot", |v| shows(v, "Волгоград")).await;

    let slow = source.gate("Камышин");
    handle.select_city("Камышин").await.unwrap();
    handle.select_city("Урюпинск").await.unwrap();

    wait_until(&mut rx, "new city", |v| shows(v, "Урюпинск")).await;

    // Let the superseded request finish and give the loop time to process it.
    slow.notify_one();
    for _ in 0..100 {
        if source.finished.load(Ordering::SeqCst) >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let view = handle.view();
    assert_eq!(view.city, "Урюпинск");
    assert!(shows(&view, "Урюпинск"));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn manual_failure_shows_error_and_retry_recovers() {
    let source = Arc::new(ScriptedSource::default());
    source.set_failing("Михайловка", true);

    let handle = RefreshScheduler::spawn(source.clone(), settings(900), "Михайловка");
    let mut rx = handle.subscribe();

    let view = wait_until(&mut rx, "error state", |v| v.is_error).await;
    let snap = view.snapshot.expect("error snapshot");
    assert!(snap.is_unavailable());
    assert_eq!(snap.location.name, "Михайловка (Ошибка)");

    source.set_failing("Михайловка", false);
    handle.refresh().await.unwrap();

    let view = wait_until(&mut rx, "recovery", |v| shows(v, "Михайловка")).await;
    assert!(!view.is_error);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn background_failure_keeps_displayed_snapshot() {
    let source = Arc::new(ScriptedSource::default());
    let handle = RefreshScheduler::spawn(source.clone(), settings(1), "Волжский");
    let mut rx = handle.subscribe();

    let first = wait_until(&mut rx, "first snapshot", |v| shows(v, "Волжский")).await;
    source.set_failing("Волжский", true);

    // Wait for one background attempt to come back, then for the loop to apply it.
    for _ in 0..300 {
        if source.finished.load(Ordering::SeqCst) >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(source.calls() >= 2, "no background refresh happened");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let after = handle.view();
    assert_eq!(after.phase, Phase::Ready);
    assert!(!after.is_error);
    assert_eq!(after.snapshot, first.snapshot);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn background_success_replaces_snapshot() {
    let source = Arc::new(ScriptedSource::default());
    let handle = RefreshScheduler::spawn(source.clone(), settings(1), "Городище");
    let mut rx = handle.subscribe();

    let first = wait_until(&mut rx, "first snapshot", |v| shows(v, "Городище")).await;
    let first_temp = first.snapshot.as_ref().map(|s| s.current.temp);

    let next = wait_until(&mut rx, "refreshed snapshot", |v| {
        shows(v, "Городище") && v.snapshot.as_ref().map(|s| s.current.temp) != first_temp
    })
    .await;

    assert!(next.snapshot.unwrap().current.temp > first_temp.unwrap());

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn hung_fetch_is_bounded_by_deadline() {
    let source = Arc::new(ScriptedSource::default());
    let _never = source.gate("Суровикино");
    let settings = RefreshSettings {
        fetch_deadline_secs: 1,
        ..settings(900)
    };

    let handle = RefreshScheduler::spawn(source.clone(), settings, "Суровикино");
    let mut rx = handle.subscribe();

    let view = wait_until(&mut rx, "deadline", |v| v.is_error).await;
    assert!(view.snapshot.unwrap().is_unavailable());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn view_channel_closes_after_shutdown() {
    let source = Arc::new(ScriptedSource::default());
    let handle = RefreshScheduler::spawn(source, settings(900), "Волгоград");
    let rx = handle.subscribe();

    handle.shutdown().await.unwrap();
    assert!(rx.has_changed().is_err());
}
