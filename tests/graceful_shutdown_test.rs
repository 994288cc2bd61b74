//! Integration tests for graceful shutdown
//!
//! These tests verify that:
//! - Shutdown signals reach every phase through cloned receivers
//! - An interrupted run keeps what it committed
//! - Rerunning picks up the remaining work

use chrono::Utc;
use mockito::{Matcher, Server};
use prvotkar::adapters::gazetteer::RuianGazetteer;
use prvotkar::adapters::geocoder::NominatimGeocoder;
use prvotkar::adapters::registry::AresRegistry;
use prvotkar::adapters::store::SubjectStore;
use prvotkar::config::PrvotkarConfig;
use prvotkar::core::pacing::Pacing;
use prvotkar::core::status::{Phase, RunState};
use prvotkar::core::sync::{SyncCoordinator, SyncOptions, SyncParts};
use prvotkar::domain::{EntityType, MunicipalityId, RegistrationId, Subject};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

fn coordinator_for(
    server: &Server,
    store: Arc<SubjectStore>,
    shutdown: watch::Receiver<bool>,
) -> SyncCoordinator {
    let mut config = PrvotkarConfig::default();
    config.gazetteer.base_url = server.url();
    config.registry.base_url = server.url();
    config.geocoding.base_url = server.url();

    let parts = SyncParts {
        store,
        gazetteer: Arc::new(RuianGazetteer::new(&config.gazetteer).unwrap()),
        registry: Arc::new(AresRegistry::new(&config.registry).unwrap()),
        geocoder: Arc::new(NominatimGeocoder::new(&config.geocoding).unwrap()),
        pacing: Pacing::none(),
    };
    SyncCoordinator::from_parts(&config, parts, shutdown)
}

#[tokio::test]
async fn test_shutdown_signal_propagation() {
    let (shutdown_tx, shutdown_rx1) = watch::channel(false);
    let shutdown_rx2 = shutdown_rx1.clone();

    assert!(!*shutdown_rx1.borrow());
    assert!(!*shutdown_rx2.borrow());

    shutdown_tx.send(true).unwrap();

    assert!(*shutdown_rx1.borrow());
    assert!(*shutdown_rx2.borrow());
}

#[tokio::test]
async fn test_shutdown_before_start_touches_nothing() {
    let mut server = Server::new_async().await;
    let search = server
        .mock("POST", "/ekonomicke-subjekty/vyhledat")
        .expect(0)
        .create_async()
        .await;

    let store = Arc::new(SubjectStore::open_in_memory().unwrap());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    let coordinator = coordinator_for(&server, store.clone(), shutdown_rx);
    let summary = coordinator
        .execute(&SyncOptions {
            municipalities: vec![MunicipalityId::new(582786)],
            ..SyncOptions::default()
        })
        .await
        .unwrap();

    search.assert_async().await;
    assert!(summary.interrupted);
    assert!(!summary.is_successful());
    assert!(summary.geocode.is_none());
    assert_eq!(store.stats().unwrap().total, 0);
    assert_eq!(store.stats().unwrap().last_sync, None);

    let status = coordinator.subscribe().borrow().clone();
    assert_eq!(status.state, RunState::Done);
}

#[tokio::test]
async fn test_interrupted_geocoding_resumes() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/ekonomicke-subjekty/vyhledat")
        .with_status(200)
        .with_body(json!({"ekonomickeSubjekty": []}).to_string())
        .create_async()
        .await;
    let geocoder = server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!([{"lat": "50.08", "lon": "14.42"}]).to_string())
        .expect(6)
        .create_async()
        .await;

    let store = Arc::new(SubjectStore::open_in_memory().unwrap());
    let subjects: Vec<Subject> = ["1", "2", "3", "4", "5", "6"]
        .iter()
        .map(|ico| {
            let mut subject = Subject::new(RegistrationId::new(*ico).unwrap(), EntityType::Bd);
            subject.municipality = Some("Praha".to_string());
            subject
        })
        .collect();
    store.upsert_subjects(&subjects, Utc::now()).unwrap();

    let options = SyncOptions {
        entity_types: vec![EntityType::Bd],
        municipalities: vec![MunicipalityId::new(554782)],
        skip_geocode: false,
    };

    // Stop as soon as the geocoding phase reports progress
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let coordinator = coordinator_for(&server, store.clone(), shutdown_rx);
    let mut status = coordinator.subscribe();
    let stopper = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let (phase, processed) = {
                let snapshot = status.borrow_and_update();
                (snapshot.phase, snapshot.processed)
            };
            if phase == Phase::Geocoding && processed >= 1 {
                let _ = shutdown_tx.send(true);
                break;
            }
        }
    });

    let first = coordinator.execute(&options).await.unwrap();
    stopper.abort();
    assert!(first.interrupted);
    let geocoded = first.geocode.as_ref().unwrap();
    assert!(geocoded.processed >= 1);
    assert!(geocoded.remaining() > 0);

    // Committed results survive the interruption
    let pending_after_stop = store.stats().unwrap().geocode_pending;
    assert_eq!(pending_after_stop as usize, geocoded.remaining());
    assert_eq!(store.last_sync_run().unwrap(), None);

    let (_tx, rx) = watch::channel(false);
    let second = coordinator_for(&server, store.clone(), rx)
        .execute(&options)
        .await
        .unwrap();

    assert!(!second.interrupted);
    assert_eq!(store.stats().unwrap().geocode_pending, 0);
    assert_eq!(store.stats().unwrap().geocode_succeeded, 6);
    assert!(store.last_sync_run().unwrap().is_some());
    geocoder.assert_async().await;
}
