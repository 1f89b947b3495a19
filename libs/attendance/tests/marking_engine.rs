//! Marking engine behaviour against the in-memory store

mod support;

use attendance::AttendanceConfig;
use attendance::error::{
    AttendanceError, Conflict, Integrity, InvalidInput, InvalidState, Mismatch, Missing,
};
use attendance::geo::{GeoPoint, haversine_distance};
use attendance::marking::MarkingEngine;
use attendance::memory::MemoryStore;
use attendance::models::{AttendanceRecord, MarkRequest, SessionCode};
use attendance::store::{AppendOutcome, LedgerFilter, LedgerStore};
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::error::DatabaseResult;
use std::sync::Arc;
use support::{CAMPUS, insert_record, insert_session, session, student};
use tokio::sync::Barrier;

type Engine = MarkingEngine<MemoryStore, MemoryStore, MemoryStore>;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 4, 0, 0).unwrap()
}

fn engine(store: &MemoryStore, config: AttendanceConfig) -> Engine {
    MarkingEngine::new(store.clone(), store.clone(), store.clone(), config)
}

fn request(student_id: &str, code: &str, subject: &str, device: &str) -> MarkRequest {
    MarkRequest {
        student_id: student_id.into(),
        code: code.into(),
        subject: subject.into(),
        device_fingerprint: device.into(),
        lat: Some(CAMPUS.lat),
        lng: Some(CAMPUS.lng),
    }
}

async fn setup() -> (MemoryStore, SessionCode) {
    let store = MemoryStore::new();
    store.add_student(student("210001", "Asha Rao", "A")).await;
    store.add_student(student("210002", "Vikram Sen", "A")).await;
    let dsp = session("482913", "EMP01", "dsp", start());
    insert_session(&store, &dsp).await;
    (store, dsp)
}

#[tokio::test]
async fn test_mark_success_appends_record() {
    let (store, dsp) = setup().await;
    let engine = engine(&store, AttendanceConfig::default());
    let now = start() + Duration::minutes(3);

    let record = engine
        .mark_at(&request(" 210001 ", "482913", "DSP", "fp-1"), now)
        .await
        .unwrap();

    assert_eq!(record.student_id, "210001");
    assert_eq!(record.student_name, "Asha Rao");
    assert_eq!(record.subject, "dsp");
    assert_eq!(record.session_code, dsp.code);
    assert_eq!(record.marked_at, now);
    assert_eq!(store.records().await, vec![record]);
}

#[tokio::test]
async fn test_unknown_student_and_code() {
    let (store, _) = setup().await;
    let engine = engine(&store, AttendanceConfig::default());
    let now = start();

    let err = engine
        .mark_at(&request("999999", "482913", "dsp", "fp-1"), now)
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::NotFound(Missing::Student)));

    let err = engine
        .mark_at(&request("210001", "000000", "dsp", "fp-1"), now)
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::NotFound(Missing::Session)));
    assert!(store.records().await.is_empty());
}

#[tokio::test]
async fn test_window_bounds_are_inclusive() {
    let (store, dsp) = setup().await;
    let engine = engine(&store, AttendanceConfig::default());

    let too_early = dsp.start_time - Duration::milliseconds(1);
    let err = engine
        .mark_at(&request("210001", "482913", "dsp", "fp-1"), too_early)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AttendanceError::InvalidState(InvalidState::SessionExpiredOrNotStarted)
    ));

    let too_late = dsp.end_time + Duration::milliseconds(1);
    let err = engine
        .mark_at(&request("210001", "482913", "dsp", "fp-1"), too_late)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AttendanceError::InvalidState(InvalidState::SessionExpiredOrNotStarted)
    ));

    engine
        .mark_at(&request("210001", "482913", "dsp", "fp-1"), dsp.start_time)
        .await
        .unwrap();
    engine
        .mark_at(&request("210002", "482913", "dsp", "fp-2"), dsp.end_time)
        .await
        .unwrap();
    assert_eq!(store.records().await.len(), 2);
}

#[tokio::test]
async fn test_subject_must_match_code() {
    let (store, _) = setup().await;
    let engine = engine(&store, AttendanceConfig::default());

    let err = engine
        .mark_at(&request("210001", "482913", "vlsi", "fp-1"), start())
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Mismatch(Mismatch::Subject)));

    engine
        .mark_at(&request("210001", "482913", "  Dsp ", "fp-1"), start())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_second_mark_is_rejected() {
    let (store, _) = setup().await;
    let engine = engine(&store, AttendanceConfig::default());
    let now = start() + Duration::minutes(1);

    engine
        .mark_at(&request("210001", "482913", "dsp", "fp-1"), now)
        .await
        .unwrap();
    let err = engine
        .mark_at(&request("210001", "482913", "dsp", "fp-9"), now)
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::Conflict(Conflict::AlreadyMarked)));
    assert_eq!(store.records().await.len(), 1);
}

#[tokio::test]
async fn test_location_is_required() {
    let (store, _) = setup().await;
    let engine = engine(&store, AttendanceConfig::default());

    let mut req = request("210001", "482913", "dsp", "fp-1");
    req.lng = None;
    let err = engine.mark_at(&req, start()).await.unwrap_err();

    assert!(matches!(
        err,
        AttendanceError::InvalidInput(InvalidInput::LocationRequired)
    ));
    assert!(store.records().await.is_empty());
}

#[tokio::test]
async fn test_code_without_issuer_location_is_an_integrity_fault() {
    let (store, _) = setup().await;
    let mut legacy = session("777001", "EMP01", "dsp", start());
    legacy.issuer_location = None;
    insert_session(&store, &legacy).await;
    let engine = engine(&store, AttendanceConfig::default());

    let err = engine
        .mark_at(&request("210001", "777001", "dsp", "fp-1"), start())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AttendanceError::Internal(Integrity::NoIssuerLocation { ref code }) if code == "777001"
    ));
}

#[tokio::test]
async fn test_geofence_boundary() {
    let (store, _) = setup().await;
    let spot = GeoPoint::new(CAMPUS.lat + 0.0009, CAMPUS.lng);
    let distance = haversine_distance(CAMPUS.lat, CAMPUS.lng, spot.lat, spot.lng);

    let mut req = request("210001", "482913", "dsp", "fp-1");
    req.lat = Some(spot.lat);
    req.lng = Some(spot.lng);

    let strict = engine(
        &store,
        AttendanceConfig {
            geofence_radius_m: distance - 0.01,
            ..Default::default()
        },
    );
    let err = strict.mark_at(&req, start()).await.unwrap_err();
    assert!(matches!(
        err,
        AttendanceError::InvalidState(InvalidState::TooFarFromIssuer { .. })
    ));

    let exact = engine(
        &store,
        AttendanceConfig {
            geofence_radius_m: distance,
            ..Default::default()
        },
    );
    exact.mark_at(&req, start()).await.unwrap();
}

#[tokio::test]
async fn test_device_reuse_window() {
    let (store, _) = setup().await;
    let engine = engine(&store, AttendanceConfig::default());
    let first_mark = start() + Duration::minutes(5);

    engine
        .mark_at(&request("210001", "482913", "dsp", "shared-phone"), first_mark)
        .await
        .unwrap();

    // later classes on other codes, marked from the same device by another student
    let at_49 = first_mark + Duration::minutes(49);
    insert_session(&store, &session("500049", "EMP02", "vlsi", at_49)).await;
    let err = engine
        .mark_at(&request("210002", "500049", "vlsi", "shared-phone"), at_49)
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Conflict(Conflict::DeviceReuse)));

    let at_50 = first_mark + Duration::minutes(50);
    insert_session(&store, &session("500050", "EMP02", "vlsi", at_50)).await;
    let err = engine
        .mark_at(&request("210002", "500050", "vlsi", "shared-phone"), at_50)
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Conflict(Conflict::DeviceReuse)));

    let at_51 = first_mark + Duration::minutes(51);
    insert_session(&store, &session("500051", "EMP02", "vlsi", at_51)).await;
    engine
        .mark_at(&request("210002", "500051", "vlsi", "shared-phone"), at_51)
        .await
        .unwrap();

    assert_eq!(store.records().await.len(), 2);
}

#[tokio::test]
async fn test_antipodal_student_is_rejected() {
    let store = MemoryStore::new();
    store.add_student(student("210001", "Asha Rao", "A")).await;
    let mut far = session("600001", "EMP01", "dsp", start());
    far.issuer_location = Some(GeoPoint::new(-79.9433, 10.0091));
    insert_session(&store, &far).await;
    let engine = engine(&store, AttendanceConfig::default());

    let mut req = request("210001", "600001", "dsp", "fp-1");
    req.lat = Some(79.9433);
    req.lng = Some(-169.9909);
    let err = engine.mark_at(&req, start()).await.unwrap_err();

    match err {
        AttendanceError::InvalidState(InvalidState::TooFarFromIssuer { distance_m, .. }) => {
            assert!(distance_m.is_finite());
            assert!(distance_m > 20_000_000.0, "got {distance_m}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(store.records().await.is_empty());
}

#[tokio::test]
async fn test_checks_run_in_order() {
    let (store, dsp) = setup().await;
    let mut bare = session("777002", "EMP01", "dsp", start());
    bare.issuer_location = None;
    insert_session(&store, &bare).await;
    insert_record(&store, "210002", &dsp, start() + Duration::minutes(1)).await;
    let engine = engine(&store, AttendanceConfig::default());
    let now = start() + Duration::minutes(2);

    // unknown student beats unknown code
    let err = engine
        .mark_at(&request("999999", "000000", "dsp", "fp-a"), now)
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::NotFound(Missing::Student)));

    // expired window beats subject mismatch
    let err = engine
        .mark_at(&request("210001", "482913", "vlsi", "fp-a"), dsp.end_time + Duration::seconds(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AttendanceError::InvalidState(InvalidState::SessionExpiredOrNotStarted)
    ));

    // subject mismatch beats already marked
    let err = engine
        .mark_at(&request("210002", "482913", "vlsi", "fp-a"), now)
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Mismatch(Mismatch::Subject)));

    // already marked beats missing location
    let mut req = request("210002", "482913", "dsp", "fp-a");
    req.lat = None;
    let err = engine.mark_at(&req, now).await.unwrap_err();
    assert!(matches!(err, AttendanceError::Conflict(Conflict::AlreadyMarked)));

    // missing location beats missing issuer location
    let mut req = request("210001", "777002", "dsp", "fp-a");
    req.lng = None;
    let err = engine.mark_at(&req, now).await.unwrap_err();
    assert!(matches!(
        err,
        AttendanceError::InvalidInput(InvalidInput::LocationRequired)
    ));

    // missing issuer location beats device reuse
    let device_of_210002 = format!("210002-{}", dsp.code);
    let err = engine
        .mark_at(&request("210001", "777002", "dsp", &device_of_210002), now)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AttendanceError::Internal(Integrity::NoIssuerLocation { .. })
    ));

    // geofence beats device reuse
    let mut req = request("210001", "482913", "dsp", &device_of_210002);
    req.lat = Some(CAMPUS.lat + 0.01);
    let err = engine.mark_at(&req, now).await.unwrap_err();
    assert!(matches!(
        err,
        AttendanceError::InvalidState(InvalidState::TooFarFromIssuer { .. })
    ));

    // with everything else in order the device check fires
    let err = engine
        .mark_at(&request("210001", "482913", "dsp", &device_of_210002), now)
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Conflict(Conflict::DeviceReuse)));

    assert_eq!(store.records().await.len(), 1);
}

/// Ledger that holds every device lookup until `parties` requests have
/// reached it, so all of them pass the pre-checks before any appends.
#[derive(Clone)]
struct GatedLedger {
    inner: MemoryStore,
    gate: Arc<Barrier>,
}

impl GatedLedger {
    fn new(inner: MemoryStore, parties: usize) -> Self {
        Self {
            inner,
            gate: Arc::new(Barrier::new(parties)),
        }
    }
}

impl LedgerStore for GatedLedger {
    async fn exists(&self, student_id: &str, session_code: &str) -> DatabaseResult<bool> {
        self.inner.exists(student_id, session_code).await
    }

    async fn find_recent_by_device(
        &self,
        device_fingerprint: &str,
        since: DateTime<Utc>,
    ) -> DatabaseResult<Vec<AttendanceRecord>> {
        let recent = self.inner.find_recent_by_device(device_fingerprint, since).await;
        self.gate.wait().await;
        recent
    }

    async fn append(
        &self,
        record: &AttendanceRecord,
        device_window_start: DateTime<Utc>,
    ) -> DatabaseResult<AppendOutcome> {
        self.inner.append(record, device_window_start).await
    }

    async fn find(&self, filter: &LedgerFilter) -> DatabaseResult<Vec<AttendanceRecord>> {
        LedgerStore::find(&self.inner, filter).await
    }

    async fn count_matching(&self, filter: &LedgerFilter) -> DatabaseResult<u64> {
        LedgerStore::count_matching(&self.inner, filter).await
    }
}

fn gated_engine(store: &MemoryStore) -> MarkingEngine<MemoryStore, MemoryStore, GatedLedger> {
    MarkingEngine::new(
        store.clone(),
        store.clone(),
        GatedLedger::new(store.clone(), 2),
        AttendanceConfig::default(),
    )
}

#[tokio::test]
async fn test_interleaved_marks_from_one_device_admit_one() {
    let (store, _) = setup().await;
    let engine = gated_engine(&store);
    let now = start() + Duration::minutes(2);

    let a = request("210001", "482913", "dsp", "shared-phone");
    let b = request("210002", "482913", "dsp", "shared-phone");
    let (ra, rb) = tokio::join!(engine.mark_at(&a, now), engine.mark_at(&b, now));

    let results = [ra, rb];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(AttendanceError::Conflict(Conflict::DeviceReuse))
    )));
    assert_eq!(store.records().await.len(), 1);
}

#[tokio::test]
async fn test_interleaved_marks_for_one_student_admit_one() {
    let (store, _) = setup().await;
    let engine = gated_engine(&store);
    let now = start() + Duration::minutes(2);

    let a = request("210001", "482913", "dsp", "phone-a");
    let b = request("210001", "482913", "dsp", "phone-b");
    let (ra, rb) = tokio::join!(engine.mark_at(&a, now), engine.mark_at(&b, now));

    let results = [ra, rb];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(AttendanceError::Conflict(Conflict::AlreadyMarked))
    )));
    assert_eq!(store.records().await.len(), 1);
}
