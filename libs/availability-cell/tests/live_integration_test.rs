// Live database tests for availability management.
//
// These run against a real Postgres with the migrations applied and are
// gated on LIVE_DB_TESTS=true plus TEST_DATABASE_URL. Without those they
// skip silently, so `cargo test` stays green on a plain checkout.

use assert_matches::assert_matches;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use availability_cell::error::AvailabilityError;
use availability_cell::models::{
    BulkScheduleRequest, CreateScheduleRequest, SaveAvailabilityRequest, ScheduleStatus,
};
use availability_cell::services::availability::AvailabilityService;
use availability_cell::services::candidates::CandidateService;
use shared_models::slots::SLOT_LABELS;

fn should_run_live_tests() -> bool {
    std::env::var("LIVE_DB_TESTS").unwrap_or_default() == "true"
}

async fn test_pool() -> PgPool {
    dotenv::dotenv().ok();
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for live database tests");
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to test database")
}

struct Fixture {
    dentist_a: i64,
    dentist_b: i64,
    unit: i64,
    patient: i64,
}

async fn seed(pool: &PgPool) -> Fixture {
    let dentist_a = sqlx::query_scalar::<_, i64>(
        "INSERT INTO dentists (first_name, last_name) VALUES ('Alice', 'Adams') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    let dentist_b = sqlx::query_scalar::<_, i64>(
        "INSERT INTO dentists (first_name, last_name) VALUES ('Bob', 'Baker') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    let unit = sqlx::query_scalar::<_, i64>(
        "INSERT INTO dental_units (unit_name) VALUES ('Test Unit') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    let patient = sqlx::query_scalar::<_, i64>(
        "INSERT INTO patients (first_name, last_name) VALUES ('Pat', 'Doe') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    Fixture {
        dentist_a,
        dentist_b,
        unit,
        patient,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 2).unwrap()
}

fn save_req(unit_id: i64, slots: &[&str]) -> SaveAvailabilityRequest {
    SaveAvailabilityRequest {
        date: date(),
        unit_id,
        slots: slots.iter().map(|s| s.to_string()).collect(),
    }
}

#[tokio::test]
async fn replace_saves_clean_slots_as_free() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let service = AvailabilityService::new(&pool);

    let response = service
        .replace_for_dentist(fx.dentist_a, &save_req(fx.unit, &["10:00-11:00", "11:00-12:00"]))
        .await
        .unwrap();

    assert!(response.ok);
    assert_eq!(response.saved, 2);
    assert!(response.conflicts.is_empty());

    let statuses = sqlx::query_scalar::<_, String>(
        "SELECT status FROM schedules WHERE dentist_id = $1 AND unit_id = $2 AND date = $3",
    )
    .bind(fx.dentist_a)
    .bind(fx.unit)
    .bind(date())
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(statuses, vec!["FREE", "FREE"]);
}

#[tokio::test]
async fn replace_dedupes_and_ignores_unknown_labels() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let service = AvailabilityService::new(&pool);

    let response = service
        .replace_for_dentist(
            fx.dentist_a,
            &save_req(fx.unit, &["10:00-11:00", "10:00-11:00", "09:00-10:00"]),
        )
        .await
        .unwrap();

    assert_eq!(response.saved, 1);
}

#[tokio::test]
async fn replace_reports_other_dentists_slots_as_conflicts() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let service = AvailabilityService::new(&pool);

    service
        .replace_for_dentist(fx.dentist_b, &save_req(fx.unit, &["10:00-11:00"]))
        .await
        .unwrap();

    let response = service
        .replace_for_dentist(fx.dentist_a, &save_req(fx.unit, &["10:00-11:00", "11:00-12:00"]))
        .await
        .unwrap();

    assert_eq!(response.saved, 1);
    assert_eq!(response.conflicts, vec!["10:00-11:00".to_string()]);
}

#[tokio::test]
async fn replace_fails_without_writes_when_everything_conflicts() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let service = AvailabilityService::new(&pool);

    service
        .replace_for_dentist(fx.dentist_b, &save_req(fx.unit, &["10:00-11:00"]))
        .await
        .unwrap();

    let err = service
        .replace_for_dentist(fx.dentist_a, &save_req(fx.unit, &["10:00-11:00"]))
        .await
        .unwrap_err();
    assert_matches!(err, AvailabilityError::AllSlotsConflict { .. });

    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM schedules WHERE dentist_id = $1",
    )
    .bind(fx.dentist_a)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn replace_keeps_own_booked_rows_and_rejects_overwriting_them() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let service = AvailabilityService::new(&pool);

    sqlx::query(
        "INSERT INTO schedules (dentist_id, unit_id, date, slot_label, status)
         VALUES ($1, $2, $3, '10:00-11:00', 'BOOKED')",
    )
    .bind(fx.dentist_a)
    .bind(fx.unit)
    .bind(date())
    .execute(&pool)
    .await
    .unwrap();

    let response = service
        .replace_for_dentist(fx.dentist_a, &save_req(fx.unit, &["10:00-11:00", "11:00-12:00"]))
        .await
        .unwrap();

    assert_eq!(response.saved, 1);
    assert_eq!(response.conflicts, vec!["10:00-11:00".to_string()]);

    let booked = sqlx::query_scalar::<_, String>(
        "SELECT status FROM schedules
         WHERE dentist_id = $1 AND unit_id = $2 AND date = $3 AND slot_label = '10:00-11:00'",
    )
    .bind(fx.dentist_a)
    .bind(fx.unit)
    .bind(date())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(booked, "BOOKED");
}

#[tokio::test]
async fn replace_treats_booked_appointments_as_conflicts() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let service = AvailabilityService::new(&pool);

    sqlx::query(
        "INSERT INTO appointments
             (patient_id, dentist_id, unit_id, date, slot_label, start_time, end_time, status)
         VALUES ($1, $2, $3, $4, '13:00-14:00', $4 + TIME '13:00', $4 + TIME '14:00', 'confirmed')",
    )
    .bind(fx.patient)
    .bind(fx.dentist_b)
    .bind(fx.unit)
    .bind(date())
    .execute(&pool)
    .await
    .unwrap();

    let response = service
        .replace_for_dentist(fx.dentist_a, &save_req(fx.unit, &["13:00-14:00", "14:00-15:00"]))
        .await
        .unwrap();

    assert_eq!(response.saved, 1);
    assert_eq!(response.conflicts, vec!["13:00-14:00".to_string()]);
}

#[tokio::test]
async fn candidates_subtract_saved_and_booked_from_catalog() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let availability = AvailabilityService::new(&pool);
    let candidates = CandidateService::new(&pool);

    availability
        .replace_for_dentist(fx.dentist_a, &save_req(fx.unit, &["10:00-11:00"]))
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO appointments
             (patient_id, dentist_id, unit_id, date, slot_label, start_time, end_time, status)
         VALUES ($1, $2, $3, $4, '11:00-12:00', $4 + TIME '11:00', $4 + TIME '12:00', 'confirmed')",
    )
    .bind(fx.patient)
    .bind(fx.dentist_b)
    .bind(fx.unit)
    .bind(date())
    .execute(&pool)
    .await
    .unwrap();

    let response = candidates.candidates(date(), fx.unit).await.unwrap();

    assert_eq!(response.saved, vec!["10:00-11:00".to_string()]);
    assert_eq!(response.booked, vec!["11:00-12:00".to_string()]);
    assert_eq!(response.candidates.len(), SLOT_LABELS.len() - 2);
    assert!(!response.candidates.contains(&"10:00-11:00".to_string()));
    assert!(!response.candidates.contains(&"11:00-12:00".to_string()));
}

async fn dentist_row_count(pool: &PgPool, dentist_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM schedules WHERE dentist_id = $1")
        .bind(dentist_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn concurrent_replaces_leave_one_holder_per_unit_slot() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;

    // Both dentists want 10:00 in the same unit; each also wants a
    // disjoint slot, so a rolled-back race is distinguishable from a
    // partial save.
    let req_a = save_req(fx.unit, &["10:00-11:00", "11:00-12:00"]);
    let req_b = save_req(fx.unit, &["10:00-11:00", "12:00-13:00"]);

    let pool_a = pool.clone();
    let pool_b = pool.clone();
    let (dentist_a, dentist_b) = (fx.dentist_a, fx.dentist_b);
    let (a, b) = tokio::join!(
        async move {
            AvailabilityService::new(&pool_a)
                .replace_for_dentist(dentist_a, &req_a)
                .await
        },
        async move {
            AvailabilityService::new(&pool_b)
                .replace_for_dentist(dentist_b, &req_b)
                .await
        },
    );

    // The unique constraint admits exactly one holder of the contested slot.
    let holders = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM schedules
         WHERE unit_id = $1 AND date = $2 AND slot_label = '10:00-11:00'",
    )
    .bind(fx.unit)
    .bind(date())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(holders, 1);

    for (outcome, dentist_id) in [(a, dentist_a), (b, dentist_b)] {
        match outcome {
            // Winner, or a loser whose conflict read already saw the
            // winner's commit and saved only its disjoint slot.
            Ok(response) => {
                assert!(response.ok);
                assert!(response.saved >= 1);
            }
            // Loser that hit the constraint mid-insert: the whole replace
            // rolled back, including its disjoint slot.
            Err(AvailabilityError::SlotRace { conflicts }) => {
                assert_eq!(conflicts, vec!["10:00-11:00".to_string()]);
                assert_eq!(dentist_row_count(&pool, dentist_id).await, 0);
            }
            Err(e) => panic!("unexpected replace outcome: {}", e),
        }
    }
}

#[tokio::test]
async fn staff_create_rejects_duplicate_unit_slot() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let service = AvailabilityService::new(&pool);

    let req = CreateScheduleRequest {
        dentist_id: fx.dentist_a,
        unit_id: fx.unit,
        date: date(),
        slot_label: "15:00-16:00".to_string(),
        status: None,
    };
    service.create_schedule(&req).await.unwrap();

    let dup = CreateScheduleRequest {
        dentist_id: fx.dentist_b,
        unit_id: fx.unit,
        date: date(),
        slot_label: "15:00-16:00".to_string(),
        status: None,
    };
    let err = service.create_schedule(&dup).await.unwrap_err();
    assert_matches!(err, AvailabilityError::Conflict(_));
}

#[tokio::test]
async fn staff_cannot_touch_booked_rows() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let service = AvailabilityService::new(&pool);

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO schedules (dentist_id, unit_id, date, slot_label, status)
         VALUES ($1, $2, $3, '16:00-17:00', 'BOOKED') RETURNING id",
    )
    .bind(fx.dentist_a)
    .bind(fx.unit)
    .bind(date())
    .fetch_one(&pool)
    .await
    .unwrap();

    let err = service
        .update_schedule_status(id, ScheduleStatus::Free)
        .await
        .unwrap_err();
    assert_matches!(err, AvailabilityError::Conflict(_));

    let err = service.delete_schedule(id).await.unwrap_err();
    assert_matches!(err, AvailabilityError::Conflict(_));
}

#[tokio::test]
async fn staff_cannot_set_booked_by_hand() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let service = AvailabilityService::new(&pool);

    let row = service
        .create_schedule(&CreateScheduleRequest {
            dentist_id: fx.dentist_a,
            unit_id: fx.unit,
            date: date(),
            slot_label: "17:00-18:00".to_string(),
            status: Some(ScheduleStatus::Break),
        })
        .await
        .unwrap();
    assert_eq!(row.status, "BREAK");

    let err = service
        .update_schedule_status(row.id, ScheduleStatus::Booked)
        .await
        .unwrap_err();
    assert_matches!(err, AvailabilityError::Validation(_));
}

#[tokio::test]
async fn bulk_insert_reports_per_slot_outcomes() {
    if !should_run_live_tests() {
        return;
    }
    let pool = test_pool().await;
    let fx = seed(&pool).await;
    let service = AvailabilityService::new(&pool);

    service
        .create_schedule(&CreateScheduleRequest {
            dentist_id: fx.dentist_b,
            unit_id: fx.unit,
            date: date(),
            slot_label: "10:00-11:00".to_string(),
            status: None,
        })
        .await
        .unwrap();

    let response = service
        .bulk_create(&BulkScheduleRequest {
            dentist_id: fx.dentist_a,
            unit_id: fx.unit,
            date: date(),
            slot_labels: vec![
                "10:00-11:00".to_string(),
                "11:00-12:00".to_string(),
                "nonsense".to_string(),
            ],
            status: None,
        })
        .await
        .unwrap();

    assert_eq!(response.success, 1);
    assert_eq!(response.failed, 2);
    assert_eq!(response.errors.len(), 2);
}
