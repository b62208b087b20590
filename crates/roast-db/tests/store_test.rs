use chrono::{Duration, TimeZone, Utc};
use roast_common::{FocusedApp, ReportPersonality, Session, Visit, WeeklyReport};
use roast_db::queries::MaintenanceQueries;
use roast_db::{ActivityStore, Database, DatabaseConfig, ReportStore};
use tempfile::tempdir;
use uuid::Uuid;

#[tokio::test]
async fn test_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roast.db").to_str().unwrap().to_string();
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();

    let mut session = Session::begin(FocusedApp::new("com.editor", "Editor"), start);
    session.close(start + Duration::minutes(45));
    let visit = Visit::from_session(&session, None);

    {
        let db = Database::open(DatabaseConfig { path: path.clone() }).await.unwrap();
        db.save_session(&session).await.unwrap();
        db.save_visit(&visit).await.unwrap();
        db.close().await;
    }

    let db = Database::open(DatabaseConfig { path }).await.unwrap();
    let sessions = db.sessions_in_range(start, start + Duration::days(1)).await.unwrap();
    let visits = db.visits_in_range(start, start + Duration::days(1)).await.unwrap();

    assert_eq!(sessions, vec![session]);
    assert_eq!(visits, vec![visit]);
}

#[tokio::test]
async fn test_delete_all_data_clears_every_record_kind() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roast.db").to_str().unwrap().to_string();
    let db = Database::open(DatabaseConfig { path }).await.unwrap();
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();

    let mut session = Session::begin(FocusedApp::new("com.chat", "Chat"), start);
    session.close(start + Duration::seconds(8));
    db.save_session(&session).await.unwrap();
    db.save_visit(&Visit::from_session(&session, Some("com.editor".into()))).await.unwrap();
    db.save_report(&WeeklyReport {
        id: Uuid::new_v4(),
        week_start: start,
        week_end: start + Duration::days(7),
        raw_stats_json: "{}".into(),
        analysis: "busy week".into(),
        personality: ReportPersonality::Roast,
        created_at: start,
    })
    .await
    .unwrap();

    MaintenanceQueries::delete_all_data(&db).await.unwrap();

    assert!(db.sessions_in_range(start, start + Duration::days(7)).await.unwrap().is_empty());
    assert!(db.visits_in_range(start, start + Duration::days(7)).await.unwrap().is_empty());
    assert!(db.recent_reports(10).await.unwrap().is_empty());
}
