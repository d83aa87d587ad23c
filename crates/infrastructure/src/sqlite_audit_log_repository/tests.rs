use chrono::{TimeZone, Utc};
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePoolOptions;

use triggermesh_application::AuditLogRepository;
use triggermesh_domain::{AuditLogQuery, AuditResult, NewAuditLogEntry};

use super::SqliteAuditLogRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> SqlitePool {
    let pool = match SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to open in-memory sqlite database: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for sqlite audit log tests: {error}");
    }

    pool
}

fn new_entry(job_name: &str, result: AuditResult) -> NewAuditLogEntry {
    NewAuditLogEntry {
        timestamp: Utc::now(),
        api_key_used: "ci-key".to_owned(),
        http_method: "POST".to_owned(),
        request_path: "/api/v1/trigger/jenkins".to_owned(),
        http_status: if result == AuditResult::Success { 200 } else { 500 },
        job_name: job_name.to_owned(),
        parameters_json: r#"{"BRANCH":"main"}"#.to_owned(),
        result,
        error_text: (result == AuditResult::Failed)
            .then(|| "jenkins server unreachable (connection refused)".to_owned()),
    }
}

#[tokio::test]
async fn appended_entries_list_most_recent_first() {
    let repository = SqliteAuditLogRepository::new(test_pool().await);

    for index in 1..=5 {
        let result = if index % 2 == 0 {
            AuditResult::Failed
        } else {
            AuditResult::Success
        };
        let append = repository
            .append_entry(new_entry(&format!("job-{index}"), result))
            .await;
        assert!(append.is_ok());
    }

    let entries = repository
        .list_entries(AuditLogQuery::new(Some(5), Some(0)))
        .await
        .unwrap_or_default();

    assert_eq!(entries.len(), 5);
    let jobs: Vec<&str> = entries.iter().map(|entry| entry.job_name.as_str()).collect();
    assert_eq!(jobs, vec!["job-5", "job-4", "job-3", "job-2", "job-1"]);
    assert!(entries.windows(2).all(|pair| pair[0].id > pair[1].id));

    let failed = &entries[1];
    assert_eq!(failed.result, AuditResult::Failed);
    assert_eq!(failed.http_status, 500);
    assert!(failed.error_text.is_some());
    assert_eq!(entries[0].error_text, None);
    assert_eq!(entries[0].parameters_json, r#"{"BRANCH":"main"}"#);
}

#[tokio::test]
async fn pagination_skips_offset_rows() {
    let repository = SqliteAuditLogRepository::new(test_pool().await);

    for index in 1..=4 {
        let append = repository
            .append_entry(new_entry(&format!("job-{index}"), AuditResult::Success))
            .await;
        assert!(append.is_ok());
    }

    let page = repository
        .list_entries(AuditLogQuery::new(Some(2), Some(1)))
        .await
        .unwrap_or_default();

    let jobs: Vec<&str> = page.iter().map(|entry| entry.job_name.as_str()).collect();
    assert_eq!(jobs, vec!["job-3", "job-2"]);
}

#[tokio::test]
async fn consecutive_pages_cover_every_row_once() {
    let repository = SqliteAuditLogRepository::new(test_pool().await);

    for index in 1..=5 {
        let append = repository
            .append_entry(new_entry(&format!("job-{index}"), AuditResult::Success))
            .await;
        assert!(append.is_ok());
    }

    let all = repository
        .list_entries(AuditLogQuery::new(Some(5), Some(0)))
        .await
        .unwrap_or_default();
    let expected: Vec<_> = all.iter().map(|entry| entry.id).collect();
    assert_eq!(expected.len(), 5);

    let mut paged = Vec::new();
    for offset in [0, 2, 4] {
        let page = repository
            .list_entries(AuditLogQuery::new(Some(2), Some(offset)))
            .await
            .unwrap_or_default();
        paged.extend(page.iter().map(|entry| entry.id));
    }

    assert_eq!(paged, expected);
}

#[tokio::test]
async fn timestamps_keep_microsecond_precision() {
    let repository = SqliteAuditLogRepository::new(test_pool().await);
    let timestamp = Utc
        .with_ymd_and_hms(2025, 3, 14, 15, 9, 26)
        .single()
        .unwrap_or_else(|| panic!("valid timestamp"))
        + chrono::Duration::microseconds(535_897);

    let mut entry = new_entry("precise", AuditResult::Success);
    entry.timestamp = timestamp;
    assert!(repository.append_entry(entry).await.is_ok());

    let entries = repository
        .list_entries(AuditLogQuery::default())
        .await
        .unwrap_or_default();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].timestamp, timestamp);
}

#[tokio::test]
async fn legacy_timestamps_without_fraction_are_read() {
    let pool = test_pool().await;
    let insert = sqlx::query(
        r#"
        INSERT INTO audit_logs (timestamp, api_key, method, path, status, job_name, params, result)
        VALUES ('2024-01-02 03:04:05', 'ci-key', 'POST', '/api/v1/trigger/jenkins', 200, 'old', '{}', 'success')
        "#,
    )
    .execute(&pool)
    .await;
    assert!(insert.is_ok());

    let repository = SqliteAuditLogRepository::new(pool);
    let entries = repository
        .list_entries(AuditLogQuery::default())
        .await
        .unwrap_or_default();

    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        "2024-01-02 03:04:05"
    );
}

#[tokio::test]
async fn ping_fails_once_pool_is_closed() {
    let pool = test_pool().await;
    let repository = SqliteAuditLogRepository::new(pool.clone());
    assert!(repository.ping().await.is_ok());

    pool.close().await;
    assert!(repository.ping().await.is_err());
}
