use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::error::DashboardError;
use crate::models::{DayCount, JobFairStats, LabelCount, RawAggregates};
use crate::range::QueryRange;
use crate::stats;

const TOTAL_APPLICATIONS: &str = "SELECT COUNT(*) FROM jobfair.applications a \
     WHERE a.applied_at BETWEEN $1 AND $2";

const UNIQUE_POSITIONS: &str = "SELECT COUNT(DISTINCT p.title) \
     FROM jobfair.applications a \
     JOIN jobfair.positions p ON p.id = a.position_id \
     WHERE a.applied_at BETWEEN $1 AND $2";

const BY_POSITION: &str = "SELECT p.title AS label, COUNT(a.id) AS count \
     FROM jobfair.applications a \
     JOIN jobfair.positions p ON p.id = a.position_id \
     WHERE a.applied_at BETWEEN $1 AND $2 \
     GROUP BY p.title \
     ORDER BY count DESC, label";

const BY_GENDER: &str = "SELECT a.gender AS label, COUNT(*) AS count \
     FROM jobfair.applications a \
     WHERE a.applied_at BETWEEN $1 AND $2 \
     GROUP BY a.gender \
     ORDER BY label";

const BY_EDUCATION: &str = "SELECT a.education AS label, COUNT(*) AS count \
     FROM jobfair.applications a \
     WHERE a.applied_at BETWEEN $1 AND $2 \
     GROUP BY a.education \
     ORDER BY count DESC, label";

const BY_SOURCE: &str = "SELECT a.source AS label, COUNT(*) AS count \
     FROM jobfair.applications a \
     WHERE a.applied_at BETWEEN $1 AND $2 \
     GROUP BY a.source \
     ORDER BY count DESC, label";

const BY_DAY: &str = "SELECT a.applied_at::date AS day, COUNT(*) AS count \
     FROM jobfair.applications a \
     WHERE a.applied_at BETWEEN $1 AND $2 \
     GROUP BY day \
     ORDER BY day";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let positions = vec![
        (
            Uuid::parse_str("6a0f4f1e-2b6f-4d0e-9a4c-6b1f0b0d6e11")?,
            "Backend Engineer",
        ),
        (
            Uuid::parse_str("b7e2c9d4-5f3a-4c8b-8e1d-2a9f7c6b5d22")?,
            "Data Analyst",
        ),
        (
            Uuid::parse_str("1c3d5e7f-9a2b-4c6d-8e0f-1a3b5c7d9e33")?,
            "Product Designer",
        ),
        (
            Uuid::parse_str("f4e3d2c1-b0a9-4877-9655-443322110044")?,
            "Management Trainee",
        ),
    ];

    for (id, title) in positions {
        sqlx::query(
            r#"
            INSERT INTO jobfair.positions (id, title)
            VALUES ($1, $2)
            ON CONFLICT (title) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(title)
        .execute(pool)
        .await?;
    }

    let applications = vec![
        ("seed-001", "Backend Engineer", (8, 9, 12), "Male", "S1", "LinkedIn"),
        ("seed-002", "Backend Engineer", (8, 10, 40), "Female", "S1", "Job Fair Booth"),
        ("seed-003", "Data Analyst", (8, 13, 5), "Female", "S2", "LinkedIn"),
        ("seed-004", "Management Trainee", (9, 9, 55), "Male", "S1", "Instagram"),
        ("seed-005", "Product Designer", (9, 11, 20), "Female", "D3", "Job Fair Booth"),
        ("seed-006", "Backend Engineer", (10, 14, 0), "Male", "S2", "LinkedIn"),
        ("seed-007", "Data Analyst", (11, 15, 30), "Male", "S1", "Referral"),
        ("seed-008", "Management Trainee", (11, 16, 45), "Female", "S1", "LinkedIn"),
        ("seed-009", "Management Trainee", (14, 8, 30), "Male", "SMA", "Instagram"),
        ("seed-010", "Data Analyst", (15, 23, 59), "Female", "S1", "LinkedIn"),
    ];

    for (source_key, title, (day, hour, minute), gender, education, source) in applications {
        let applied_at = NaiveDate::from_ymd_opt(2025, 4, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .context("invalid seed timestamp")?;

        let position_id: Uuid = sqlx::query("SELECT id FROM jobfair.positions WHERE title = $1")
            .bind(title)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            r#"
            INSERT INTO jobfair.applications
            (id, position_id, applied_at, gender, education, source, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(position_id)
        .bind(applied_at)
        .bind(gender)
        .bind(education)
        .bind(source)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn count(
    conn: &mut PgConnection,
    sql: &str,
    range: &QueryRange,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&mut *conn)
        .await
}

async fn grouped(
    conn: &mut PgConnection,
    sql: &str,
    range: &QueryRange,
) -> Result<Vec<LabelCount>, sqlx::Error> {
    sqlx::query_as::<_, LabelCount>(sql)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&mut *conn)
        .await
}

/// Runs every grouped count inside one read-only snapshot so the groupings
/// agree with each other even while new applications are being inserted.
/// Dropping the transaction on an early return rolls it back and hands the
/// connection back to the pool.
pub async fn fetch_aggregates(
    pool: &PgPool,
    range: &QueryRange,
) -> Result<RawAggregates, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;

    let total_applications = count(&mut tx, TOTAL_APPLICATIONS, range).await?;
    let unique_positions = count(&mut tx, UNIQUE_POSITIONS, range).await?;
    let by_position = grouped(&mut tx, BY_POSITION, range).await?;
    let by_gender = grouped(&mut tx, BY_GENDER, range).await?;
    let by_education = grouped(&mut tx, BY_EDUCATION, range).await?;
    let by_source = grouped(&mut tx, BY_SOURCE, range).await?;
    let by_day = sqlx::query_as::<_, DayCount>(BY_DAY)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(RawAggregates {
        total_applications,
        unique_positions,
        by_position,
        by_gender,
        by_education,
        by_source,
        by_day,
    })
}

pub async fn fetch_stats(pool: &PgPool, range: &QueryRange) -> Result<JobFairStats, DashboardError> {
    let raw = fetch_aggregates(pool, range).await?;
    tracing::debug!(
        start = %range.start,
        end = %range.end,
        total = raw.total_applications,
        "aggregated job fair applications"
    );
    Ok(stats::build_stats(raw))
}
