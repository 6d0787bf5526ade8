use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One candidate submission, as exported from the `jobfair.applications` table
/// joined with its position title.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationRecord {
    pub position: String,
    pub applied_at: NaiveDateTime,
    pub gender: String,
    pub education: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DayCount {
    pub day: NaiveDate,
    pub count: i64,
}

/// Grouped counts for one range, before any derivation or reshaping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAggregates {
    pub total_applications: i64,
    pub unique_positions: i64,
    pub by_position: Vec<LabelCount>,
    pub by_gender: Vec<LabelCount>,
    pub by_education: Vec<LabelCount>,
    pub by_source: Vec<LabelCount>,
    pub by_day: Vec<DayCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFairStats {
    pub total_applications: i64,
    pub unique_positions: i64,
    pub gender_ratio: f64,
    pub top_source: String,
    pub position_data: Vec<PositionCount>,
    pub gender_data: Vec<ChartDatum>,
    pub education_data: Vec<ChartDatum>,
    pub source_data: Vec<ChartDatum>,
    pub daily_trend_data: Vec<DailyTrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionCount {
    pub position: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDatum {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTrendPoint {
    pub date: String,
    pub count: i64,
}
