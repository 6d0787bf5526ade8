use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;

use crate::models::{
    ApplicationRecord, ChartDatum, DailyTrendPoint, DayCount, JobFairStats, LabelCount,
    PositionCount, RawAggregates,
};
use crate::range::QueryRange;

pub const MALE_LABEL: &str = "Male";
pub const FEMALE_LABEL: &str = "Female";
pub const NO_SOURCE: &str = "N/A";

fn count_for(groups: &[LabelCount], label: &str) -> i64 {
    groups
        .iter()
        .find(|group| group.label == label)
        .map(|group| group.count)
        .unwrap_or(0)
}

/// Male:female ratio. With no female applicants the male count itself is
/// reported rather than an infinite ratio.
pub fn gender_ratio(by_gender: &[LabelCount]) -> f64 {
    let male = count_for(by_gender, MALE_LABEL);
    let female = count_for(by_gender, FEMALE_LABEL);

    if female > 0 {
        male as f64 / female as f64
    } else {
        male as f64
    }
}

/// Highest-count source; the earliest entry wins ties.
pub fn top_source(by_source: &[LabelCount]) -> String {
    let mut best: Option<&LabelCount> = None;
    for group in by_source {
        if best.map_or(true, |current| group.count > current.count) {
            best = Some(group);
        }
    }

    best.map(|group| group.label.clone())
        .unwrap_or_else(|| NO_SOURCE.to_string())
}

/// Day/month label used on the trend axis, e.g. `08/04`.
pub fn format_day(day: NaiveDate) -> String {
    day.format("%d/%m").to_string()
}

fn chart_data(groups: Vec<LabelCount>) -> Vec<ChartDatum> {
    groups
        .into_iter()
        .map(|group| ChartDatum {
            name: group.label,
            value: group.count,
        })
        .collect()
}

pub fn build_stats(raw: RawAggregates) -> JobFairStats {
    let gender_ratio = gender_ratio(&raw.by_gender);
    let top_source = top_source(&raw.by_source);

    JobFairStats {
        total_applications: raw.total_applications,
        unique_positions: raw.unique_positions,
        gender_ratio,
        top_source,
        position_data: raw
            .by_position
            .into_iter()
            .map(|group| PositionCount {
                position: group.label,
                count: group.count,
            })
            .collect(),
        gender_data: chart_data(raw.by_gender),
        education_data: chart_data(raw.by_education),
        source_data: chart_data(raw.by_source),
        daily_trend_data: raw
            .by_day
            .into_iter()
            .map(|day| DailyTrendPoint {
                date: format_day(day.day),
                count: day.count,
            })
            .collect(),
    }
}

fn ranked(map: HashMap<String, i64>) -> Vec<LabelCount> {
    let mut groups: Vec<LabelCount> = map
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    groups
}

/// Same grouping the store performs, computed over records already in memory.
pub fn aggregate_records(records: &[ApplicationRecord], range: &QueryRange) -> RawAggregates {
    let mut positions: HashMap<String, i64> = HashMap::new();
    let mut genders: BTreeMap<String, i64> = BTreeMap::new();
    let mut educations: HashMap<String, i64> = HashMap::new();
    let mut sources: HashMap<String, i64> = HashMap::new();
    let mut days: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut total = 0i64;

    for record in records.iter().filter(|r| range.contains(r.applied_at)) {
        total += 1;
        *positions.entry(record.position.clone()).or_insert(0) += 1;
        *genders.entry(record.gender.clone()).or_insert(0) += 1;
        *educations.entry(record.education.clone()).or_insert(0) += 1;
        *sources.entry(record.source.clone()).or_insert(0) += 1;
        *days.entry(record.applied_at.date()).or_insert(0) += 1;
    }

    let unique_positions = positions.len() as i64;

    RawAggregates {
        total_applications: total,
        unique_positions,
        by_position: ranked(positions),
        by_gender: genders
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect(),
        by_education: ranked(educations),
        by_source: ranked(sources),
        by_day: days
            .into_iter()
            .map(|(day, count)| DayCount { day, count })
            .collect(),
    }
}

pub fn read_csv(csv_path: &Path) -> anyhow::Result<Vec<ApplicationRecord>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<ApplicationRecord>().enumerate() {
        let record = result.with_context(|| format!("invalid row {}", index + 1))?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::{normalize, DateWindow};
    use chrono::NaiveDateTime;
    use std::collections::HashSet;
    use std::io::Write;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        date(day).and_hms_opt(hour, minute, second).unwrap()
    }

    fn application(
        applied_at: NaiveDateTime,
        gender: &str,
        position: &str,
        education: &str,
        source: &str,
    ) -> ApplicationRecord {
        ApplicationRecord {
            position: position.to_string(),
            applied_at,
            gender: gender.to_string(),
            education: education.to_string(),
            source: source.to_string(),
        }
    }

    fn window() -> DateWindow {
        DateWindow {
            start: date(8),
            end: date(15),
        }
    }

    fn range(start: u32, end: u32) -> QueryRange {
        normalize(Some(date(start)), Some(date(end)), &window())
    }

    fn mixed_applications() -> Vec<ApplicationRecord> {
        vec![
            application(at(8, 9, 0, 0), "Male", "Backend Engineer", "S1", "LinkedIn"),
            application(at(8, 10, 15, 0), "Female", "Backend Engineer", "S2", "Instagram"),
            application(at(9, 11, 0, 0), "Female", "Data Analyst", "S1", "LinkedIn"),
            application(at(9, 16, 30, 0), "Other", "Data Analyst", "D3", "Job Fair Booth"),
            application(at(10, 8, 45, 0), "Male", "Product Designer", "S1", "LinkedIn"),
            application(at(12, 13, 5, 0), "Male", "Backend Engineer", "SMA", "Referral"),
            application(at(20, 9, 0, 0), "Female", "QA Engineer", "S1", "Instagram"),
        ]
    }

    fn sum(groups: &[LabelCount]) -> i64 {
        groups.iter().map(|group| group.count).sum()
    }

    #[test]
    fn small_fair_end_to_end() {
        let applications = vec![
            application(at(8, 9, 0, 0), "Male", "Eng", "S1", "LinkedIn"),
            application(at(8, 14, 0, 0), "Female", "Eng", "S1", "Referral"),
            application(at(9, 10, 0, 0), "Male", "Sci", "S2", "LinkedIn"),
        ];

        let stats = build_stats(aggregate_records(&applications, &range(8, 9)));

        assert_eq!(stats.total_applications, 3);
        assert_eq!(stats.unique_positions, 2);
        assert!((stats.gender_ratio - 2.0).abs() < f64::EPSILON);
        assert_eq!(stats.top_source, "LinkedIn");

        let mut positions = stats.position_data.clone();
        positions.sort_by(|a, b| a.position.cmp(&b.position));
        assert_eq!(
            positions,
            vec![
                PositionCount {
                    position: "Eng".to_string(),
                    count: 2
                },
                PositionCount {
                    position: "Sci".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(
            stats.daily_trend_data,
            vec![
                DailyTrendPoint {
                    date: "08/04".to_string(),
                    count: 2
                },
                DailyTrendPoint {
                    date: "09/04".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn groupings_partition_the_range() {
        let raw = aggregate_records(&mixed_applications(), &range(8, 15));

        assert_eq!(raw.total_applications, 6);
        assert_eq!(sum(&raw.by_gender), raw.total_applications);
        assert_eq!(sum(&raw.by_education), raw.total_applications);
        assert_eq!(sum(&raw.by_source), raw.total_applications);
        assert_eq!(sum(&raw.by_position), raw.total_applications);
        assert_eq!(
            raw.by_day.iter().map(|day| day.count).sum::<i64>(),
            raw.total_applications
        );
    }

    #[test]
    fn unique_positions_match_position_rows() {
        let stats = build_stats(aggregate_records(&mixed_applications(), &range(8, 15)));
        let labels: HashSet<&str> = stats
            .position_data
            .iter()
            .map(|row| row.position.as_str())
            .collect();
        assert_eq!(stats.unique_positions, labels.len() as i64);
        assert_eq!(stats.unique_positions, 3);
    }

    #[test]
    fn ratio_without_female_applicants_is_male_count() {
        let applications = vec![
            application(at(8, 9, 0, 0), "Male", "Eng", "S1", "LinkedIn"),
            application(at(8, 9, 30, 0), "Male", "Eng", "S1", "LinkedIn"),
            application(at(9, 9, 0, 0), "Male", "Sci", "S1", "Referral"),
            application(at(9, 9, 30, 0), "Other", "Sci", "S1", "Referral"),
        ];
        let stats = build_stats(aggregate_records(&applications, &range(8, 15)));
        assert_eq!(stats.gender_ratio, 3.0);
    }

    #[test]
    fn empty_range_reports_sentinel() {
        let stats = build_stats(aggregate_records(&mixed_applications(), &range(13, 14)));

        assert_eq!(stats.total_applications, 0);
        assert_eq!(stats.unique_positions, 0);
        assert_eq!(stats.gender_ratio, 0.0);
        assert_eq!(stats.top_source, NO_SOURCE);
        assert!(stats.position_data.is_empty());
        assert!(stats.gender_data.is_empty());
        assert!(stats.education_data.is_empty());
        assert!(stats.source_data.is_empty());
        assert!(stats.daily_trend_data.is_empty());
    }

    #[test]
    fn reversed_range_yields_empty_aggregates() {
        let stats = build_stats(aggregate_records(&mixed_applications(), &range(15, 8)));

        assert_eq!(stats.total_applications, 0);
        assert_eq!(stats.top_source, NO_SOURCE);
        assert!(stats.position_data.is_empty());
        assert!(stats.gender_data.is_empty());
        assert!(stats.education_data.is_empty());
        assert!(stats.source_data.is_empty());
        assert!(stats.daily_trend_data.is_empty());
    }

    #[test]
    fn end_date_boundary_is_inclusive() {
        let applications = vec![
            application(at(9, 23, 59, 59), "Male", "Eng", "S1", "LinkedIn"),
            application(at(10, 0, 0, 0), "Female", "Eng", "S1", "LinkedIn"),
        ];
        let raw = aggregate_records(&applications, &range(8, 9));
        assert_eq!(raw.total_applications, 1);
        assert_eq!(raw.by_gender[0].label, "Male");
    }

    #[test]
    fn top_source_prefers_highest_count() {
        let sources = vec![
            LabelCount {
                label: "Instagram".to_string(),
                count: 2,
            },
            LabelCount {
                label: "LinkedIn".to_string(),
                count: 5,
            },
            LabelCount {
                label: "Referral".to_string(),
                count: 5,
            },
        ];
        assert_eq!(top_source(&sources), "LinkedIn");
        assert_eq!(top_source(&[]), NO_SOURCE);
    }

    #[test]
    fn daily_trend_is_chronological() {
        let stats = build_stats(aggregate_records(&mixed_applications(), &range(8, 30)));
        let labels: Vec<&str> = stats
            .daily_trend_data
            .iter()
            .map(|point| point.date.as_str())
            .collect();
        assert_eq!(labels, vec!["08/04", "09/04", "10/04", "12/04", "20/04"]);
    }

    #[test]
    fn payload_uses_camel_case_fields() {
        let stats = build_stats(aggregate_records(&mixed_applications(), &range(8, 8)));
        let value = serde_json::to_value(&stats).unwrap();

        assert_eq!(value["totalApplications"], 2);
        assert_eq!(value["uniquePositions"], 1);
        assert_eq!(value["genderRatio"], 1.0);
        assert_eq!(value["positionData"][0]["position"], "Backend Engineer");
        assert_eq!(value["genderData"][0]["name"], "Female");
        assert_eq!(value["dailyTrendData"][0]["date"], "08/04");
        assert!(value.get("sourceData").is_some());
        assert!(value.get("educationData").is_some());
    }

    #[test]
    fn reads_exported_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("applications.csv");
        std::fs::write(
            &path,
            "id,position,applied_at,gender,education,source\n\
             a1,Backend Engineer,2025-04-08T09:00:00,Male,S1,LinkedIn\n\
             a2,Data Analyst,2025-04-09T17:20:00,Female,S2,Referral\n",
        )
        .unwrap();

        let records = read_csv(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].position, "Data Analyst");
        assert_eq!(records[1].applied_at, at(9, 17, 20, 0));
    }

    #[test]
    fn malformed_csv_row_reports_its_position() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "position,applied_at,gender,education,source").unwrap();
        writeln!(file, "Backend Engineer,2025-04-08T09:00:00,Male,S1,LinkedIn").unwrap();
        writeln!(file, "Data Analyst,yesterday,Female,S2,Referral").unwrap();
        file.flush().unwrap();

        let err = read_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid row 2"));
    }
}
