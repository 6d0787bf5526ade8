use std::fmt::Write;

use crate::models::{ChartDatum, JobFairStats};
use crate::range::QueryRange;

fn write_chart_section(output: &mut String, title: &str, data: &[ChartDatum]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {}", title);

    if data.is_empty() {
        let _ = writeln!(output, "No applications recorded for this range.");
        return;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    for datum in sorted.iter() {
        let _ = writeln!(output, "- {}: {} applicants", datum.name, datum.value);
    }
}

pub fn build_report(range: &QueryRange, stats: &JobFairStats) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Job Fair Dashboard");
    let _ = writeln!(
        output,
        "Candidate and position analysis from {} to {}",
        range.start_date(),
        range.end_date()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Total Applications: {}", stats.total_applications);
    let _ = writeln!(output, "- Available Positions: {}", stats.unique_positions);
    let _ = writeln!(output, "- M/F Ratio: {:.2}:1", stats.gender_ratio);
    let _ = writeln!(output, "- Main Source: {}", stats.top_source);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Applications by Position");

    if stats.position_data.is_empty() {
        let _ = writeln!(output, "No applications recorded for this range.");
    } else {
        let mut positions = stats.position_data.clone();
        positions.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.position.cmp(&b.position))
        });
        for row in positions.iter() {
            let _ = writeln!(output, "- {}: {} applicants", row.position, row.count);
        }
    }

    write_chart_section(&mut output, "Gender Distribution", &stats.gender_data);
    write_chart_section(&mut output, "Education Level", &stats.education_data);
    write_chart_section(&mut output, "Application Sources", &stats.source_data);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Application Trend");

    if stats.daily_trend_data.is_empty() {
        let _ = writeln!(output, "No applications recorded for this range.");
    } else {
        for point in stats.daily_trend_data.iter() {
            let _ = writeln!(output, "- {}: {}", point.date, point.count);
        }
    }

    output
}
