use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use plotters::prelude::*;

use crate::core::{WikiplotError, WikiplotOptions};
use crate::utils::url::article_url;

const CHART_WIDTH: u32 = 1600;
const CHART_HEIGHT: u32 = 600;
const STEELBLUE: RGBColor = RGBColor(70, 130, 180);
const ROYALBLUE: RGBColor = RGBColor(65, 105, 225);
/// Bars above this fraction of the peak day are highlighted red
const PEAK_FRACTION: f64 = 0.6;

/// Derives the chart filename from the display title
pub fn chart_file_name(title: &str) -> String {
    format!(
        "{}_edit_history.svg",
        title.replace(' ', "_").replace(['/', '\\'], "_")
    )
}

/// Counts edits per calendar day; entries that do not parse as
/// `YYYY-MM-DD` are skipped
pub fn daily_counts(dates: &[String]) -> BTreeMap<NaiveDate, u64> {
    let mut counts = BTreeMap::new();
    for date in dates {
        if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            *counts.entry(day).or_insert(0) += 1;
        }
    }
    counts
}

/// Renders the edit history as a dark-background log-scale bar chart
///
/// One bar per day, red above `PEAK_FRACTION` of the busiest day. An
/// empty history still produces a (bar-less) chart file. Returns the
/// path of the written SVG.
pub fn render_edit_history(
    dates: &[String],
    title: &str,
    raw_input: &str,
    options: &WikiplotOptions,
) -> Result<PathBuf, WikiplotError> {
    // A base of 1 or below degenerates the log axis (division by ln(base));
    // the comparison also rejects NaN.
    if !(options.log_base > 1.0) {
        return Err(WikiplotError::InvalidLogBase(options.log_base));
    }

    fs::create_dir_all(&options.output_dir)
        .map_err(|e| WikiplotError::Chart(format!("could not create output directory: {e}")))?;
    let path = options.output_dir.join(chart_file_name(title));

    let counts = daily_counts(dates);
    let max_edits = counts.values().copied().max().unwrap_or(0);
    let peak_day = counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(day, _)| *day);

    let (first_day, last_day) = match (counts.keys().next(), counts.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            let today = Utc::now().date_naive();
            (today, today)
        }
    };
    let x_end = last_day + Duration::days(1);
    let y_max = (max_edits.max(1) as f64) * 1.5;

    let caption = match peak_day {
        Some(peak) => format!(
            "Total edits: {} | Peak: {peak} ({max_edits} edits) | Red bars = busiest editing days",
            dates.len()
        ),
        None => format!("Total edits: {}", dates.len()),
    };

    {
        let root = SVGBackend::new(&path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&BLACK).map_err(to_chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&caption, ("sans-serif", 22).into_font().color(&WHITE))
            .margin(10)
            .margin_top(60)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(
                first_day..x_end,
                (0.9f64..y_max).log_scale().base(options.log_base),
            )
            .map_err(to_chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Year")
            .y_desc(format!("Edits per day (log base {})", options.log_base))
            .axis_style(&WHITE.mix(0.8))
            .light_line_style(&WHITE.mix(0.1))
            .label_style(("sans-serif", 12).into_font().color(&WHITE))
            .draw()
            .map_err(to_chart_error)?;

        let threshold = max_edits as f64 * PEAK_FRACTION;
        chart
            .draw_series(counts.iter().map(|(day, count)| {
                let style = if *count as f64 > threshold {
                    RED.mix(0.8).filled()
                } else {
                    STEELBLUE.to_rgba().filled()
                };
                Rectangle::new(
                    [(*day, 0.9), (*day + Duration::days(1), *count as f64)],
                    style,
                )
            }))
            .map_err(to_chart_error)?;

        root.draw(&Text::new(
            article_url(title),
            (20, 10),
            ("sans-serif", 14).into_font().color(&ROYALBLUE),
        ))
        .map_err(to_chart_error)?;

        let command = if (options.log_base - 10.0).abs() > f64::EPSILON {
            format!("Command: wikiplot {raw_input:?} --log-base {}", options.log_base)
        } else {
            format!("Command: wikiplot {raw_input:?}")
        };
        root.draw(&Text::new(
            command,
            (10, CHART_HEIGHT as i32 - 18),
            ("sans-serif", 12).into_font().color(&WHITE.mix(0.6)),
        ))
        .map_err(to_chart_error)?;

        root.present().map_err(to_chart_error)?;
    }

    Ok(path)
}

fn to_chart_error<E: std::error::Error>(error: E) -> WikiplotError {
    WikiplotError::Chart(error.to_string())
}
