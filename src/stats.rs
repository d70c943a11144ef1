use crate::models::{
    BarChart, BarItem, CalendarMonth, ChangeIndicator, ChartPoint, GridLine, LineChart,
    MonthFailure, Opening, OpeningStats, StatisticsResponse, StatisticsView,
};
use chrono::{DateTime, Datelike, NaiveDate};
use serde_json::{Map, Value};

const CHART_HEIGHT: f64 = 150.0;
const POINT_SPACING: f64 = 40.0;
const GRID_STEPS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];
const SCHOOL_YEAR_START_MONTH: u32 = 9;

/// Months from September of the current school year up to and including `today`'s month.
pub fn school_year_months(today: NaiveDate) -> Vec<(i32, u32)> {
    let current_year = today.year();
    let current_month = today.month();
    let start_year = if current_month >= SCHOOL_YEAR_START_MONTH {
        current_year
    } else {
        current_year - 1
    };

    let mut months = Vec::new();
    let (mut year, mut month) = (start_year, SCHOOL_YEAR_START_MONTH);
    while year < current_year || (year == current_year && month <= current_month) {
        months.push((year, month));
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    months
}

/// Accepts plain dates as well as full timestamps.
pub fn parse_day_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Openings for one center across the fetched months, oldest first.
pub fn collect_openings<'a>(
    center_id: &str,
    months: impl IntoIterator<Item = &'a CalendarMonth>,
    today: NaiveDate,
) -> Vec<Opening> {
    let mut openings: Vec<Opening> = months
        .into_iter()
        .flat_map(|month| month.calendar.iter())
        .filter_map(|day| {
            let count = day.centers.get(center_id)?.count;
            if count == 0 {
                return None;
            }
            let date = parse_day_date(&day.date)?;
            (date <= today).then(|| Opening {
                date,
                count,
                weekday_name: day.weekday_name.clone(),
            })
        })
        .collect();
    openings.sort_by_key(|opening| opening.date);
    openings
}

fn window_sum(openings: &[Opening], from_end: usize, len: usize) -> (u64, usize) {
    let n = openings.len();
    let end = n.saturating_sub(from_end);
    let start = n.saturating_sub(from_end + len);
    let window = &openings[start..end];
    let sum = window.iter().map(|o| o.count).fold(0, u64::saturating_add);
    (sum, window.len())
}

/// `a - b` clamped to the `i64` range.
fn delta(a: u64, b: u64) -> i64 {
    if a >= b {
        i64::try_from(a - b).unwrap_or(i64::MAX)
    } else {
        i64::try_from(b - a).map_or(i64::MIN, |d| -d)
    }
}

pub fn opening_stats(openings: &[Opening]) -> OpeningStats {
    let last = openings.last().map(|o| o.count).unwrap_or(0);
    let previous = openings.len().checked_sub(2).map(|i| openings[i].count);

    let (last5_sum, _) = window_sum(openings, 0, 5);
    let (prev5_sum, prev5_len) = window_sum(openings, 5, 5);
    let (last10_sum, _) = window_sum(openings, 0, 10);
    let (prev10_sum, prev10_len) = window_sum(openings, 10, 10);

    OpeningStats {
        total_openings: openings.len(),
        last_opening: last,
        last5_sum,
        prev5_sum,
        last10_sum,
        prev10_sum,
        day_change: previous.map(|prev| delta(last, prev)).unwrap_or(0),
        week_change: if prev5_len > 0 { delta(last5_sum, prev5_sum) } else { 0 },
        month_change: if prev10_len > 0 { delta(last10_sum, prev10_sum) } else { 0 },
    }
}

impl ChangeIndicator {
    pub fn from_change(change: i64) -> Self {
        let (text, class) = if change > 0 {
            (format!("↑ {change}"), "stat-change positive")
        } else if change < 0 {
            (format!("↓ {}", change.unsigned_abs()), "stat-change negative")
        } else {
            ("—".to_string(), "stat-change")
        };
        Self {
            text,
            class: class.to_string(),
        }
    }
}

impl LineChart {
    pub fn from_openings(openings: &[Opening], min_width: f64) -> Option<Self> {
        if openings.is_empty() {
            return None;
        }

        let n = openings.len();
        let height = CHART_HEIGHT;
        let baseline = height - 30.0;
        let plot_height = height - 50.0;
        let width = (n as f64 * POINT_SPACING).max(min_width);
        let max_value = openings.iter().map(|o| o.count).max().unwrap_or(0);
        let span = (n - 1).max(1) as f64;

        let scale = |count: u64| {
            if max_value == 0 {
                0.0
            } else {
                count as f64 / max_value as f64
            }
        };

        let points: Vec<ChartPoint> = openings
            .iter()
            .enumerate()
            .map(|(i, o)| ChartPoint {
                x: (i as f64 / span) * (width - 60.0) + 30.0,
                y: baseline - scale(o.count) * plot_height,
                date: o.date,
                count: o.count,
            })
            .collect();

        let path = points
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} {} {}", if i == 0 { "M" } else { "L" }, p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");

        let first = &points[0];
        let last = &points[n - 1];
        let area = format!(
            "{path} L {} {baseline} L {} {baseline} Z",
            last.x, first.x
        );

        let grid = GRID_STEPS
            .iter()
            .map(|pct| GridLine {
                y: baseline - pct * plot_height,
                value: (max_value as f64 * pct).round() as u64,
            })
            .collect();

        let label_every = n.div_ceil(10);
        let label_indices = (0..n)
            .filter(|i| i % label_every == 0 || *i == n - 1)
            .collect();

        Some(Self {
            width,
            height,
            baseline,
            max_value,
            points,
            grid,
            label_indices,
            path,
            area,
        })
    }
}

/// The `_month` sub-aggregate when the backend supplies one, else the totals.
pub fn pick_aggregate(data: &Map<String, Value>) -> &Map<String, Value> {
    match data.get("_month") {
        Some(Value::Object(month)) => month,
        _ => data,
    }
}

fn count_entries(data: &Map<String, Value>) -> Vec<(String, u64)> {
    data.iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .filter_map(|(key, value)| {
            let count = match value {
                Value::Null => 0,
                other => other
                    .as_u64()
                    .or_else(|| other.as_f64().map(|f| f.max(0.0) as u64))?,
            };
            Some((key.clone(), count))
        })
        .collect()
}

fn bars(entries: Vec<(String, u64)>, label: impl Fn(&str) -> String) -> BarChart {
    let max = entries.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let total = entries
        .iter()
        .map(|(_, count)| *count)
        .fold(0, u64::saturating_add);

    let items = entries
        .into_iter()
        .map(|(key, count)| BarItem {
            label: label(&key),
            count,
            width: if max > 0 {
                count as f64 / max as f64 * 100.0
            } else {
                0.0
            },
            pct: if total > 0 {
                (count as f64 / total as f64 * 100.0).round() as u64
            } else {
                0
            },
        })
        .collect();

    BarChart { items, total }
}

impl BarChart {
    pub fn by_school(data: &Map<String, Value>) -> Self {
        let mut entries = count_entries(data);
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        bars(entries, str::to_string)
    }

    pub fn by_grade(data: &Map<String, Value>) -> Self {
        let mut entries = count_entries(data);
        entries.sort_by_key(|(grade, _)| grade_number(grade).unwrap_or(i64::MAX));
        bars(entries, |grade| format!("{grade}. bekkur"))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Everything the statistics panel shows for one center.
pub fn statistics_view(
    center_id: &str,
    openings: Vec<Opening>,
    failed_months: Vec<MonthFailure>,
    totals: Option<&StatisticsResponse>,
    chart_min_width: f64,
) -> StatisticsView {
    let stats = opening_stats(&openings);
    let line_chart = LineChart::from_openings(&openings, chart_min_width);

    let schools = totals
        .and_then(|t| t.by_school.as_ref())
        .map(|data| BarChart::by_school(pick_aggregate(data)))
        .unwrap_or_default();
    let grades = totals
        .and_then(|t| t.by_grade.as_ref())
        .map(|data| BarChart::by_grade(pick_aggregate(data)))
        .unwrap_or_default();

    StatisticsView {
        center_id: center_id.to_string(),
        day_indicator: ChangeIndicator::from_change(stats.day_change),
        week_indicator: ChangeIndicator::from_change(stats.week_change),
        month_indicator: ChangeIndicator::from_change(stats.month_change),
        openings,
        stats,
        line_chart,
        schools,
        grades,
        failed_months,
    }
}

/// Leading integer of a grade key, so "10" sorts after "9".
fn grade_number(grade: &str) -> Option<i64> {
    let digits: String = grade
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
