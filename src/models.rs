use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One recorded attendance event for a center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opening {
    pub date: NaiveDate,
    pub count: u64,
    #[serde(rename = "weekdayName", default)]
    pub weekday_name: String,
}

/// Backend fields may be `null`; those read as the type's default (zero for counts).
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CenterDay {
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarDay {
    pub date: String,
    #[serde(rename = "weekdayName", default)]
    pub weekday_name: String,
    #[serde(default)]
    pub centers: BTreeMap<String, CenterDay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarMonth {
    #[serde(default)]
    pub calendar: Vec<CalendarDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Virkir,
    AdDetta,
    NylegaHaettir,
    Haettir,
    Ovirkir,
}

impl ActivityStatus {
    pub const ALL: [ActivityStatus; 5] = [
        ActivityStatus::Virkir,
        ActivityStatus::AdDetta,
        ActivityStatus::NylegaHaettir,
        ActivityStatus::Haettir,
        ActivityStatus::Ovirkir,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ActivityStatus::Virkir => "virkir",
            ActivityStatus::AdDetta => "ad_detta",
            ActivityStatus::NylegaHaettir => "nylega_haettir",
            ActivityStatus::Haettir => "haettir",
            ActivityStatus::Ovirkir => "ovirkir",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActivityStatus::Virkir => "Virkir",
            ActivityStatus::AdDetta => "Að detta úr",
            ActivityStatus::NylegaHaettir => "Nýlega hættir",
            ActivityStatus::Haettir => "Hættir",
            ActivityStatus::Ovirkir => "Óvirkir",
        }
    }

    /// CSS custom property holding the status colour, e.g. `--color-ad-detta`.
    pub fn color_var(self) -> String {
        format!("--color-{}", self.key().replacen('_', "-", 1))
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.key() == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    #[serde(default, deserialize_with = "null_as_default")]
    pub virkir: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ad_detta: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nylega_haettir: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub haettir: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ovirkir: u64,
}

impl ActivityCounts {
    pub fn get(&self, status: ActivityStatus) -> u64 {
        match status {
            ActivityStatus::Virkir => self.virkir,
            ActivityStatus::AdDetta => self.ad_detta,
            ActivityStatus::NylegaHaettir => self.nylega_haettir,
            ActivityStatus::Haettir => self.haettir,
            ActivityStatus::Ovirkir => self.ovirkir,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityStatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub counts: ActivityCounts,
    /// Status key to school counts, in the backend's order.
    #[serde(rename = "countsBySchool", default, deserialize_with = "null_as_default")]
    pub counts_by_school: BTreeMap<String, Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsResponse {
    #[serde(rename = "bySchool", default)]
    pub by_school: Option<Map<String, Value>>,
    #[serde(rename = "byGrade", default)]
    pub by_grade: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStudentForm {
    #[serde(default)]
    pub nafn: String,
    #[serde(default)]
    pub skoli: String,
    #[serde(default)]
    pub bekkur: String,
    #[serde(default)]
    pub custom_skoli: String,
    #[serde(default)]
    pub center_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStudent {
    pub nafn: String,
    pub skoli: String,
    pub bekkur: String,
    pub center_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nafn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddStudentResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub student: Option<StudentRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddStudentResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningStats {
    pub total_openings: usize,
    pub last_opening: u64,
    pub last5_sum: u64,
    pub prev5_sum: u64,
    pub last10_sum: u64,
    pub prev10_sum: u64,
    pub day_change: i64,
    pub week_change: i64,
    pub month_change: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeIndicator {
    pub text: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub y: f64,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    pub width: f64,
    pub height: f64,
    pub baseline: f64,
    pub max_value: u64,
    pub points: Vec<ChartPoint>,
    pub grid: Vec<GridLine>,
    pub label_indices: Vec<usize>,
    pub path: String,
    pub area: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarItem {
    pub label: String,
    pub count: u64,
    pub width: f64,
    pub pct: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub items: Vec<BarItem>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthFailure {
    pub year: i32,
    pub month: u32,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsView {
    pub center_id: String,
    pub openings: Vec<Opening>,
    pub stats: OpeningStats,
    pub day_indicator: ChangeIndicator,
    pub week_indicator: ChangeIndicator,
    pub month_indicator: ChangeIndicator,
    pub line_chart: Option<LineChart>,
    pub schools: BarChart,
    pub grades: BarChart,
    pub failed_months: Vec<MonthFailure>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityView {
    pub center_id: String,
    pub counts: ActivityCounts,
}

#[derive(Debug, Deserialize)]
pub struct CenterQuery {
    pub center_id: Option<String>,
}
