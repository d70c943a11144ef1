use crate::models::{
    ActivityCounts, ActivityStatus, BarChart, ChangeIndicator, LineChart, StatisticsView,
};
use chrono::{Datelike, NaiveDate};
use std::fmt::Write as _;

const SHORT_MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "maí", "jún", "júl", "ágú", "sep", "okt", "nóv", "des",
];

const EMPTY_STATE: &str =
    r#"<p style="color: var(--color-text-muted); text-align: center;">Engin gögn</p>"#;

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `d. mmm`, e.g. `3. okt`.
pub fn format_short_date(date: NaiveDate) -> String {
    format!("{}. {}", date.day(), SHORT_MONTHS[date.month0() as usize])
}

fn stat_card(id: &str, label: &str, value: u64, change: &ChangeIndicator) -> String {
    format!(
        r#"<div class="stat-card">
  <div class="stat-value" id="{id}">{value}</div>
  <div class="stat-label">{label}</div>
  <div class="{class}" id="{id}Change">{text}</div>
</div>"#,
        class = change.class,
        text = change.text,
    )
}

pub fn render_stat_cards(view: &StatisticsView) -> String {
    let stats = &view.stats;
    [
        stat_card("statDay", "Síðasta opnun", stats.last_opening, &view.day_indicator),
        stat_card("statWeek", "Síðustu 5 opnanir", stats.last5_sum, &view.week_indicator),
        stat_card("statMonth", "Síðustu 10 opnanir", stats.last10_sum, &view.month_indicator),
    ]
    .join("\n")
}

pub fn render_line_chart(chart: Option<&LineChart>) -> String {
    let Some(chart) = chart else {
        return r#"<p style="color: var(--color-text-muted); text-align: center;">Engar opnanir</p>"#
            .to_string();
    };

    let mut svg = String::new();
    for line in &chart.grid {
        let _ = write!(
            svg,
            r#"<line x1="30" y1="{y}" x2="{x2}" y2="{y}" stroke="var(--color-border)" stroke-dasharray="2,2" opacity="0.3"/><text x="5" y="{ty}" fill="var(--color-text-muted)" font-size="10">{value}</text>"#,
            y = line.y,
            x2 = chart.width - 10.0,
            ty = line.y + 4.0,
            value = line.value,
        );
    }

    let _ = write!(
        svg,
        r#"<path d="{}" fill="var(--center-color)" opacity="0.2"/><path d="{}" fill="none" stroke="var(--center-color)" stroke-width="2"/>"#,
        chart.area, chart.path
    );

    for (i, point) in chart.points.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<circle cx="{}" cy="{}" r="4" fill="var(--center-color)" class="chart-point" data-index="{i}"/><title>{}: {} mætingar</title>"#,
            point.x,
            point.y,
            format_short_date(point.date),
            point.count,
        );
    }

    for &i in &chart.label_indices {
        let point = &chart.points[i];
        let _ = write!(
            svg,
            r#"<text x="{}" y="{}" fill="var(--color-text-muted)" font-size="9" text-anchor="middle">{}</text>"#,
            point.x,
            chart.height - 10.0,
            format_short_date(point.date),
        );
    }

    format!(
        r#"<div class="line-chart-container" style="overflow-x: auto;">
  <svg width="{width}" height="{height}" class="line-chart">{svg}</svg>
</div>
<p style="color: var(--color-text-muted); font-size: 0.8rem; text-align: center; margin-top: 8px;">{count} opnanir frá upphafi skólaárs</p>"#,
        width = chart.width,
        height = chart.height,
        count = chart.points.len(),
    )
}

/// Horizontal bars with count and share of total.
pub fn render_bar_chart(chart: &BarChart) -> String {
    if chart.is_empty() {
        return EMPTY_STATE.to_string();
    }

    chart
        .items
        .iter()
        .map(|item| {
            format!(
                r#"<div class="h-bar-item">
  <div class="h-bar-label">{label}</div>
  <div class="h-bar-container"><div class="h-bar" style="width: {width}%; background: var(--center-color);"></div></div>
  <div class="h-bar-value">{count} <span style="color: var(--color-text-muted); font-size: 0.8em;">({pct}%)</span></div>
</div>"#,
                label = escape_html(&item.label),
                width = item.width,
                count = item.count,
                pct = item.pct,
            )
        })
        .collect()
}

pub fn render_statistics(view: &StatisticsView) -> String {
    let failures = if view.failed_months.is_empty() {
        String::new()
    } else {
        let months: Vec<String> = view
            .failed_months
            .iter()
            .map(|f| format!("{}/{}", f.month, f.year))
            .collect();
        format!(
            r#"<p class="fetch-warning">Ekki tókst að sækja mánuði: {}</p>"#,
            months.join(", ")
        )
    };

    format!(
        r#"<section class="stat-cards">{cards}</section>
{failures}<section class="chart-card"><h2>Opnanir</h2><div id="weeklyChart">{line}</div></section>
<section class="chart-card"><h2>Eftir skólum</h2><div id="schoolChart">{schools}</div></section>
<section class="chart-card"><h2>Eftir bekkjum</h2><div id="gradeChart">{grades}</div></section>"#,
        cards = render_stat_cards(view),
        line = render_line_chart(view.line_chart.as_ref()),
        schools = render_bar_chart(&view.schools),
        grades = render_bar_chart(&view.grades),
    )
}

pub fn render_activity_cards(counts: &ActivityCounts) -> String {
    ActivityStatus::ALL
        .iter()
        .map(|status| {
            format!(
                r#"<button type="button" class="activity-card" data-status="{key}" style="border-color: var({color});">
  <span class="activity-count">{count}</span>
  <span class="activity-label">{label}</span>
</button>"#,
                key = status.key(),
                color = status.color_var(),
                count = counts.get(*status),
                label = status.label(),
            )
        })
        .collect()
}

/// Breakdown for one status; bar widths relative to the largest school.
pub fn render_activity_breakdown(status: ActivityStatus, chart: Option<&BarChart>) -> String {
    let Some(chart) = chart else {
        return r#"<div class="activity-info-text">Engin gögn</div>"#.to_string();
    };

    let color = status.color_var();
    let bars: String = chart
        .items
        .iter()
        .map(|item| {
            format!(
                r#"<div class="h-bar-item">
  <div class="h-bar-label">{label}</div>
  <div class="h-bar-container"><div class="h-bar" style="width: {width}%; background: var({color});"></div></div>
  <div class="h-bar-value">{count}</div>
</div>"#,
                label = escape_html(&item.label),
                width = item.width,
                count = item.count,
            )
        })
        .collect();

    format!(
        r#"<div class="activity-breakdown-title">{} - eftir skólum</div>
<div class="horizontal-bar-chart">{bars}</div>"#,
        status.label()
    )
}

pub fn render_add_student_success(password: &str) -> String {
    format!(
        r#"<div id="addStudentSuccess" class="add-student-success">Nemandi skráður. Lykilorð: <strong id="newStudentPassword">{}</strong></div>"#,
        escape_html(password)
    )
}

pub fn render_add_student_error(message: &str) -> String {
    format!(
        r#"<div class="add-student-error" role="alert">{}</div>"#,
        escape_html(message)
    )
}

pub fn render_index(center_id: &str, statistics: &str, activity: &str, schools: &[String]) -> String {
    let school_options: String = schools
        .iter()
        .map(|school| {
            let school = escape_html(school);
            format!(r#"<option value="{school}">{school}</option>"#)
        })
        .collect();

    INDEX_HTML
        .replace("{{CENTER_ID}}", &escape_html(center_id))
        .replace("{{SCHOOL_OPTIONS}}", &school_options)
        .replace("{{ACTIVITY_CARDS}}", activity)
        .replace("{{STATISTICS}}", statistics)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="is">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Starfsfólk - tölfræði</title>
  <link rel="manifest" href="/manifest.json" />
  <style>
    :root {
      --center-color: #2f6f8f;
      --color-border: #c9d3da;
      --color-text-muted: #6b7680;
      --color-virkir: #2d9d5b;
      --color-ad-detta: #e0a526;
      --color-nylega-haettir: #e0672a;
      --color-haettir: #c63b2b;
      --color-ovirkir: #8a8f94;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      font-family: system-ui, "Segoe UI", sans-serif;
      background: #f4f6f8;
      color: #1f2a33;
      padding: 24px 16px 48px;
    }

    main {
      width: min(960px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    .stat-cards,
    .activity-cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 12px;
    }

    .stat-card,
    .chart-card,
    .activity-card,
    form {
      background: white;
      border-radius: 14px;
      padding: 16px;
      border: 1px solid var(--color-border);
    }

    .stat-value {
      font-size: 1.8rem;
      font-weight: 600;
    }

    .stat-label {
      color: var(--color-text-muted);
      font-size: 0.85rem;
    }

    .stat-change.positive {
      color: var(--color-virkir);
    }

    .stat-change.negative {
      color: var(--color-haettir);
    }

    .activity-card {
      display: grid;
      gap: 4px;
      cursor: pointer;
      border-width: 2px;
      text-align: left;
    }

    .activity-card.selected {
      box-shadow: 0 0 0 3px var(--center-color);
    }

    .activity-count {
      font-size: 1.5rem;
      font-weight: 600;
    }

    .h-bar-item {
      display: grid;
      grid-template-columns: 140px 1fr 90px;
      align-items: center;
      gap: 8px;
      margin: 6px 0;
    }

    .h-bar-container {
      background: #eef1f4;
      border-radius: 6px;
      height: 14px;
    }

    .h-bar {
      height: 100%;
      border-radius: 6px;
    }

    .fetch-warning,
    .add-student-error {
      color: var(--color-haettir);
    }

    .add-student-success {
      color: var(--color-virkir);
    }

    form {
      display: grid;
      gap: 10px;
    }
  </style>
</head>
<body>
  <main data-center-id="{{CENTER_ID}}">
    <h1>Tölfræði</h1>

    <div id="statistics">{{STATISTICS}}</div>

    <section>
      <h2>Virkni</h2>
      <div class="activity-cards">{{ACTIVITY_CARDS}}</div>
      <div id="activityBreakdown" class="chart-card"><div class="activity-info-text">Veldu flokk til að sjá skiptingu eftir skólum</div></div>
    </section>

    <section>
      <h2>Nýr nemandi</h2>
      <form id="addStudentForm" method="post" action="/students">
        <input type="hidden" name="center_id" value="{{CENTER_ID}}" />
        <label>Nafn <input id="newStudentName" name="nafn" type="text" /></label>
        <label>Skóli
          <select id="newStudentSchool" name="skoli">
            <option value="">Veldu skóla</option>
            {{SCHOOL_OPTIONS}}
            <option value="Aðrir skólar">Aðrir skólar</option>
          </select>
        </label>
        <label id="customSchoolGroup" style="display: none;">Heiti skóla <input id="customSchoolName" name="custom_skoli" type="text" /></label>
        <label>Bekkur
          <select id="newStudentGrade" name="bekkur">
            <option value="5">5. bekkur</option>
            <option value="6">6. bekkur</option>
            <option value="7">7. bekkur</option>
            <option value="8">8. bekkur</option>
            <option value="9">9. bekkur</option>
            <option value="10">10. bekkur</option>
          </select>
        </label>
        <button type="submit">Skrá nemanda</button>
        <div id="addStudentResult"></div>
      </form>
    </section>
  </main>

  <script>
    const centerId = document.querySelector('main').dataset.centerId;
    const breakdown = document.getElementById('activityBreakdown');
    const cards = Array.from(document.querySelectorAll('.activity-card'));

    cards.forEach((card) => {
      card.addEventListener('click', async () => {
        cards.forEach((c) => c.classList.remove('selected'));
        card.classList.add('selected');
        const params = new URLSearchParams({ center_id: centerId });
        const res = await fetch(`/fragments/activity/${card.dataset.status}?${params}`);
        breakdown.innerHTML = await res.text();
      });
    });

    const schoolSelect = document.getElementById('newStudentSchool');
    const customGroup = document.getElementById('customSchoolGroup');
    const customInput = document.getElementById('customSchoolName');
    schoolSelect.addEventListener('change', () => {
      const custom = schoolSelect.value === 'Aðrir skólar';
      customGroup.style.display = custom ? 'block' : 'none';
      if (!custom) customInput.value = '';
    });

    const form = document.getElementById('addStudentForm');
    const result = document.getElementById('addStudentResult');
    form.addEventListener('submit', async (event) => {
      event.preventDefault();
      const res = await fetch('/students', { method: 'POST', body: new URLSearchParams(new FormData(form)) });
      result.innerHTML = await res.text();
      if (res.ok) {
        form.reset();
        customGroup.style.display = 'none';
        setTimeout(() => { result.innerHTML = ''; }, 10000);
      }
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BarItem;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn short_date_uses_icelandic_months() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
        assert_eq!(format_short_date(date), "3. maí");
    }

    #[test]
    fn empty_line_chart_has_placeholder() {
        assert!(render_line_chart(None).contains("Engar opnanir"));
    }

    #[test]
    fn bar_chart_escapes_labels_and_shows_pct() {
        let chart = BarChart {
            items: vec![BarItem {
                label: "<Skóli>".to_string(),
                count: 4,
                width: 100.0,
                pct: 100,
            }],
            total: 4,
        };
        let html = render_bar_chart(&chart);
        assert!(html.contains("&lt;Skóli&gt;"));
        assert!(html.contains("width: 100%"));
        assert!(html.contains("(100%)"));
    }

    #[test]
    fn breakdown_uses_status_colour_and_label() {
        let chart = BarChart {
            items: vec![BarItem {
                label: "Hagaskóli".to_string(),
                count: 2,
                width: 100.0,
                pct: 100,
            }],
            total: 2,
        };
        let html = render_activity_breakdown(ActivityStatus::NylegaHaettir, Some(&chart));
        assert!(html.contains("Nýlega hættir - eftir skólum"));
        assert!(html.contains("var(--color-nylega-haettir)"));
        assert!(render_activity_breakdown(ActivityStatus::Virkir, None).contains("Engin gögn"));
    }
}
