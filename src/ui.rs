use crate::models::{hm_time, SleepRecord, StatsResponse};
use std::fmt::Write as _;

pub fn render_login() -> String {
    PAGE_HTML
        .replace("{{TITLE}}", "Sleep Tracker")
        .replace("{{BODY}}", LOGIN_HTML)
}

pub fn render_dashboard(
    username: &str,
    records: &[SleepRecord],
    editing: Option<&SleepRecord>,
    stats: &StatsResponse,
) -> String {
    let user = escape(username);
    let base = format!("/users/{}", path_segment(username));
    let weekly = stats
        .weekly_averages
        .iter()
        .map(|week| (&week.week_key, week.average));
    let monthly = stats
        .monthly_averages
        .iter()
        .map(|month| (&month.month_key, month.average));
    let edit_section = editing
        .map(|record| edit_form(&base, record))
        .unwrap_or_default();

    // User-supplied text goes in last so it is never scanned for placeholders.
    let body = DASHBOARD_HTML
        .replace("{{USER}}", &user)
        .replace("{{BASE}}", &base)
        .replace("{{WINDOW}}", &stats.window_size.to_string())
        .replace("{{OVERALL}}", &overall_line(stats))
        .replace("{{DAILY_ROWS}}", &daily_rows(stats))
        .replace("{{WEEKLY_ROWS}}", &period_rows(weekly))
        .replace("{{MONTHLY_ROWS}}", &period_rows(monthly))
        .replace("{{RECORD_ROWS}}", &record_rows(&base, records))
        .replace("{{EDIT_FORM}}", &edit_section);

    PAGE_HTML
        .replace("{{TITLE}}", &format!("Sleep Tracker - {user}"))
        .replace("{{BODY}}", &body)
}

fn record_rows(base: &str, records: &[SleepRecord]) -> String {
    if records.is_empty() {
        return r#"<tr><td colspan="5" class="empty">No sleep logged yet.</td></tr>"#.to_string();
    }

    let mut rows = String::new();
    for record in records {
        let _ = write!(
            rows,
            concat!(
                "<tr><td>{} {}</td><td>{} {}</td><td>{:.2}</td><td>{}</td>",
                r#"<td class="row"><a href="{base}?edit={id}">Edit</a>"#,
                r#"<form method="post" action="{base}/records/{id}/delete">"#,
                r#"<button class="danger">Delete</button></form></td></tr>"#,
            ),
            record.start_date,
            hm_time::format(&record.start_time),
            record.end_date,
            hm_time::format(&record.end_time),
            record.duration,
            escape(&record.comments),
            base = base,
            id = record.id,
        );
    }
    rows
}

fn edit_form(base: &str, record: &SleepRecord) -> String {
    EDIT_HTML
        .replace("{{ACTION}}", &format!("{base}/records/{}", record.id))
        .replace("{{CANCEL}}", base)
        .replace("{{START_DATE}}", &record.start_date.to_string())
        .replace("{{START_TIME}}", &hm_time::format(&record.start_time))
        .replace("{{END_DATE}}", &record.end_date.to_string())
        .replace("{{END_TIME}}", &hm_time::format(&record.end_time))
        .replace("{{COMMENTS}}", &escape(&record.comments))
}

fn daily_rows(stats: &StatsResponse) -> String {
    let mut rows = String::new();
    for (day, rolling) in stats.daily_totals.iter().zip(&stats.rolling_average) {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>",
            day.date, day.total, rolling
        );
    }
    rows
}

fn period_rows<'a>(periods: impl Iterator<Item = (&'a String, f64)>) -> String {
    let mut rows = String::new();
    for (key, average) in periods {
        let _ = write!(rows, "<tr><td>{key}</td><td>{average:.2}</td></tr>");
    }
    rows
}

fn overall_line(stats: &StatsResponse) -> String {
    if stats.daily_totals.is_empty() {
        return String::new();
    }
    format!(
        "<p><strong>Overall Avg (Daily):</strong> {:.2} hrs/day</p>",
        stats.overall_average
    )
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Percent-encodes a value for use as a single URL path segment.
pub fn path_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

const LOGIN_HTML: &str = r#"<section class="card">
  <h1>Sleep Tracker</h1>
  <form method="get" action="/login" class="row">
    <input name="username" placeholder="Username" required />
    <button>Log in</button>
  </form>
</section>"#;

const EDIT_HTML: &str = r#"<section class="card">
  <h2>Edit entry</h2>
  <form method="post" action="{{ACTION}}" class="grid">
    <label>Start date <input type="date" name="startDate" value="{{START_DATE}}" required /></label>
    <label>Start time <input type="time" name="startTime" value="{{START_TIME}}" step="1" required /></label>
    <label>End date <input type="date" name="endDate" value="{{END_DATE}}" required /></label>
    <label>End time <input type="time" name="endTime" value="{{END_TIME}}" step="1" required /></label>
    <label class="wide">Comments <input name="comments" value="{{COMMENTS}}" /></label>
    <div class="row">
      <button>Save</button>
      <a href="{{CANCEL}}">Cancel</a>
    </div>
  </form>
</section>"#;

const DASHBOARD_HTML: &str = r#"<section class="card">
  <header class="row">
    <h1>Welcome, {{USER}}!</h1>
    <a href="/api{{BASE}}/export">Export JSON</a>
    <label>Import JSON <input type="file" id="importFile" accept="application/json" /></label>
    <a href="/">Switch user</a>
  </header>
  <p id="importStatus"></p>

  <form method="post" action="{{BASE}}/records" class="grid">
    <label>Start date <input type="date" name="startDate" required /></label>
    <label>Start time <input type="time" name="startTime" required /></label>
    <label>End date <input type="date" name="endDate" required /></label>
    <label>End time <input type="time" name="endTime" required /></label>
    <label class="wide">Comments <input name="comments" /></label>
    <button>Add entry</button>
  </form>
</section>

{{EDIT_FORM}}

<section class="card">
  <h2>Entries</h2>
  <table>
    <thead><tr><th>Start</th><th>End</th><th>Hours</th><th>Comments</th><th></th></tr></thead>
    <tbody>{{RECORD_ROWS}}</tbody>
  </table>
</section>

<section class="card">
  <h2>Daily totals</h2>
  <table>
    <thead><tr><th>Date</th><th>Total (hrs)</th><th>{{WINDOW}}-Day Rolling Avg (hrs)</th></tr></thead>
    <tbody>{{DAILY_ROWS}}</tbody>
  </table>
  {{OVERALL}}
</section>

<section class="card split">
  <div>
    <h2>Weekly averages</h2>
    <table>
      <thead><tr><th>Week</th><th>Avg (hrs/day)</th></tr></thead>
      <tbody>{{WEEKLY_ROWS}}</tbody>
    </table>
  </div>
  <div>
    <h2>Monthly averages</h2>
    <table>
      <thead><tr><th>Month</th><th>Avg (hrs/day)</th></tr></thead>
      <tbody>{{MONTHLY_ROWS}}</tbody>
    </table>
  </div>
</section>

<script>
  document.getElementById('importFile').addEventListener('change', async (event) => {
    const file = event.target.files[0];
    if (!file) return;
    const status = document.getElementById('importStatus');
    const res = await fetch('/api{{BASE}}/import', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: await file.text(),
    });
    if (res.ok) {
      window.location.reload();
    } else {
      status.textContent = 'Import failed: ' + (await res.text());
    }
    event.target.value = '';
  });
</script>
"#;

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg: #eef1f7;
      --ink: #1f2533;
      --accent: #3867d6;
      --danger: #dc3545;
      --card: #ffffff;
    }

    body {
      margin: 0;
      padding: 32px 18px;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Helvetica Neue", sans-serif;
    }

    .card {
      max-width: 880px;
      margin: 0 auto 24px;
      padding: 24px;
      background: var(--card);
      border-radius: 16px;
      box-shadow: 0 12px 32px rgba(31, 37, 51, 0.08);
    }

    .row {
      display: flex;
      gap: 12px;
      align-items: center;
      flex-wrap: wrap;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(2, minmax(0, 1fr));
      gap: 12px;
    }

    .grid .wide {
      grid-column: span 2;
    }

    .split {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 24px;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th, td {
      padding: 8px;
      border-bottom: 1px solid #e3e7ef;
      text-align: left;
    }

    .empty {
      color: #7a8194;
      text-align: center;
    }

    button {
      border: none;
      border-radius: 8px;
      padding: 8px 14px;
      background: var(--accent);
      color: #fff;
      cursor: pointer;
    }

    button.danger {
      background: var(--danger);
    }
  </style>
</head>
<body>
{{BODY}}
</body>
</html>
"#;
