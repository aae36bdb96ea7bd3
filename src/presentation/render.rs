// HTML rendering of page snapshots
use crate::domain::bus::BusDeparture;
use crate::domain::dashboard::{Card, Page, PageSnapshot, PageView};
use crate::domain::display::Indicator;
use std::fmt::Write;
use std::time::Duration;

const BOOTSTRAP_CSS: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";
const FONT_AWESOME_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css";

pub fn render_page(brand: &str, snapshot: &PageSnapshot, refresh: Duration) -> String {
    let page = snapshot.page;
    let mut body = String::new();

    match &snapshot.view {
        PageView::Pending => {
            body.push_str(r#"<p class="text-muted text-center fs-3">Loading...</p>"#);
        }
        PageView::CurrentWeather {
            temperature,
            precipitation,
        } => {
            body.push_str(r#"<div class="row g-4">"#);
            for card in [temperature, precipitation] {
                body.push_str(r#"<div class="col">"#);
                render_card(&mut body, card);
                body.push_str("</div>");
            }
            body.push_str("</div>");
        }
        PageView::Forecast { card } => render_card(&mut body, card),
        PageView::BusTable { rows } => render_bus_table(&mut body, rows),
        PageView::Unavailable { reason } => {
            let _ = write!(
                body,
                r#"<div class="alert alert-warning fs-4" role="alert">Data unavailable: {}</div>"#,
                escape(reason)
            );
        }
    }

    if let Some(at) = snapshot.refreshed_at {
        let _ = write!(
            body,
            r#"<p class="text-muted small mt-3">Updated {}</p>"#,
            at.format("%H:%M:%S UTC")
        );
    }

    body.push_str(&live_reload_script(page, snapshot.tick));

    layout(brand, Some(page), Some(refresh), page.title(), &body)
}

pub fn render_not_found(brand: &str) -> String {
    layout(
        brand,
        None,
        None,
        "Not Found",
        r#"<h1 class="text-center mt-5">404 Page Not Found</h1>"#,
    )
}

fn layout(
    brand: &str,
    active: Option<Page>,
    refresh: Option<Duration>,
    heading: &str,
    body: &str,
) -> String {
    let mut html = String::with_capacity(2048 + body.len());

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{} | {}</title>", escape(heading), escape(brand));
    if let Some(refresh) = refresh {
        let _ = writeln!(
            html,
            r#"<meta http-equiv="refresh" content="{}">"#,
            refresh.as_secs().max(1)
        );
    }
    let _ = writeln!(html, r#"<link rel="stylesheet" href="{}">"#, BOOTSTRAP_CSS);
    let _ = writeln!(html, r#"<link rel="stylesheet" href="{}">"#, FONT_AWESOME_CSS);
    html.push_str("</head>\n<body>\n");

    let _ = write!(
        html,
        r#"<nav class="navbar navbar-expand bg-primary navbar-dark px-4 fs-4" style="height: 80px"><a class="navbar-brand fs-2" href="/">{}</a><ul class="navbar-nav ms-auto">"#,
        escape(brand)
    );
    for page in Page::ALL {
        let class = if active == Some(page) {
            "nav-link active"
        } else {
            "nav-link"
        };
        let _ = write!(
            html,
            r#"<li class="nav-item me-4"><a class="{}" href="{}">{}</a></li>"#,
            class,
            page.route(),
            escape(page.title())
        );
    }
    html.push_str("</ul></nav>\n");

    let _ = write!(
        html,
        "<main class=\"container py-4\">\n{}\n</main>\n</body>\n</html>\n",
        body
    );
    html
}

fn render_card(html: &mut String, card: &Card) {
    let style = card
        .background
        .as_deref()
        .map(|colour| format!(r#" style="background-color: {}""#, escape(colour)))
        .unwrap_or_default();

    let _ = write!(
        html,
        r#"<div class="card text-center h-100"{}><div class="card-body"><h2 class="card-title">{}</h2>"#,
        style,
        escape(&card.title)
    );
    for line in &card.lines {
        let _ = write!(html, r#"<p class="card-text fs-3">{}</p>"#, escape(line));
    }
    match card.indicator {
        Some(Indicator::Icon(icon)) => {
            let _ = write!(html, r#"<i class="{} fa-10x"></i>"#, icon.css_class());
        }
        Some(Indicator::Text(text)) => {
            let _ = write!(html, r#"<p style="font-size: 40px">{}</p>"#, escape(text));
        }
        None => {}
    }
    html.push_str("</div></div>");
}

fn render_bus_table(html: &mut String, rows: &[BusDeparture]) {
    if rows.is_empty() {
        html.push_str(r#"<p class="text-muted text-center fs-3">No departures listed</p>"#);
        return;
    }

    html.push_str(
        r#"<div class="card"><div class="card-header text-white bg-primary" style="font-size: 40px">Bus Departure Times</div><table class="table table-striped fs-3 mb-0"><thead><tr><th>Service Name</th><th>Minutes Until Departure</th><th>Departure Time</th></tr></thead><tbody>"#,
    );
    for row in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&row.service_name),
            row.minutes_until_departure,
            escape(&row.departure_time)
        );
    }
    html.push_str("</tbody></table></div>");
}

/// Reload as soon as the scheduler publishes a newer tick than the one rendered.
fn live_reload_script(page: Page, tick: Option<u64>) -> String {
    let rendered = tick.map(|t| t.to_string()).unwrap_or_else(|| "null".to_string());
    format!(
        r#"<script>
const rendered = {rendered};
const events = new EventSource("/api/pages/{slug}/stream");
events.addEventListener("snapshot", (e) => {{
  if (JSON.parse(e.data).tick !== rendered) {{ events.close(); location.reload(); }}
}});
</script>"#,
        rendered = rendered,
        slug = page.slug()
    )
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
