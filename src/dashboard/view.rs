//! HTML rendering. Everything here is a pure function of its inputs; the
//! handlers in `server` gather those inputs per request.

use std::fmt::Write as _;

use anyhow::Result;
use chrono_tz::Tz;

use super::{Figure, Live, Page, Snapshot, forecast_figure, history_figure};
use crate::climate::FanCommand;
use crate::db::ControlSettings;
use crate::report::summarize;
use crate::session::{Flash, FlashLevel, Session};

pub const DEFAULT_COLD_THRESHOLD_CELSIUS: f64 = 25.0;

const PLOTLY_SRC: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = r#"
@import url('https://fonts.googleapis.com/css2?family=EB+Garamond&display=swap');
body { font-family: 'EB Garamond', serif; margin: 0; display: flex; min-height: 100vh; background: #10273d; color: #f0f4f8; }
h1, h2, h3 { color: #E0FFFF; font-weight: bold; }
aside { width: 16rem; padding: 1.5rem; background: rgba(0,0,0,0.35); }
aside a { display: block; padding: 0.4rem 0.6rem; color: #cfe8ff; text-decoration: none; border-radius: 0.3rem; }
aside a.active { background: #2563eb; color: white; }
main { flex: 1; padding: 2rem; }
.metrics { display: flex; gap: 2rem; margin: 1rem 0; }
.metric .label { font-size: 0.9rem; opacity: 0.8; }
.metric .value { font-size: 2rem; }
.flash, .warning, .info { padding: 0.8rem 1rem; border-radius: 0.4rem; margin: 1rem 0; }
.success { background: rgba(34,197,94,0.3); }
.error { background: rgba(239,68,68,0.35); }
.warning { background: rgba(234,179,8,0.35); }
.info { background: rgba(59,130,246,0.3); }
form.inline { display: inline-block; margin-right: 0.5rem; }
table { border-collapse: collapse; width: 100%; }
th, td { padding: 0.3rem 0.6rem; border-bottom: 1px solid rgba(255,255,255,0.15); text-align: right; }
"#;

#[derive(Debug, Clone, Copy)]
pub struct ViewSettings {
    pub timezone: Tz,

    /// Below this temperature the latest-data page suggests switching the fan off.
    pub cold_threshold: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            cold_threshold: DEFAULT_COLD_THRESHOLD_CELSIUS,
        }
    }
}

#[derive(Debug)]
pub struct PageView<'a> {
    pub page: Page,
    pub settings: ViewSettings,
    pub session: &'a Session,
    pub flash: Option<&'a Flash>,
    pub controls: ControlSettings,
    pub last_command: Option<FanCommand>,
    pub snapshot: &'a Snapshot,
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders a complete HTML document for `view.page`.
pub fn render_page(view: &PageView<'_>) -> Result<String> {
    let mut body = String::new();

    if let Some(flash) = view.flash {
        let class = match flash.level {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        };
        write!(body, r#"<div class="flash {class}">{}</div>"#, escape(&flash.message))?;
    }

    match view.page {
        Page::Home => home(&mut body, view)?,
        Page::Overview => overview(&mut body, view)?,
        Page::Latest => latest(&mut body, view)?,
        Page::ForecastOneHour => forecast(&mut body, view, 1)?,
        Page::ForecastTwoHours => forecast(&mut body, view, 2)?,
        Page::History => history(&mut body, view)?,
        Page::Report => report(&mut body, view)?,
    }

    let mut html = String::new();
    write!(
        html,
        r#"<!DOCTYPE html>
<html lang="id">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<script src="{PLOTLY_SRC}"></script>
<style>{STYLE}</style>
</head>
<body>
<aside>
<h2>Menu</h2>
<p>Pilih halaman:</p>
<nav>"#,
        title = escape(view.page.title()),
    )?;
    for page in Page::ALL {
        let class = if page == view.page { r#" class="active""# } else { "" };
        write!(html, r#"<a href="{}"{class}>{}</a>"#, page.path(), escape(page.title()))?;
    }
    write!(html, "</nav>\n</aside>\n<main>\n{body}\n</main>\n</body>\n</html>\n")?;

    Ok(html)
}

fn no_data(out: &mut String) -> Result<()> {
    write!(out, r#"<div class="info">Belum ada data sensor.</div>"#)?;
    Ok(())
}

fn metric(out: &mut String, label: &str, value: &str) -> Result<()> {
    write!(
        out,
        r#"<div class="metric"><div class="label">{}</div><div class="value">{}</div></div>"#,
        escape(label),
        escape(value)
    )?;
    Ok(())
}

fn fan_buttons(out: &mut String, view: &PageView<'_>) -> Result<()> {
    let return_to = view.page.slug();
    for (command, label) in [(FanCommand::On, "Hidupkan Kipas"), (FanCommand::Off, "Matikan Kipas")] {
        write!(
            out,
            r#"<form class="inline" method="post" action="/fan/{}"><input type="hidden" name="return_to" value="{return_to}"><button type="submit">{label}</button></form>"#,
            command.as_str().to_lowercase(),
        )?;
    }
    if let Some(command) = view.last_command {
        write!(out, "<p>Perintah terakhir: <strong>{command}</strong></p>")?;
    }
    Ok(())
}

fn temperature_form(out: &mut String, view: &PageView<'_>, action: &str, label: &str, button: &str) -> Result<()> {
    write!(
        out,
        r#"<form method="post" action="{action}">
<label>{label}<br><input type="number" name="celsius" min="0" max="100" step="0.1" value="0.0" required></label>
<input type="hidden" name="return_to" value="{}">
<button type="submit">{button}</button>
</form>"#,
        view.page.slug(),
        label = escape(label),
        button = escape(button),
    )?;
    Ok(())
}

fn chart(out: &mut String, id: &str, figure: &Figure) -> Result<()> {
    write!(
        out,
        r#"<div id="{id}"></div>
<script>(function () {{ const figure = {}; Plotly.newPlot("{id}", figure.data, figure.layout); }})();</script>"#,
        figure.to_script_json()?
    )?;
    Ok(())
}

fn home(out: &mut String, view: &PageView<'_>) -> Result<()> {
    write!(out, "<h1>Selamat Datang di Website Kami</h1><h1>Silakan atur suhu sesuka Anda</h1>")?;

    temperature_form(
        out,
        view,
        "/controls/setpoint",
        "Masukkan suhu yang diinginkan (dalam derajat Celsius):",
        "Atur Suhu",
    )?;
    if let Some(setpoint) = view.controls.setpoint_celsius {
        write!(out, "<p>Suhu saat ini diatur ke {setpoint:.2} °C</p>")?;
    }

    fan_buttons(out, view)
}

fn overview(out: &mut String, view: &PageView<'_>) -> Result<()> {
    write!(out, "<h1>Dashboard Utama</h1><h2>Status Sistem</h2>")?;

    match view.snapshot.live.as_ref().and_then(|l| l.series.latest()) {
        Some(latest) => {
            out.push_str(r#"<div class="metrics">"#);
            metric(out, "Suhu Ruangan", &format!("{:.2} °C", latest.temperature))?;
            metric(out, "Kelembapan Ruangan", &format!("{:.2} %", latest.humidity))?;
            let fan = if latest.fan_active() { "Aktif" } else { "Tidak Aktif" };
            metric(out, "Status Kipas", fan)?;
            out.push_str("</div>");
        }
        None => no_data(out)?,
    }

    write!(out, "<h2>Kontrol Utama</h2>")?;
    fan_buttons(out, view)?;

    temperature_form(
        out,
        view,
        "/controls/target",
        "Masukkan suhu target (dalam derajat Celsius):",
        "Atur Suhu Target",
    )?;
    if let Some(target) = view.controls.target_celsius {
        write!(out, "<p>Suhu target saat ini {target:.2} °C</p>")?;
    }

    Ok(())
}

fn latest(out: &mut String, view: &PageView<'_>) -> Result<()> {
    write!(out, "<h1>Data Terbaru</h1>")?;

    let Some(latest) = view.snapshot.live.as_ref().and_then(|l| l.series.latest()) else {
        return no_data(out);
    };

    out.push_str(r#"<div class="metrics">"#);
    metric(out, "Temperature Sekarang", &format!("{:.2} C", latest.temperature))?;
    metric(out, "Kelembapan Sekarang", &format!("{:.2} %", latest.humidity))?;
    out.push_str("</div>");

    if view.session.cold_warning_acknowledged {
        write!(out, r#"<div class="flash success">Kipas Telah dimatikan</div>"#)?;
    } else if latest.temperature < view.settings.cold_threshold {
        write!(
            out,
            r#"<div class="warning">🥶 Suhu dingin, matikan Kipas!
<form method="post" action="/cold-warning/acknowledge"><button type="submit">Matikan Kipas</button></form></div>"#
        )?;
    }

    Ok(())
}

fn forecast(out: &mut String, view: &PageView<'_>, hours: u32) -> Result<()> {
    let title = format!("Prediksi Suhu {hours} Jam Ke Depan");
    write!(out, "<h1>{title}</h1>")?;

    let Some(Live { series, forecasts }) = &view.snapshot.live else {
        return no_data(out);
    };
    let Some(forecasts) = forecasts else {
        write!(out, r#"<div class="info">Data belum cukup untuk prediksi.</div>"#)?;
        return Ok(());
    };

    chart(
        out,
        "forecast-chart",
        &forecast_figure(series, forecasts.hours_ahead(hours), view.settings.timezone, &title),
    )
}

fn history(out: &mut String, view: &PageView<'_>) -> Result<()> {
    write!(out, "<h1>History Suhu</h1>")?;

    let history = &view.snapshot.history;
    if history.is_empty() {
        return no_data(out);
    }

    chart(
        out,
        "history-chart",
        &history_figure(history, view.settings.timezone, "History Temperature"),
    )?;

    out.push_str("<table><thead><tr><th>timestamp</th><th>temperature</th><th>humidity</th><th>fan</th></tr></thead><tbody>");
    for bucket in history {
        write!(
            out,
            "<tr><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{}</td></tr>",
            bucket.timestamp.with_timezone(&view.settings.timezone).format("%Y-%m-%d %H:%M:%S"),
            bucket.temperature,
            bucket.humidity,
            bucket.fan
        )?;
    }
    out.push_str("</tbody></table>");

    Ok(())
}

fn report(out: &mut String, view: &PageView<'_>) -> Result<()> {
    write!(out, "<h1>Statistik dan Laporan</h1><h2>Grafik Suhu</h2>")?;

    let history = &view.snapshot.history;
    match summarize(history) {
        Some(summary) => {
            chart(
                out,
                "report-chart",
                &history_figure(history, view.settings.timezone, "Grafik Suhu"),
            )?;

            write!(
                out,
                r#"<h2>Ringkasan</h2>
<table><thead><tr><th></th><th>min</th><th>rata-rata</th><th>max</th></tr></thead><tbody>
<tr><td>Suhu (°C)</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>
<tr><td>Kelembapan (%)</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>
</tbody></table>
<p>{} data dalam {} interval 15 menit, kipas aktif pada {:.0}% interval.</p>
<p><a href="/reports/history.csv">Unduh CSV</a></p>"#,
                summary.temperature.min,
                summary.temperature.mean,
                summary.temperature.max,
                summary.humidity.min,
                summary.humidity.mean,
                summary.humidity.max,
                summary.readings,
                summary.buckets,
                summary.fan_on_ratio * 100.0,
            )?;
        }
        None => no_data(out)?,
    }

    write!(
        out,
        "<h2>Konsumsi Energi</h2><p>Informasi konsumsi energi akan ditambahkan di sini.</p>"
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::climate::{SensorReading, interval};
    use crate::forecast::{Forecaster, GradientBoostedModel, Node, Tree};

    fn snapshot(temperature: f64) -> Snapshot {
        snapshot_of(6, temperature)
    }

    fn snapshot_of(len: i32, temperature: f64) -> Snapshot {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let readings: Vec<_> = (0..len)
            .map(|i| SensorReading {
                timestamp: start + interval() * i,
                temperature,
                humidity: 61.0,
                fan: 1,
            })
            .collect();
        let model = GradientBoostedModel::new(2, 26.0, vec![Tree::new(vec![Node::Leaf(0.0)])]).unwrap();
        Snapshot::build(&readings, &Forecaster::from_model(model)).unwrap()
    }

    fn render(page: Page, session: &Session, snapshot: &Snapshot) -> String {
        render_page(&PageView {
            page,
            settings: ViewSettings::default(),
            session,
            flash: None,
            controls: ControlSettings::default(),
            last_command: None,
            snapshot,
        })
        .unwrap()
    }

    #[test]
    fn sidebar_lists_every_page() {
        let html = render(Page::Home, &Session::default(), &snapshot(27.0));

        for page in Page::ALL {
            assert!(html.contains(&page.path()));
            assert!(html.contains(page.title()));
        }
        assert!(html.contains(r#"<a href="/page/home" class="active">"#));
    }

    #[test]
    fn overview_shows_latest_metrics() {
        let html = render(Page::Overview, &Session::default(), &snapshot(27.0));

        assert!(html.contains("27.00 °C"));
        assert!(html.contains("61.00 %"));
        assert!(html.contains(r#"<div class="value">Aktif</div>"#));
        assert!(html.contains("Atur Suhu Target"));
    }

    #[test]
    fn cold_warning_until_acknowledged() {
        let cold = snapshot(22.0);

        let html = render(Page::Latest, &Session::default(), &cold);
        assert!(html.contains("Suhu dingin, matikan Kipas!"));

        let acknowledged = Session {
            cold_warning_acknowledged: true,
            flash: None,
        };
        let html = render(Page::Latest, &acknowledged, &cold);
        assert!(!html.contains("Suhu dingin"));
        assert!(html.contains("Kipas Telah dimatikan"));
    }

    #[test]
    fn no_cold_warning_when_warm() {
        let html = render(Page::Latest, &Session::default(), &snapshot(25.0));
        assert!(!html.contains("Suhu dingin"));
    }

    #[test]
    fn forecast_page_embeds_chart() {
        let html = render(Page::ForecastTwoHours, &Session::default(), &snapshot(27.0));

        assert!(html.contains("Prediksi Suhu 2 Jam Ke Depan"));
        assert!(html.contains("Plotly.newPlot(\"forecast-chart\""));
        assert!(html.contains("Predicted Temperature"));
    }

    #[test]
    fn data_pages_handle_missing_data() {
        let empty = Snapshot {
            history: vec![],
            live: None,
        };

        for page in [Page::Overview, Page::Latest, Page::ForecastOneHour, Page::History, Page::Report] {
            let html = render(page, &Session::default(), &empty);
            assert!(html.contains("Belum ada data sensor."), "{page}");
        }
    }

    #[test]
    fn pages_render_before_enough_history_for_forecasts() {
        let sparse = snapshot_of(1, 27.0);

        for page in Page::ALL {
            render(page, &Session::default(), &sparse);
        }

        let html = render(Page::Overview, &Session::default(), &sparse);
        assert!(html.contains("27.00 °C"));

        for page in [Page::ForecastOneHour, Page::ForecastTwoHours] {
            let html = render(page, &Session::default(), &sparse);
            assert!(html.contains("Data belum cukup untuk prediksi."), "{page}");
            assert!(!html.contains("forecast-chart"), "{page}");
        }
    }

    #[test]
    fn flash_message_is_escaped() {
        let flash = Flash::error("<script>alert(1)</script>");
        let session = Session::default();
        let snapshot = snapshot(27.0);

        let html = render_page(&PageView {
            page: Page::Home,
            settings: ViewSettings::default(),
            session: &session,
            flash: Some(&flash),
            controls: ControlSettings::default(),
            last_command: Some(FanCommand::On),
            snapshot: &snapshot,
        })
        .unwrap();

        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("Perintah terakhir: <strong>ON</strong>"));
    }

    #[test]
    fn report_has_summary_and_download() {
        let html = render(Page::Report, &Session::default(), &snapshot(27.0));

        assert!(html.contains("Ringkasan"));
        assert!(html.contains("/reports/history.csv"));
        assert!(html.contains("Konsumsi Energi"));
    }
}
