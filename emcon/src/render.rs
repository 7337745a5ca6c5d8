//! Report rendering: plain text, HTML and JSON.
//!
//! Renderers only see the read-only [`SiteReport`] view.

use clap::ValueEnum;
use emcon_common::report::SiteReport;
use std::fmt;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Output format for `emcon report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Html,
    Json,
}

/// Render several site reports in one document.
pub fn render(reports: &[SiteReport], format: ReportFormat) -> Result<String, serde_json::Error> {
    Ok(match format {
        ReportFormat::Text => reports
            .iter()
            .map(|r| TextReport::new(r).verbose(true).to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        ReportFormat::Html => reports.iter().map(|r| HtmlReport(r).to_string()).collect(),
        ReportFormat::Json => serde_json::to_string_pretty(reports)?,
    })
}

/// Plain-text site report, as printed by `emcon check`.
pub struct TextReport<'a> {
    report: &'a SiteReport,
    verbose: bool,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a SiteReport) -> Self {
        Self {
            report,
            verbose: false,
        }
    }

    /// Include expectations and per-gear detail lines.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "Site: {}", r.name())?;
        if self.verbose {
            let e = r.expectations();
            writeln!(f, "  - Report time: {}", r.report_time().format(TIME_FORMAT))?;
            writeln!(f, "  - Rated duration: {} minutes", e.rated_duration_min)?;
            writeln!(f, "  - Function test every {} days", e.function_test_interval_days)?;
            writeln!(f, "  - Duration test every {} weeks", e.duration_test_interval_weeks)?;
            writeln!(
                f,
                "  - Test required to complete within {} days of scheduled time",
                e.test_execution_timeout_days
            )?;
            writeln!(f, "  - Gear:")?;
            for gear in r.gear() {
                let c = gear.classification();
                writeln!(f, "    - {} ({}): {}", gear.id(), gear.name(), c.category())?;
                for line in c.details() {
                    writeln!(f, "        {line}")?;
                }
            }
        }
        writeln!(f, "  - Overall state: {}", r.summary().verdict())?;
        let counts: Vec<String> = r
            .summary()
            .counts()
            .iter()
            .map(|(category, n)| format!("{category}: {n}"))
            .collect();
        writeln!(f, "  - Results: {}", counts.join(", "))
    }
}

/// HTML site report.
pub struct HtmlReport<'a>(pub &'a SiteReport);

impl fmt::Display for HtmlReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        let verdict = r.summary().verdict();

        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html>")?;
        writeln!(f, "<head>")?;
        writeln!(f, "<meta charset=\"utf-8\">")?;
        writeln!(f, "<title>{}</title>", Escaped(&r.subject()))?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body>")?;
        writeln!(f, "<h1>{}</h1>", Escaped(r.name()))?;
        writeln!(f, "<p>Report time: {}</p>", r.report_time().format(TIME_FORMAT))?;
        writeln!(
            f,
            "<p>Overall state: <strong class=\"{}\">{verdict}</strong></p>",
            verdict.to_lowercase()
        )?;

        writeln!(f, "<table>")?;
        writeln!(
            f,
            "<thead><tr><th>Gear</th><th>Name</th><th>Status</th><th>Details</th></tr></thead>"
        )?;
        writeln!(f, "<tbody>")?;
        for gear in r.gear() {
            let c = gear.classification();
            let details: Vec<String> = c
                .details()
                .iter()
                .map(|line| Escaped(line).to_string())
                .collect();
            writeln!(
                f,
                "<tr class=\"status-{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                c.category().label().to_lowercase(),
                Escaped(&gear.id().to_string()),
                Escaped(gear.name()),
                c.category(),
                details.join("<br>")
            )?;
        }
        writeln!(f, "</tbody>")?;
        writeln!(f, "</table>")?;

        writeln!(f, "<h2>Summary</h2>")?;
        writeln!(f, "<ul>")?;
        for (category, n) in r.summary().counts() {
            writeln!(f, "<li>{category}: {n}</li>")?;
        }
        writeln!(f, "</ul>")?;
        writeln!(f, "</body>")?;
        writeln!(f, "</html>")
    }
}

/// HTML-escaped text.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in self.0.chars() {
            match ch {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&#39;")?,
                c => write!(f, "{c}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use emcon_common::config::{ExpectationSettings, Expectations, SiteConfig};
    use emcon_common::gear::GearId;
    use emcon_common::report::GearReport;
    use emcon_common::status::{Classification, StatusCategory};

    fn report() -> SiteReport {
        let site = SiteConfig {
            id: "hq".to_string(),
            name: "Head <office>".to_string(),
            expectations: ExpectationSettings::default(),
            buses: vec![],
            gear: vec![],
        };
        let gear = vec![
            GearReport::new(
                GearId::new("hq", "ground", 1),
                "Exit & stairs",
                Classification::new(
                    StatusCategory::Pending,
                    vec!["Function test never performed, 7 days left before overdue".to_string()],
                ),
            ),
            GearReport::new(
                GearId::new("hq", "ground", 2),
                "Lobby",
                Classification::new(StatusCategory::Pass, vec![]),
            ),
        ];
        SiteReport::new(
            &site,
            Expectations::default(),
            Utc.with_ymd_and_hms(2024, 6, 1, 7, 5, 0).unwrap(),
            gear,
        )
    }

    #[test]
    fn text_summary_only() {
        let text = TextReport::new(&report()).to_string();
        assert_eq!(
            text,
            "Site: Head <office>\n  - Overall state: Fail\n  - Results: Pending: 1, Pass: 1\n"
        );
    }

    #[test]
    fn text_verbose_lists_gear() {
        let text = TextReport::new(&report()).verbose(true).to_string();
        assert!(text.contains("  - Report time: 2024-06-01 07:05 UTC\n"));
        assert!(text.contains("  - Function test every 7 days\n"));
        assert!(text.contains("    - hq/ground/1 (Exit & stairs): Pending\n"));
        assert!(text.contains("        Function test never performed"));
        assert!(text.contains("    - hq/ground/2 (Lobby): Pass\n"));
    }

    #[test]
    fn html_is_escaped() {
        let html = HtmlReport(&report()).to_string();
        assert!(html.contains("<h1>Head &lt;office&gt;</h1>"));
        assert!(html.contains("<td>Exit &amp; stairs</td>"));
        assert!(html.contains("<tr class=\"status-pending\">"));
        assert!(html.contains("<strong class=\"fail\">Fail</strong>"));
        assert!(html.contains("<title>Head &lt;office&gt; emergency lighting status: Fail</title>"));
    }

    #[test]
    fn json_output() {
        let json = render(&[report()], ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["site"], "hq");
        assert_eq!(value[0]["summary"]["overall_pass"], false);
        assert_eq!(value[0]["gear"][0]["classification"]["category"], "Pending");
        assert_eq!(value[0]["gear"][0]["id"]["address"], 1);
    }

    #[test]
    fn text_render_joins_sites() {
        let out = render(&[report(), report()], ReportFormat::Text).unwrap();
        assert_eq!(out.matches("Site: Head <office>").count(), 2);
    }
}
