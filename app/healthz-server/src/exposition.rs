//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Rendering of check rounds
//!
//! Pure functions from a [`CheckRound`] to the text report, the JSON report
//! and the Prometheus exposition. Rendering never fails on probe outcomes;
//! failed checks are just rows with a failing status.

use chrono::SecondsFormat;
use healthz_core::{CheckResult, CheckRound, Tier};
use serde::{Deserialize, Serialize};

/// Gauge family carrying one line per check
pub const STATUS_METRIC: &str = "healthcheck_status";

/// Content type of the Prometheus text exposition
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Content type of the text report
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

const NAME_WIDTH: usize = 32;
const STATUS_WIDTH: usize = 8;

/// Report format requested on `/healthz`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    /// Parse a `format` query value; anything unrecognised is text
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => ReportFormat::Json,
            _ => ReportFormat::Text,
        }
    }
}

/// Report section a tier is shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Critical,
    External,
    Workflow,
}

impl Section {
    /// Dependent results are reported with the critical ones
    pub fn of(tier: Tier) -> Self {
        match tier {
            Tier::Critical | Tier::Dependent => Section::Critical,
            Tier::Independent => Section::External,
            Tier::Workflow => Section::Workflow,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Section::Critical => "critical",
            Section::External => "external",
            Section::Workflow => "workflow",
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            Section::Critical => "----- CRITICAL -----",
            Section::External => "----- EXTERNAL -----",
            Section::Workflow => "----- WORKFLOW -----",
        }
    }
}

/// JSON report body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub data: HealthReportData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReportData {
    pub message: String,
    pub snapshot_time: String,
    pub checks: ReportChecks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportChecks {
    pub critical: Vec<ReportEntry>,
    pub external: Vec<ReportEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub status: String,
    pub message: String,
}

impl From<&CheckResult> for ReportEntry {
    fn from(result: &CheckResult) -> Self {
        Self {
            name: result.name.clone(),
            status: status_word(result.ok).to_string(),
            message: result.message.clone(),
        }
    }
}

fn status_word(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

fn snapshot_time(round: &CheckRound) -> String {
    round.produced_at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn section_results(round: &CheckRound, section: Section) -> Vec<&CheckResult> {
    round
        .iter()
        .filter(|(tier, _)| Section::of(*tier) == section)
        .map(|(_, result)| result)
        .collect()
}

/// Human-readable table
pub fn render_text(round: &CheckRound) -> String {
    let mut out = String::new();
    out.push_str("HEALTH CHECK REPORT\n");
    out.push_str(&format!("Snapshot: {}\n", snapshot_time(round)));
    out.push_str(&format!(
        "{:<name_w$}{:<status_w$}{}\n",
        "CHECK",
        "STATUS",
        "MESSAGE",
        name_w = NAME_WIDTH,
        status_w = STATUS_WIDTH
    ));

    for section in [Section::Critical, Section::External, Section::Workflow] {
        let results = section_results(round, section);
        if section == Section::Workflow && results.is_empty() {
            continue;
        }

        out.push_str(section.heading());
        out.push('\n');
        for result in results {
            out.push_str(&format!(
                "{:<name_w$}{:<status_w$}{}\n",
                result.name,
                if result.ok { "PASS" } else { "FAIL" },
                result.message,
                name_w = NAME_WIDTH,
                status_w = STATUS_WIDTH
            ));
        }
    }

    out
}

/// Structured report
pub fn render_json(round: &CheckRound) -> HealthReport {
    let message = if !round.is_initialized() {
        "Waiting for the first check round"
    } else if round.overall_ok {
        "All critical checks passed"
    } else {
        "Some critical checks failed"
    };

    let entries = |section| {
        section_results(round, section)
            .into_iter()
            .map(ReportEntry::from)
            .collect::<Vec<_>>()
    };

    HealthReport {
        status: status_word(round.overall_ok).to_string(),
        data: HealthReportData {
            message: message.to_string(),
            snapshot_time: snapshot_time(round),
            checks: ReportChecks {
                critical: entries(Section::Critical),
                external: entries(Section::External),
                workflow: entries(Section::Workflow),
            },
        },
    }
}

/// Prometheus text exposition
pub fn render_metrics(round: &CheckRound) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# HELP {} Health check status (1=ok,0=error)\n",
        STATUS_METRIC
    ));
    out.push_str(&format!("# TYPE {} gauge\n", STATUS_METRIC));

    for (tier, result) in round.iter() {
        out.push_str(&format!(
            "{}{{check=\"{}\",type=\"{}\"}} {}\n",
            STATUS_METRIC,
            escape_label_value(&result.name),
            Section::of(tier).label(),
            u8::from(result.ok)
        ));
    }

    out
}

/// Escape a label value for the Prometheus text format
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthz_core::{CheckFailure, SKIPPED_UPSTREAM_CRITICAL};

    fn failing_round() -> CheckRound {
        CheckRound::new(
            7,
            vec![
                CheckResult::new("db_connection", false, "Database connection failed"),
                CheckResult::new("config_service", true, "Config service is reachable"),
            ],
            vec![CheckResult::failure(
                "internal_api/billing",
                CheckFailure::UpstreamCriticalSkip,
            )],
            vec![CheckResult::new(
                "external_api/alipay",
                true,
                "external_api/alipay OK (120ms)",
            )],
            Vec::new(),
        )
    }

    fn passing_round_with_workflow() -> CheckRound {
        CheckRound::new(
            3,
            vec![CheckResult::new("db_connection", true, "Database is connected")],
            Vec::new(),
            vec![CheckResult::failure("external_api/sms", CheckFailure::Timeout)],
            vec![CheckResult::new(
                "endtoend_workflow",
                true,
                "Workflow executed successfully",
            )],
        )
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ReportFormat::parse(None), ReportFormat::Text);
        assert_eq!(ReportFormat::parse(Some("json")), ReportFormat::Json);
        assert_eq!(ReportFormat::parse(Some("JSON")), ReportFormat::Json);
        assert_eq!(ReportFormat::parse(Some("text")), ReportFormat::Text);
        assert_eq!(ReportFormat::parse(Some("yaml")), ReportFormat::Text);
    }

    #[test]
    fn test_text_report_layout() {
        let text = render_text(&failing_round());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "HEALTH CHECK REPORT");
        assert!(lines[1].starts_with("Snapshot: "));
        assert!(lines[2].starts_with("CHECK"));
        assert_eq!(lines[3], "----- CRITICAL -----");
        assert_eq!(
            lines[4],
            format!("{:<32}{:<8}{}", "db_connection", "FAIL", "Database connection failed")
        );
        assert!(lines[5].starts_with("config_service"));
        assert_eq!(
            lines[6],
            format!(
                "{:<32}{:<8}{}",
                "internal_api/billing", "FAIL", SKIPPED_UPSTREAM_CRITICAL
            )
        );
        assert_eq!(lines[7], "----- EXTERNAL -----");
        assert!(lines[8].contains("PASS"));
        assert_eq!(lines.len(), 9);
        assert!(!text.contains("WORKFLOW"));
    }

    #[test]
    fn test_text_report_with_workflow() {
        let text = render_text(&passing_round_with_workflow());
        assert!(text.contains("----- WORKFLOW -----"));
        assert!(text.contains("external_api/sms timed out"));
    }

    #[test]
    fn test_json_report() {
        let report = render_json(&failing_round());
        assert_eq!(report.status, "error");
        assert_eq!(report.data.message, "Some critical checks failed");
        assert_eq!(report.data.checks.critical.len(), 3);
        assert_eq!(report.data.checks.critical[2].name, "internal_api/billing");
        assert_eq!(report.data.checks.critical[2].status, "error");
        assert_eq!(report.data.checks.external[0].status, "ok");

        let value = serde_json::to_value(&report).unwrap();
        assert!(value["data"]["checks"].get("workflow").is_none());

        let report = render_json(&passing_round_with_workflow());
        assert_eq!(report.status, "ok");
        assert_eq!(report.data.message, "All critical checks passed");
        assert_eq!(report.data.checks.workflow.len(), 1);
    }

    #[test]
    fn test_json_report_before_first_round() {
        let report = render_json(&CheckRound::uninitialized());
        assert_eq!(report.status, "ok");
        assert_eq!(report.data.snapshot_time, "1970-01-01T00:00:00.000Z");
        assert!(report.data.checks.critical.is_empty());
        assert!(report.data.checks.external.is_empty());
    }

    #[test]
    fn test_metrics_exposition() {
        let metrics = render_metrics(&failing_round());
        let lines: Vec<&str> = metrics.lines().collect();

        assert_eq!(
            lines[0],
            "# HELP healthcheck_status Health check status (1=ok,0=error)"
        );
        assert_eq!(lines[1], "# TYPE healthcheck_status gauge");
        assert_eq!(
            lines[2],
            r#"healthcheck_status{check="db_connection",type="critical"} 0"#
        );
        assert_eq!(
            lines[3],
            r#"healthcheck_status{check="config_service",type="critical"} 1"#
        );
        assert_eq!(
            lines[4],
            r#"healthcheck_status{check="internal_api/billing",type="critical"} 0"#
        );
        assert_eq!(
            lines[5],
            r#"healthcheck_status{check="external_api/alipay",type="external"} 1"#
        );
        assert_eq!(lines.len(), 6);
        assert!(metrics.ends_with('\n'));
    }

    #[test]
    fn test_metrics_body_is_headers_plus_one_gauge_per_result() {
        for round in [
            failing_round(),
            passing_round_with_workflow(),
            CheckRound::uninitialized(),
        ] {
            let metrics = render_metrics(&round);
            let comments = metrics.lines().filter(|l| l.starts_with('#')).count();
            let samples: Vec<&str> = metrics.lines().filter(|l| !l.starts_with('#')).collect();

            assert_eq!(comments, 2);
            assert_eq!(samples.len(), round.len());
            assert!(samples.iter().all(|l| l.starts_with("healthcheck_status{")));
        }
    }

    #[test]
    fn test_label_escaping() {
        assert_eq!(escape_label_value(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_label_value("line\nbreak"), "line\\nbreak");

        let round = CheckRound::new(
            1,
            vec![CheckResult::new("weird\"name", true, "ok")],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        assert!(render_metrics(&round).contains(r#"check="weird\"name""#));
    }
}
