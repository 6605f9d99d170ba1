use crate::types::{CheckResult, PerfData};

/// Text and exit code handed back to the monitoring system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOutput {
    pub text: String,
    pub exit_code: i32,
}

impl PluginOutput {
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.text);
        std::process::exit(self.exit_code);
    }
}

/// Serializes an already decided result as `STATUS: message | perfdata`.
pub fn report(result: &CheckResult) -> PluginOutput {
    let state = result.status.service_state();
    let mut text = format!("{}: {}", state, plugin_text(&result.message));
    if let Some(perf) = &result.perf_data {
        text.push_str(" | ");
        text.push_str(&perf_string(perf));
    }
    PluginOutput {
        text,
        exit_code: state.exit_code(),
    }
}

/// Nagios splits plugin output at the first `|` and reads only one line, so
/// neither may come from label values or error text.
fn plugin_text(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '|' => '/',
            '\n' | '\r' => ' ',
            c => c,
        })
        .collect()
}

/// Human readable value for the summary line.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

/// `U` marks an undetermined value in perf data.
fn perf_value(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "U".to_string()
    }
}

fn perf_label(label: &str) -> String {
    let label = plugin_text(label).replace('=', "_");
    if label.contains(' ') || label.contains('\'') {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label
    }
}

pub fn perf_string(perf: &PerfData) -> String {
    let fields = [
        perf_value(perf.value),
        perf.warning.map(|r| r.to_string()).unwrap_or_default(),
        perf.critical.map(|r| r.to_string()).unwrap_or_default(),
    ];

    let s = format!("{}={}", perf_label(&perf.label), fields.join(";"));
    s.trim_end_matches(';').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::ThresholdRange;
    use crate::types::Status;

    fn perf(label: &str, value: f64) -> PerfData {
        PerfData {
            label: label.to_string(),
            value,
            warning: None,
            critical: None,
        }
    }

    fn result(status: Status, perf_data: Option<PerfData>) -> CheckResult {
        CheckResult {
            status,
            name: "load".to_string(),
            message: "load (node_load1 is 3)".to_string(),
            sample: None,
            perf_data,
        }
    }

    #[test]
    fn test_exit_codes_follow_status() {
        for (status, code) in [
            (Status::Ok, 0),
            (Status::Warning, 1),
            (Status::Critical, 2),
            (Status::Unknown, 3),
        ] {
            assert_eq!(report(&result(status, None)).exit_code, code);
        }
    }

    #[test]
    fn test_report_text() {
        let out = report(&result(Status::Ok, None));
        assert_eq!(out.text, "OK: load (node_load1 is 3)");

        let mut p = perf("node_load1", 3.0);
        p.warning = Some(ThresholdRange::parse("10").unwrap());
        p.critical = Some(ThresholdRange::parse("100").unwrap());
        let out = report(&result(Status::Ok, Some(p)));
        assert_eq!(out.text, "OK: load (node_load1 is 3) | node_load1=3;10;100");
    }

    #[test]
    fn test_pipes_and_newlines_stay_out_of_plugin_text() {
        let mut r = result(Status::Ok, Some(perf("{route=\"/a|b\"}", 5.0)));
        r.message = "queue ({route=\"/a|b\"} is 5)".to_string();
        let out = report(&r);
        assert_eq!(out.text.matches('|').count(), 1, "{}", out.text);
        assert_eq!(out.text, "OK: queue ({route=\"/a/b\"} is 5) | {route_\"/a/b\"}=5");

        let mut r = result(Status::Unknown, None);
        r.message = "error querying Prometheus: line one\nline two\r".to_string();
        let out = report(&r);
        assert!(!out.text.contains('\n') && !out.text.contains('\r'), "{:?}", out.text);
        assert_eq!(out.text, "UNKNOWN: error querying Prometheus: line one line two ");
    }

    #[test]
    fn test_perf_label_escaping() {
        let cases = [
            ("test", "test=0"),
            ("test=a", "test_a=0"),
            ("te'st", "'te''st'=0"),
            ("te st", "'te st'=0"),
            ("it's up", "'it''s up'=0"),
            ("up{job=\"a\", instance=\"b\"}", "'up{job_\"a\", instance_\"b\"}'=0"),
        ];
        for (label, expected) in cases {
            assert_eq!(perf_string(&perf(label, 0.0)), expected);
        }
    }

    #[test]
    fn test_perf_fields() {
        let mut p = perf("x", 1.5);
        p.critical = Some(ThresholdRange::parse("@2:3").unwrap());
        assert_eq!(perf_string(&p), "x=1.5;;@2:3");

        p.warning = Some(ThresholdRange::parse("~:1").unwrap());
        assert_eq!(perf_string(&p), "x=1.5;~:1;@2:3");
    }

    #[test]
    fn test_non_finite_values() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(0.25), "0.25");

        assert_eq!(perf_string(&perf("x", f64::NAN)), "x=U");
        assert_eq!(perf_string(&perf("x", f64::INFINITY)), "x=U");
    }
}
