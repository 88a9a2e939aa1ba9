use serde::Serialize;

use portico_core::config::{AppConfig, LoadOptions};
use portico_upstream::client::PlatformClient;

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_upstream_url_shape(&config));
            checks.push(check_upstream_reachability(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "upstream_url_shape",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "upstream_reachability",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Config validation only requires an http(s) scheme; this also catches a
/// base URL with nothing after the scheme.
fn check_upstream_url_shape(config: &AppConfig) -> DoctorCheck {
    let base_url = config.upstream.base_url_trimmed();
    let remainder = base_url
        .strip_prefix("https://")
        .or_else(|| base_url.strip_prefix("http://"))
        .unwrap_or_default();
    let host = remainder.split('/').next().unwrap_or_default();

    if host.is_empty() {
        return DoctorCheck {
            name: "upstream_url_shape",
            status: CheckStatus::Fail,
            details: format!("base URL `{base_url}` has no host"),
        };
    }

    DoctorCheck {
        name: "upstream_url_shape",
        status: CheckStatus::Pass,
        details: format!("backend host `{host}`"),
    }
}

fn check_upstream_reachability(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "upstream_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let client = PlatformClient::from_config(&config.upstream)
            .map_err(|error| format!("failed to construct http client: {error}"))?;
        let raw = client
            .probe_health()
            .await
            .map_err(|error| format!("backend probe failed: {error}"))?;
        Ok::<u16, String>(raw.status)
    });

    match result {
        Ok(status) => DoctorCheck {
            name: "upstream_reachability",
            status: CheckStatus::Pass,
            details: format!(
                "backend responded with status {status} at `{}{}`",
                config.upstream.base_url_trimmed(),
                config.upstream.health_path
            ),
        },
        Err(error) => {
            DoctorCheck { name: "upstream_reachability", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
