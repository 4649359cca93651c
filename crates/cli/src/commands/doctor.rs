use marquee_core::config::{AppConfig, LoadOptions};
use marquee_core::store::InventoryStore;
use marquee_db::open_store;
use serde::Serialize;

use crate::commands::store_target;

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

impl DoctorCheck {
    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
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
            checks.push(check_store_readiness(&config));
            checks.push(check_llm_credentials(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck::skipped("store_readiness"));
            checks.push(DoctorCheck::skipped("llm_credentials"));
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

fn check_store_readiness(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "store_readiness",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let target = store_target(config);
    let result = runtime.block_on(async {
        let store = open_store(&config.store)
            .await
            .map_err(|error| format!("failed to open {target}: {error}"))?;
        store.load_all().await.map_err(|error| format!("failed to read {target}: {error}"))
    });

    match result {
        Ok(movies) if movies.is_empty() => DoctorCheck {
            name: "store_readiness",
            status: CheckStatus::Fail,
            details: format!("{target} holds no movies; run `marquee seed`"),
        },
        Ok(movies) => {
            let showtimes: usize = movies.iter().map(|movie| movie.showtimes.len()).sum();
            DoctorCheck {
                name: "store_readiness",
                status: CheckStatus::Pass,
                details: format!("{target} holds {} movies and {showtimes} showtimes", movies.len()),
            }
        }
        Err(details) => DoctorCheck { name: "store_readiness", status: CheckStatus::Fail, details },
    }
}

fn check_llm_credentials(config: &AppConfig) -> DoctorCheck {
    match config.llm.require_api_key() {
        Ok(Some(_)) => DoctorCheck {
            name: "llm_credentials",
            status: CheckStatus::Pass,
            details: format!("api key present for {:?} at {}", config.llm.provider, config.llm.base_url),
        },
        Ok(None) => DoctorCheck {
            name: "llm_credentials",
            status: CheckStatus::Pass,
            details: format!("{:?} does not require an api key", config.llm.provider),
        },
        Err(error) => DoctorCheck {
            name: "llm_credentials",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
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
