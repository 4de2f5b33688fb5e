//! Sample Form Client
//!
//! Posts random patient forms to a running server and logs the risk message
//! each one receives.
//!
//! Usage: `sample-client [base_url] [count] [elevated_rate] [delay_ms]`

use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Random patient generator for manual testing
struct PatientGenerator {
    rng: rand::rngs::ThreadRng,
}

impl PatientGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }

    /// Measurements from a typical healthy adult
    fn generate_typical(&mut self) -> Vec<(&'static str, String)> {
        vec![
            ("age", self.rng.gen_range(29..55).to_string()),
            ("trestbps", format!("{:.0}", self.rng.gen_range(100.0..135.0))),
            ("chol", format!("{:.0}", self.rng.gen_range(160.0..230.0))),
            ("fbs", "0".to_string()),
            ("thalach", format!("{:.0}", self.rng.gen_range(150.0..195.0))),
            ("oldpeak", format!("{:.1}", self.rng.gen_range(0.0..1.0))),
            ("cp", self.random_choice(&["1", "2"]).to_string()),
            ("sex", self.random_choice(&["M", "F"]).to_string()),
            ("restecg", "0".to_string()),
            ("exang", "0".to_string()),
            ("slope", "2".to_string()),
            ("ca", "0".to_string()),
            ("thal", "2".to_string()),
        ]
    }

    /// Measurements with several elevated risk markers
    fn generate_elevated(&mut self) -> Vec<(&'static str, String)> {
        vec![
            ("age", self.rng.gen_range(55..78).to_string()),
            ("trestbps", format!("{:.0}", self.rng.gen_range(140.0..180.0))),
            ("chol", format!("{:.0}", self.rng.gen_range(250.0..350.0))),
            ("fbs", self.random_choice(&["0", "1"]).to_string()),
            ("thalach", format!("{:.0}", self.rng.gen_range(95.0..140.0))),
            ("oldpeak", format!("{:.1}", self.rng.gen_range(1.5..4.0))),
            ("cp", "0".to_string()),
            ("sex", "M".to_string()),
            ("restecg", self.random_choice(&["1", "2"]).to_string()),
            ("exang", "1".to_string()),
            ("slope", "1".to_string()),
            ("ca", self.random_choice(&["1", "2", "3"]).to_string()),
            ("thal", "3".to_string()),
        ]
    }
}

fn risk_message(page: &str) -> &'static str {
    if page.contains("High risk") {
        "high"
    } else if page.contains("Low risk") {
        "low"
    } else {
        "unknown"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("sample_client=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let base_url = args.get(1).map(|s| s.as_str()).unwrap_or("http://localhost:8501");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(20);
    let elevated_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.3);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        elevated_rate = elevated_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::new();
    let predict_url = format!("{}/predict", base_url.trim_end_matches('/'));

    if let Err(e) = client.get(base_url).send().await {
        warn!(error = %e, "Server unreachable. Running in dry-run mode.");
        return run_dry_mode(count, elevated_rate).await;
    }

    let mut generator = PatientGenerator::new();
    let mut rng = rand::thread_rng();
    let (mut high, mut low, mut failed) = (0u64, 0u64, 0u64);

    for i in 0..count {
        let elevated = rng.gen_bool(elevated_rate);
        let form = if elevated {
            generator.generate_elevated()
        } else {
            generator.generate_typical()
        };

        let response = client.post(&predict_url).form(&form).send().await?;
        let status = response.status();
        let page = response.text().await?;

        if !status.is_success() {
            failed += 1;
            warn!(status = %status, "Prediction request failed");
        } else {
            let risk = risk_message(&page);
            match risk {
                "high" => high += 1,
                "low" => low += 1,
                _ => failed += 1,
            }
            info!(request = i + 1, elevated = elevated, risk = risk, "Prediction received");
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} forms ({} high risk, {} low risk, {} failed)",
        count, high, low, failed
    );

    Ok(())
}

async fn run_dry_mode(count: u64, elevated_rate: f64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no server connection)");

    let mut generator = PatientGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let form = if rng.gen_bool(elevated_rate) {
            generator.generate_elevated()
        } else {
            generator.generate_typical()
        };

        let encoded: Vec<String> = form.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        info!("Sample form {}: {}", i + 1, encoded.join("&"));
    }

    Ok(())
}
