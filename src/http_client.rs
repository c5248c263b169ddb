use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::warn;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const RETRY_SLEEP_MS: u64 = 300;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

pub fn fetch_json(client: &Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .header(USER_AGENT, "Mozilla/5.0")
        .header(ACCEPT, "application/json")
        .send()
        .context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body));
    }
    Ok(body)
}

/// Fetches `url` and hands the body to `parse`, retrying both steps up to
/// `attempts` times. The last error is returned once attempts run out.
pub fn fetch_with_retry<T>(
    client: &Client,
    url: &str,
    attempts: u32,
    mut parse: impl FnMut(&str) -> Result<T>,
) -> Result<T> {
    retry(url, attempts, Duration::from_millis(RETRY_SLEEP_MS), || {
        fetch_json(client, url).and_then(|body| parse(&body))
    })
}

fn retry<T>(
    label: &str,
    attempts: u32,
    pause: Duration,
    mut step: impl FnMut() -> Result<T>,
) -> Result<T> {
    let attempts = attempts.max(1);
    let mut last_err = None;
    for attempt in 0..attempts {
        match step() {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(label, attempt = attempt + 1, error = %err, "fetch attempt failed");
                last_err = Some(err);
                if attempt + 1 < attempts && !pause.is_zero() {
                    std::thread::sleep(pause);
                }
            }
        }
    }
    let err = last_err.unwrap_or_else(|| anyhow::anyhow!("fetch failed: {label}"));
    Err(err.context(format!("giving up on {label} after {attempts} attempts")))
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn retry_stops_at_first_success() {
        let mut calls = 0;
        let value = retry("game/1", 3, Duration::ZERO, || {
            calls += 1;
            if calls < 2 {
                Err(anyhow!("timeout"))
            } else {
                Ok(calls)
            }
        })
        .unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls, 2);
    }

    #[test]
    fn retry_returns_last_error_after_final_attempt() {
        let mut calls = 0;
        let err = retry("game/2", 3, Duration::ZERO, || -> Result<()> {
            calls += 1;
            Err(anyhow!("http 503 on attempt {calls}"))
        })
        .unwrap_err();
        assert_eq!(calls, 3);
        let message = format!("{err:#}");
        assert!(message.contains("giving up on game/2 after 3 attempts"));
        assert!(message.contains("attempt 3"));
    }

    #[test]
    fn retry_always_makes_one_attempt() {
        let mut calls = 0;
        let result = retry("game/3", 0, Duration::ZERO, || -> Result<()> {
            calls += 1;
            Err(anyhow!("down"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
