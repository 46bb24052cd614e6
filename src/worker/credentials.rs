use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::PilotConfig;
use crate::error::{PilotError, Result};

/// Farmer and pool keys passed to every worker. Opaque to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub farmer_key: String,
    pub pool_key: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.farmer_key.is_empty() && !self.pool_key.is_empty()
    }
}

/// Use the configured keys, or ask the worker (`<exe> keys show`) when neither
/// is configured.
pub async fn resolve_credentials(config: &PilotConfig, executable: &Path) -> Result<Credentials> {
    let configured = Credentials {
        farmer_key: config.farmer_key.trim().to_string(),
        pool_key: config.pool_key.trim().to_string(),
    };

    let credentials = if configured.farmer_key.is_empty() && configured.pool_key.is_empty() {
        info!(executable = %executable.display(), "No keys configured, reading them from the worker");
        extract_credentials(executable).await?
    } else {
        configured
    };

    if !credentials.is_complete() {
        return Err(PilotError::CredentialsMissing);
    }
    Ok(credentials)
}

pub async fn extract_credentials(executable: &Path) -> Result<Credentials> {
    let output = Command::new(executable)
        .args(["keys", "show"])
        .output()
        .await
        .map_err(|e| PilotError::CredentialExtraction(format!("{}: {e}", executable.display())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PilotError::CredentialExtraction(format!(
            "keys show exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let credentials = parse_keys_output(&String::from_utf8_lossy(&output.stdout));
    debug!(
        farmer_found = !credentials.farmer_key.is_empty(),
        pool_found = !credentials.pool_key.is_empty(),
        "Parsed keys output"
    );
    Ok(credentials)
}

/// Parse `Label: value` lines. The first line mentioning `Farmer` gives the
/// farmer key, the first mentioning `Pool` gives the pool key.
pub fn parse_keys_output(output: &str) -> Credentials {
    let mut farmer_key = String::new();
    let mut pool_key = String::new();

    for line in output.lines() {
        let Some((label, value)) = line.split_once(": ") else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if farmer_key.is_empty() && label.contains("Farmer") {
            farmer_key = value.to_string();
        } else if pool_key.is_empty() && label.contains("Pool") {
            pool_key = value.to_string();
        }
    }

    Credentials {
        farmer_key,
        pool_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS_SHOW: &str = "\
Showing all public keys derived from your master seed and private key:

Fingerprint: 2104826454
Master public key (m): 8ab3e1c5a5f5
Farmer public key (m/12381/8444/0/0): 91f0e2c7b4
Pool public key (m/12381/8444/1/0): a63d8e01ff
First wallet address: xch1qz9
";

    #[test]
    fn test_parse_keys_output() {
        let creds = parse_keys_output(KEYS_SHOW);
        assert_eq!(creds.farmer_key, "91f0e2c7b4");
        assert_eq!(creds.pool_key, "a63d8e01ff");
        assert!(creds.is_complete());
    }

    #[test]
    fn test_parse_keys_output_crlf() {
        let output = KEYS_SHOW.replace('\n', "\r\n");
        let creds = parse_keys_output(&output);
        assert_eq!(creds.farmer_key, "91f0e2c7b4");
        assert_eq!(creds.pool_key, "a63d8e01ff");
    }

    #[test]
    fn test_first_key_wins() {
        let output = "Farmer public key: aaa\nFarmer public key: bbb\n";
        let creds = parse_keys_output(output);
        assert_eq!(creds.farmer_key, "aaa");
        assert!(creds.pool_key.is_empty());
        assert!(!creds.is_complete());
    }

    #[tokio::test]
    async fn test_configured_keys_skip_extraction() {
        let config = PilotConfig {
            farmer_key: "f".into(),
            pool_key: "p".into(),
            ..Default::default()
        };
        let creds = resolve_credentials(&config, Path::new("/nonexistent/chia"))
            .await
            .unwrap();
        assert_eq!(creds.farmer_key, "f");
    }

    #[tokio::test]
    async fn test_partial_keys_are_missing() {
        let config = PilotConfig {
            farmer_key: "f".into(),
            ..Default::default()
        };
        let err = resolve_credentials(&config, Path::new("/nonexistent/chia"))
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::CredentialsMissing));
    }

    #[tokio::test]
    async fn test_extraction_failure_reported() {
        let err = extract_credentials(Path::new("/nonexistent/chia"))
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::CredentialExtraction(_)));
    }
}
