use std::env;
use std::time::Duration;

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Deadline for a single mining run triggered through the API.
    pub mine_timeout: Option<Duration>,
    /// Whether chains received through sync get their transactions checked.
    pub validate_incoming_transactions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            mine_timeout: None,
            validate_incoming_transactions: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);
        let mine_timeout = env::var("MINE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis);
        let validate_incoming_transactions = env::var("VALIDATE_INCOMING_TRANSACTIONS")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.validate_incoming_transactions);

        Self {
            host,
            port,
            mine_timeout,
            validate_incoming_transactions,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn parses_common_flag_spellings() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" ON "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
