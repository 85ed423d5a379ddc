use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::blockchain::{
    DEFAULT_GENESIS_DIFFICULTY, DEFAULT_MINE_RATE_MS, DIFF_MAX, DIFF_MIN, DifficultyPolicy,
    parse_difficulty,
};
use crate::error::{ChainError, Result};

/// Default per-peer fetch timeout.
pub const DEFAULT_PEER_TIMEOUT_MS: u64 = 5000;

/// Node settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub member_nodes: Vec<String>,
    pub peer_timeout: Duration,
    pub genesis_difficulty: u32,
    pub difficulty_policy: DifficultyPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("data"),
            member_nodes: Vec::new(),
            peer_timeout: Duration::from_millis(DEFAULT_PEER_TIMEOUT_MS),
            genesis_difficulty: DEFAULT_GENESIS_DIFFICULTY,
            difficulty_policy: DifficultyPolicy::default(),
        }
    }
}

impl Config {
    /// Build from the process environment (after `.env`, if any, is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let host = get("HOST").map(str::to_string).unwrap_or(defaults.host);
        let port = match get("PORT") {
            Some(v) => parse_number::<u16>("PORT", v)?,
            None => defaults.port,
        };
        let data_dir = get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir);
        let member_nodes = get("MEMBER_NODES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().trim_end_matches('/').to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let peer_timeout = match get("PEER_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(parse_number::<u64>("PEER_TIMEOUT_MS", v)?),
            None => defaults.peer_timeout,
        };
        let genesis_difficulty = match get("GENESIS_DIFFICULTY") {
            Some(v) => parse_difficulty(v)?,
            None => defaults.genesis_difficulty,
        };

        let difficulty_policy = match get("DIFFICULTY_MODE").unwrap_or("retarget") {
            "fixed" => DifficultyPolicy::Fixed(genesis_difficulty),
            "retarget" => DifficultyPolicy::Retarget {
                mine_rate_ms: match get("MINE_RATE_MS") {
                    Some(v) => parse_number::<i64>("MINE_RATE_MS", v)?,
                    None => DEFAULT_MINE_RATE_MS,
                },
                min: match get("DIFFICULTY_MIN") {
                    Some(v) => parse_difficulty(v)?,
                    None => DIFF_MIN,
                },
                max: match get("DIFFICULTY_MAX") {
                    Some(v) => parse_difficulty(v)?,
                    None => DIFF_MAX,
                },
            },
            other => {
                return Err(ChainError::InvalidParameter(format!(
                    "DIFFICULTY_MODE must be fixed or retarget, got {other:?}"
                )));
            }
        }
        .validated()?;

        Ok(Self {
            host,
            port,
            data_dir,
            member_nodes,
            peer_timeout,
            genesis_difficulty,
            difficulty_policy,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| ChainError::InvalidParameter(format!("{key}={raw:?} is not a valid number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_vars(HashMap::new()).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert!(cfg.member_nodes.is_empty());
        assert_eq!(cfg.genesis_difficulty, DEFAULT_GENESIS_DIFFICULTY);
        assert_eq!(cfg.difficulty_policy, DifficultyPolicy::default());
    }

    #[test]
    fn parses_members_and_fixed_policy() {
        let cfg = Config::from_vars(vars(&[
            ("PORT", "3001"),
            ("MEMBER_NODES", "http://localhost:3002/, http://localhost:3003,,"),
            ("PEER_TIMEOUT_MS", "750"),
            ("DIFFICULTY_MODE", "fixed"),
            ("GENESIS_DIFFICULTY", "3"),
        ]))
        .unwrap();

        assert_eq!(cfg.port, 3001);
        assert_eq!(
            cfg.member_nodes,
            vec!["http://localhost:3002", "http://localhost:3003"]
        );
        assert_eq!(cfg.peer_timeout, Duration::from_millis(750));
        assert_eq!(cfg.difficulty_policy, DifficultyPolicy::Fixed(3));
    }

    #[test]
    fn rejects_bad_difficulty_settings() {
        for bad in [
            vec![("GENESIS_DIFFICULTY", "-2")],
            vec![("GENESIS_DIFFICULTY", "1.5")],
            vec![("DIFFICULTY_MIN", "9"), ("DIFFICULTY_MAX", "3")],
            vec![("DIFFICULTY_MAX", "300")],
            vec![("DIFFICULTY_MODE", "auto")],
            vec![("PORT", "http")],
        ] {
            let err = Config::from_vars(vars(&bad)).unwrap_err();
            assert!(matches!(err, ChainError::InvalidParameter(_)), "{bad:?}");
        }
    }
}
