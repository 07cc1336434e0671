use std::{env, time::Duration};

use crate::error::AppError;

/// keccak256("PairCreated(address,address,address,uint256)")
pub const PAIR_CREATED_TOPIC: &str =
    "0x0d3648bd0f6ba80134a33ba9275ac585d9d315f0ad8355cddefde31afa28d0e9";

mod defaults {
    pub const POLL_INTERVAL_SECS: &str = "15";
    pub const MAX_BLOCK_RANGE: &str = "1000";
    pub const RPC_DELAY_MS: &str = "500";
    pub const MAX_RETRIES: &str = "5";
}

/// A DEX factory contract watched for pair creations. Loaded once at startup,
/// read-only for the process lifetime.
#[derive(Debug, Clone, Copy)]
pub struct TrackedFactory {
    pub name: &'static str,
    pub address: &'static str,
    pub event_signature: &'static str,
    pub enabled: bool,
}

/// Uniswap V2-style factories on Base. All of them emit
/// `PairCreated(address indexed, address indexed, address, uint256)`.
pub fn tracked_factories() -> Vec<TrackedFactory> {
    vec![
        TrackedFactory {
            name: "uniswap_v2",
            address: "0x8909Dc15e40173Ff4699343b6eB8132c65e18eC6",
            event_signature: PAIR_CREATED_TOPIC,
            enabled: true,
        },
        TrackedFactory {
            name: "sushiswap_v2",
            address: "0x71524B4f93c58fcbF659783284E38825f0622859",
            event_signature: PAIR_CREATED_TOPIC,
            enabled: true,
        },
        TrackedFactory {
            name: "baseswap",
            address: "0xFDa619b6d20975be80A10332cD39b9a4b0FAa8BB",
            event_signature: PAIR_CREATED_TOPIC,
            enabled: true,
        },
    ]
}

/// Poller settings read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub rpc_url: String,
    pub poll_interval: Duration,
    pub max_block_range: u64,
    pub rpc_delay_ms: u64,
    pub max_retries: u32,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, AppError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|_| AppError::InvalidConfig(key.to_string(), raw))
}

impl PollerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let rpc_url = env::var("RPC_URL").map_err(|_| AppError::MissingEnvVar("RPC_URL".into()))?;

        Ok(Self {
            rpc_url,
            poll_interval: Duration::from_secs(env_parse(
                "POLL_INTERVAL_SECS",
                defaults::POLL_INTERVAL_SECS,
            )?),
            max_block_range: env_parse("MAX_BLOCK_RANGE", defaults::MAX_BLOCK_RANGE)?,
            rpc_delay_ms: env_parse("RPC_DELAY_MS", defaults::RPC_DELAY_MS)?,
            max_retries: env_parse("MAX_RETRIES", defaults::MAX_RETRIES)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_default_factories_share_the_pair_created_signature() {
        for factory in tracked_factories() {
            assert_eq!(factory.event_signature, PAIR_CREATED_TOPIC);
            assert!(factory.address.starts_with("0x"));
            assert_eq!(factory.address.len(), 42);
        }
    }

    #[test]
    fn factory_names_are_unique() {
        let factories = tracked_factories();
        let mut names: Vec<_> = factories.iter().map(|f| f.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), factories.len());
    }
}
