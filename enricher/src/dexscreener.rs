//! DexScreener market data client
//!
//! The aggregator is treated as untrusted and optional: every field in the
//! response shape is nullable, and a missing token simply does not appear in
//! the returned pair list.

use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

const BASE_URL: &str = "https://api.dexscreener.com";
const CHAIN: &str = "base";

/// DexScreener caps batched token lookups at 30 addresses per request
pub const MAX_BATCH: usize = 30;

/// One DEX pair as reported by the aggregator. A token can appear as the base
/// token of several pairs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairInfo {
    pub base_token: BaseToken,
    pub price_usd: Option<String>,
    pub market_cap: Option<f64>,
    pub fdv: Option<f64>,
    pub liquidity: Option<Liquidity>,
    pub volume: Option<Volume>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseToken {
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Liquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Volume {
    pub h24: Option<f64>,
}

impl PairInfo {
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity
            .as_ref()
            .and_then(|l| l.usd)
            .unwrap_or(0.0)
    }
}

pub struct DexScreenerClient {
    http: reqwest::Client,
}

impl DexScreenerClient {
    pub fn new() -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http })
    }

    /// Fetch all known Base-chain pairs for up to [`MAX_BATCH`] token
    /// addresses in one request.
    pub async fn token_pairs(&self, addresses: &[String]) -> Result<Vec<PairInfo>, AppError> {
        let joined = addresses.join(",");
        let url = format!("{BASE_URL}/tokens/v1/{CHAIN}/{joined}");

        let response = self.http.get(&url).send().await?.error_for_status()?;
        let pairs = response.json::<Vec<PairInfo>>().await?;

        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aggregator_pair_response() {
        let payload = r#"[
            {
                "chainId": "base",
                "pairAddress": "0xCcCCcCCcCCCCcCCCcCcCcCCCcCcccCcccCcCCCcC",
                "baseToken": {
                    "address": "0xAaAaAAAaaAAAAaaAAaaaaaAAaAAAaaaAaAaaAaAa",
                    "name": "Example",
                    "symbol": "EXM"
                },
                "priceUsd": "0.004217",
                "marketCap": 421700.0,
                "fdv": 450000.0,
                "liquidity": { "usd": 85000.5, "base": 1.0, "quote": 2.0 },
                "volume": { "h24": 120345.7, "h6": 100.0 }
            }
        ]"#;

        let pairs: Vec<PairInfo> = serde_json::from_str(payload).unwrap();
        assert_eq!(pairs.len(), 1);

        let pair = &pairs[0];
        assert_eq!(pair.base_token.symbol.as_deref(), Some("EXM"));
        assert_eq!(pair.price_usd.as_deref(), Some("0.004217"));
        assert_eq!(pair.liquidity_usd(), 85000.5);
        assert_eq!(pair.volume.as_ref().unwrap().h24, Some(120345.7));
    }

    #[test]
    fn tolerates_sparse_pair_objects() {
        // Unresolvable or brand-new tokens often come back with nothing but
        // the base token address
        let payload = r#"[
            { "baseToken": { "address": "0xBbbBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbBb" } }
        ]"#;

        let pairs: Vec<PairInfo> = serde_json::from_str(payload).unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].price_usd.is_none());
        assert_eq!(pairs[0].liquidity_usd(), 0.0);
    }
}
