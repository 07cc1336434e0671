//! PairCreated event decoder
//!
//! Event signature: PairCreated(address indexed token0, address indexed token1, address pair, uint)
//! Topic0: 0x0d3648bd0f6ba80134a33ba9275ac585d9d315f0ad8355cddefde31afa28d0e9

use alloy::{primitives::Address, rpc::types::Log};

use crate::error::AppError;

/// Decoded PairCreated event. Ephemeral: consumed immediately by the registry
/// writer, never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairCreatedEvent {
    pub token0: Address,
    pub token1: Address,
    pub pair: Address,
    pub block_number: u64,
}

/// Decode a PairCreated event from a raw log.
///
/// Topics layout:
/// - topics[0]: event signature (already matched by the filter)
/// - topics[1]: token0 (indexed, address in last 20 bytes)
/// - topics[2]: token1 (indexed, address in last 20 bytes)
///
/// Data layout:
/// - bytes 0-32: pair address (padded)
/// - bytes 32-64: pair index (uint, unused)
pub fn decode(log: &Log) -> Result<PairCreatedEvent, AppError> {
    let topics = log.inner.data.topics();

    if topics.len() < 3 {
        return Err(AppError::Decode(format!(
            "PairCreated: expected 3 topics, got {}",
            topics.len()
        )));
    }

    let token0 = Address::from_slice(&topics[1][12..]);
    let token1 = Address::from_slice(&topics[2][12..]);

    let data = log.inner.data.data.as_ref();
    if data.len() < 32 {
        return Err(AppError::Decode(format!(
            "PairCreated: data too short for pair address ({} bytes)",
            data.len()
        )));
    }
    let pair = Address::from_slice(&data[12..32]);

    let block_number = log
        .block_number
        .ok_or_else(|| AppError::Decode("PairCreated: log missing block number".into()))?;

    Ok(PairCreatedEvent {
        token0,
        token1,
        pair,
        block_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256, Bytes, LogData, B256};

    fn topic_for(addr: Address) -> B256 {
        B256::left_padding_from(addr.as_slice())
    }

    fn pair_created_log(topics: Vec<B256>, data: Vec<u8>, block_number: Option<u64>) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: address!("8909Dc15e40173Ff4699343b6eB8132c65e18eC6"),
                data: LogData::new_unchecked(topics, Bytes::from(data)),
            },
            block_hash: None,
            block_number,
            block_timestamp: None,
            transaction_hash: None,
            transaction_index: None,
            log_index: None,
            removed: false,
        }
    }

    const SIGNATURE: B256 =
        b256!("0d3648bd0f6ba80134a33ba9275ac585d9d315f0ad8355cddefde31afa28d0e9");

    fn valid_data(pair: Address) -> Vec<u8> {
        let mut data = B256::left_padding_from(pair.as_slice()).to_vec();
        data.extend_from_slice(&[0u8; 32]); // pair index
        data
    }

    #[test]
    fn decodes_valid_pair_created_log() {
        let token0 = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let token1 = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
        let pair = address!("cccccccccccccccccccccccccccccccccccccccc");

        let log = pair_created_log(
            vec![SIGNATURE, topic_for(token0), topic_for(token1)],
            valid_data(pair),
            Some(1025),
        );

        let event = decode(&log).unwrap();
        assert_eq!(event.token0, token0);
        assert_eq!(event.token1, token1);
        assert_eq!(event.pair, pair);
        assert_eq!(event.block_number, 1025);

        // Both tokens are distinct from the pair contract itself
        assert_ne!(event.token0, event.pair);
        assert_ne!(event.token1, event.pair);
    }

    #[test]
    fn rejects_log_with_missing_topics() {
        let token0 = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let pair = address!("cccccccccccccccccccccccccccccccccccccccc");

        let log = pair_created_log(
            vec![SIGNATURE, topic_for(token0)],
            valid_data(pair),
            Some(1),
        );

        assert!(matches!(decode(&log), Err(AppError::Decode(_))));
    }

    #[test]
    fn rejects_log_with_short_data() {
        let token0 = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let token1 = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

        let log = pair_created_log(
            vec![SIGNATURE, topic_for(token0), topic_for(token1)],
            vec![0u8; 16],
            Some(1),
        );

        assert!(matches!(decode(&log), Err(AppError::Decode(_))));
    }

    #[test]
    fn rejects_log_without_block_number() {
        let token0 = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let token1 = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
        let pair = address!("cccccccccccccccccccccccccccccccccccccccc");

        let log = pair_created_log(
            vec![SIGNATURE, topic_for(token0), topic_for(token1)],
            valid_data(pair),
            None,
        );

        assert!(matches!(decode(&log), Err(AppError::Decode(_))));
    }
}
