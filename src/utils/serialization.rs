// Canonical binary encoding shared by transaction hashing and wallet persistence
use crate::error::{BlockchainError, Result};

/// Encode with bincode's standard configuration. Field order is declaration order,
/// so identical values always produce identical bytes.
pub fn serialize<T: bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| BlockchainError::Serialization(format!("Serialization failed: {e}")))
}

pub fn deserialize<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T> {
    let config = bincode::config::standard();
    let (data, _) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| BlockchainError::Serialization(format!("Deserialization failed: {e}")))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
    struct Record {
        timestamp: i64,
        from: String,
        to: String,
        value: i64,
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let record = Record {
            timestamp: 1_700_000_000,
            from: "alice".to_string(),
            to: "bob".to_string(),
            value: 5,
        };
        assert_eq!(serialize(&record).unwrap(), serialize(&record.clone()).unwrap());
    }

    #[test]
    fn test_field_order_matters() {
        let a = Record {
            timestamp: 1,
            from: "x".to_string(),
            to: "y".to_string(),
            value: 2,
        };
        let b = Record {
            from: "y".to_string(),
            to: "x".to_string(),
            ..a.clone()
        };
        assert_ne!(serialize(&a).unwrap(), serialize(&b).unwrap());
    }

    #[test]
    fn test_deserialize_invalid_data() {
        let invalid_bytes = vec![0xFF, 0xFF, 0xFF, 0xFF];
        let result: Result<Record> = deserialize(&invalid_bytes);
        assert!(result.is_err());
    }
}
