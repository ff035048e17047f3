use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Hex SHA-256 of the whole upload, reported as `sourceSha256`
pub fn calculate_source_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Fingerprint of the effective configuration, written into stage summaries
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let encoded = serde_json::to_vec(config).context("serializing config for its fingerprint")?;
    Ok(calculate_source_hash(&encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    #[test]
    fn source_hash_is_stable_hex() {
        let hash = calculate_source_hash(b"lesson plan");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, calculate_source_hash(b"lesson plan"));
        assert_ne!(hash, calculate_source_hash(b"lesson plan!"));
    }

    #[test]
    fn source_hash_is_the_sha256_of_the_upload() {
        assert_eq!(
            calculate_source_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn source_hash_sees_every_byte() {
        let original = vec![b'x'; 4096];
        let mut middle = original.clone();
        middle[2048] = b'z';
        let mut tail = original.clone();
        tail[4095] = b'y';

        let hash = calculate_source_hash(&original);
        assert_ne!(hash, calculate_source_hash(&middle));
        assert_ne!(hash, calculate_source_hash(&tail));
    }

    #[test]
    fn config_hash_changes_with_limits() {
        let standard = PipelineConfig::default();
        let mut tight = PipelineConfig::default();
        tight.limits.max_text_length = 100;
        assert_ne!(
            calculate_config_hash(&standard).unwrap(),
            calculate_config_hash(&tight).unwrap()
        );
    }
}
