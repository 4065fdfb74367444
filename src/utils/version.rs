//! Config version encoding
//!
//! Unversioned S3 buckets track config versions as sequential integers;
//! callers address either a specific number or the newest version.

use crate::constants::{LATEST_VERSION, ZFILL};
use std::fmt;
use std::str::FromStr;

/// A config version: the newest one, or a specific sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigVersion {
    #[default]
    Latest,
    Number(u64),
}

impl ConfigVersion {
    /// Encoded form: `"LATEST"` or the decimal number without padding.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Zero-padded form used in S3 object names, e.g. `"000007"`.
    pub fn zero_padded(&self) -> String {
        match self {
            ConfigVersion::Latest => LATEST_VERSION.to_string(),
            ConfigVersion::Number(n) => format!("{:0width$}", n, width = ZFILL),
        }
    }
}

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigVersion::Latest => f.write_str(LATEST_VERSION),
            ConfigVersion::Number(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for ConfigVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == LATEST_VERSION {
            return Ok(ConfigVersion::Latest);
        }
        let n: u64 = s
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid config version: {s:?}"))?;
        Ok(ConfigVersion::Number(n))
    }
}

impl From<u64> for ConfigVersion {
    fn from(n: u64) -> Self {
        ConfigVersion::Number(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(ConfigVersion::Latest.encode(), "LATEST");
        assert_eq!(ConfigVersion::Number(1).encode(), "1");
        assert_eq!(ConfigVersion::Number(999999).encode(), "999999");
    }

    #[test]
    fn test_parse() {
        assert_eq!("LATEST".parse::<ConfigVersion>().unwrap(), ConfigVersion::Latest);
        assert_eq!("1".parse::<ConfigVersion>().unwrap(), ConfigVersion::Number(1));
        // zero-padded file-name forms parse back to the plain number
        assert_eq!("000001".parse::<ConfigVersion>().unwrap(), ConfigVersion::Number(1));
        assert!("latest".parse::<ConfigVersion>().is_err());
        assert!("v1".parse::<ConfigVersion>().is_err());
    }

    #[test]
    fn test_zero_padded() {
        assert_eq!(ConfigVersion::Number(7).zero_padded(), "000007");
        assert_eq!(ConfigVersion::Number(123456).zero_padded(), "123456");
        assert_eq!(ConfigVersion::Latest.zero_padded(), "LATEST");
    }
}
