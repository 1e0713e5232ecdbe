//! Configuration types for the mapping engine and node parser

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Charset used when no other is requested for pipeline files
pub const DEFAULT_CHARSET: Charset = Charset::Utf8;

/// How document keys that no field claims are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeys {
    /// Silently skip them
    Allow,
    /// Log a warning with a suggestion for likely typos
    #[default]
    Warn,
    /// Fail the mapping
    Deny,
}

/// Options applied to a single mapping call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingOptions {
    #[serde(default)]
    pub unknown_keys: UnknownKeys,
}

impl MappingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that reject unknown keys
    pub fn strict() -> Self {
        Self::new().with_unknown_keys(UnknownKeys::Deny)
    }

    pub fn with_unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }
}

/// Character encoding of a pipeline file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Charset {
    #[default]
    #[serde(rename = "UTF-8")]
    Utf8,
    #[serde(rename = "ISO-8859-1")]
    Latin1,
    #[serde(rename = "US-ASCII")]
    Ascii,
}

impl Charset {
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Ascii => "US-ASCII",
        }
    }

    /// Decode the full content of a file
    pub fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        match self {
            Charset::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
            }
            Charset::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Charset::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(format!(
                    "non-ASCII byte 0x{:02X} at offset {}",
                    bytes[offset], offset
                )),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('_', "-").as_str() {
            "UTF-8" | "UTF8" => Ok(Charset::Utf8),
            "ISO-8859-1" | "LATIN1" | "LATIN-1" => Ok(Charset::Latin1),
            "US-ASCII" | "ASCII" => Ok(Charset::Ascii),
            other => Err(format!("Unsupported charset: {}", other)),
        }
    }
}

/// Node parser configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Charset used by file-based builds
    #[serde(default)]
    pub charset: Charset,

    /// Options forwarded to every mapping call
    #[serde(default)]
    pub mapping: MappingOptions,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn with_mapping(mut self, mapping: MappingOptions) -> Self {
        self.mapping = mapping;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_strips_bom() {
        let decoded = Charset::Utf8.decode(b"\xEF\xBB\xBFname: flow1").unwrap();
        assert_eq!(decoded, "name: flow1");
    }

    #[test]
    fn test_utf8_rejects_invalid_bytes() {
        assert!(Charset::Utf8.decode(&[0x6E, 0xFF, 0x6F]).is_err());
    }

    #[test]
    fn test_latin1_maps_every_byte() {
        let decoded = Charset::Latin1.decode(&[0x63, 0x61, 0x66, 0xE9]).unwrap();
        assert_eq!(decoded, "café");
    }

    #[test]
    fn test_ascii_reports_offset() {
        let err = Charset::Ascii.decode(&[0x61, 0x62, 0xE9]).unwrap_err();
        assert_eq!(err, "non-ASCII byte 0xE9 at offset 2");
    }

    #[test]
    fn test_charset_from_str() {
        assert_eq!("utf-8".parse::<Charset>().unwrap(), Charset::Utf8);
        assert_eq!("ISO_8859_1".parse::<Charset>().unwrap(), Charset::Latin1);
        assert_eq!("ascii".parse::<Charset>().unwrap(), Charset::Ascii);
        assert!("EBCDIC".parse::<Charset>().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
charset: ISO-8859-1
mapping:
  unknown_keys: deny
"#;
        let config: ParserConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.charset, Charset::Latin1);
        assert_eq!(config.mapping, MappingOptions::strict());

        let defaults: ParserConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(defaults, ParserConfig::new().with_charset(DEFAULT_CHARSET));
    }
}
