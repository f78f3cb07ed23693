use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScanBotError;

/// Where the paper is fed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanSource {
    Flatbed,
    /// Automatic document feeder
    #[serde(rename = "ADF", alias = "adf")]
    Adf,
}

impl ScanSource {
    /// Value understood by the scan backend, also used as the button label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanSource::Flatbed => "Flatbed",
            ScanSource::Adf => "ADF",
        }
    }

    /// Multi-page feeds use the backend's automatic batch mode.
    pub fn batch_mode(&self) -> &'static str {
        match self {
            ScanSource::Flatbed => "none",
            ScanSource::Adf => "auto",
        }
    }
}

impl fmt::Display for ScanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanSource {
    type Err = ScanBotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Flatbed" => Ok(ScanSource::Flatbed),
            "ADF" => Ok(ScanSource::Adf),
            other => Err(ScanBotError::InvalidChoice(format!("source '{other}'"))),
        }
    }
}

/// Colour mode of the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanMode {
    Color,
    Gray,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Color => "Color",
            ScanMode::Gray => "Gray",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanMode {
    type Err = ScanBotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Color" => Ok(ScanMode::Color),
            "Gray" => Ok(ScanMode::Gray),
            other => Err(ScanBotError::InvalidChoice(format!("mode '{other}'"))),
        }
    }
}

/// Where a finished document is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanTarget {
    /// Attach the document to the originating chat
    #[serde(rename = "telegram")]
    ChatDelivery,
    /// Upload to the document-management store
    #[serde(rename = "paperless")]
    DocumentStore,
}

impl ScanTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanTarget::ChatDelivery => "telegram",
            ScanTarget::DocumentStore => "paperless",
        }
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanTarget {
    type Err = ScanBotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "telegram" => Ok(ScanTarget::ChatDelivery),
            "paperless" => Ok(ScanTarget::DocumentStore),
            other => Err(ScanBotError::InvalidChoice(format!("target '{other}'"))),
        }
    }
}

/// Yes/No answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Yes,
    No,
}

impl Decision {
    pub const BOTH: [Decision; 2] = [Decision::Yes, Decision::No];

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Yes => "Yes",
            Decision::No => "No",
        }
    }

    pub fn from_flag(flag: bool) -> Self {
        if flag { Decision::Yes } else { Decision::No }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = ScanBotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(Decision::Yes),
            "No" => Ok(Decision::No),
            other => Err(ScanBotError::InvalidChoice(format!("decision '{other}'"))),
        }
    }
}

/// A resolved `(source, mode, target)` triple the backend can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanFunction {
    pub source: ScanSource,
    pub mode: ScanMode,
    pub target: ScanTarget,
}

impl ScanFunction {
    pub fn new(source: ScanSource, mode: ScanMode, target: ScanTarget) -> Self {
        Self {
            source,
            mode,
            target,
        }
    }
}

impl fmt::Display for ScanFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} -> {}", self.source, self.mode, self.target)
    }
}

/// A complete scan configuration as chosen by the user.
///
/// Only constructible once target, source, mode and (for ADF) the duplex flag
/// have all been chosen. Kept by the session for the "use last configuration"
/// shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub target: ScanTarget,
    pub source: ScanSource,
    pub mode: ScanMode,
    pub duplex: bool,
}

impl ScanConfig {
    /// Duplex is only meaningful for the feeder; flatbed configs never carry it.
    pub fn new(target: ScanTarget, source: ScanSource, mode: ScanMode, duplex: bool) -> Self {
        Self {
            target,
            source,
            mode,
            duplex: duplex && source == ScanSource::Adf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse_back() {
        for source in [ScanSource::Flatbed, ScanSource::Adf] {
            assert_eq!(source.as_str().parse::<ScanSource>().unwrap(), source);
        }
        for target in [ScanTarget::ChatDelivery, ScanTarget::DocumentStore] {
            assert_eq!(target.to_string().parse::<ScanTarget>().unwrap(), target);
        }
        assert_eq!("Gray".parse::<ScanMode>().unwrap(), ScanMode::Gray);
        assert!("Sepia".parse::<ScanMode>().is_err());
    }

    #[test]
    fn test_batch_mode_follows_source() {
        assert_eq!(ScanSource::Adf.batch_mode(), "auto");
        assert_eq!(ScanSource::Flatbed.batch_mode(), "none");
    }

    #[test]
    fn test_flatbed_config_drops_duplex() {
        let config = ScanConfig::new(
            ScanTarget::DocumentStore,
            ScanSource::Flatbed,
            ScanMode::Color,
            true,
        );
        assert!(!config.duplex);
    }

    #[test]
    fn test_target_deserializes_from_legacy_names() {
        let target: ScanTarget = serde_json::from_str("\"paperless\"").unwrap();
        assert_eq!(target, ScanTarget::DocumentStore);
    }
}
