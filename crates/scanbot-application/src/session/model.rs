use scanbot_core::scanner::{ScanConfig, ScanMode, ScanSource, ScanTarget};

/// Point of a chat's conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing shown yet, or a restart was requested.
    Init,
    AwaitReuseLastConfig,
    SelectTarget,
    SelectSource,
    /// Only reached for the document feeder.
    SelectDuplex,
    SelectMode,
    AwaitFrontScanConfirm,
    /// The front pass is buffered; waiting to scan the rear pass.
    AwaitRearScanConfirm,
    AwaitSimpleScanConfirm,
}

impl Phase {
    /// Whether the next confirmation triggers a scan.
    pub fn is_scan_confirmation(&self) -> bool {
        matches!(
            self,
            Phase::AwaitFrontScanConfirm | Phase::AwaitRearScanConfirm | Phase::AwaitSimpleScanConfirm
        )
    }
}

/// Choices made so far in the current configuration walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub target: Option<ScanTarget>,
    pub source: Option<ScanSource>,
    pub mode: Option<ScanMode>,
    pub duplex: Option<bool>,
}

impl Selection {
    /// The finished configuration, once target, source and mode are set and
    /// the duplex flag is set exactly when the source is the feeder.
    pub fn complete(&self) -> Option<ScanConfig> {
        let (target, source, mode) = (self.target?, self.source?, self.mode?);
        let duplex = match (source, self.duplex) {
            (ScanSource::Adf, Some(duplex)) => duplex,
            (ScanSource::Flatbed, None) => false,
            _ => return None,
        };
        Some(ScanConfig::new(target, source, mode, duplex))
    }
}

impl From<ScanConfig> for Selection {
    fn from(config: ScanConfig) -> Self {
        Self {
            target: Some(config.target),
            source: Some(config.source),
            mode: Some(config.mode),
            duplex: (config.source == ScanSource::Adf).then_some(config.duplex),
        }
    }
}
