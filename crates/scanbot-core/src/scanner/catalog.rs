use super::model::{ScanFunction, ScanMode, ScanSource, ScanTarget};

/// Static registry of the scan functions the backend offers.
///
/// Enumeration follows catalog-definition order, which is also the order the
/// options are presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerCatalog {
    functions: Vec<ScanFunction>,
}

impl ScannerCatalog {
    pub fn new(functions: Vec<ScanFunction>) -> Self {
        Self { functions }
    }

    /// The eight combinations a stock deployment exposes.
    pub fn default_functions() -> Vec<ScanFunction> {
        use ScanMode::*;
        use ScanSource::*;
        use ScanTarget::*;

        vec![
            ScanFunction::new(Adf, Color, ChatDelivery),
            ScanFunction::new(Flatbed, Color, ChatDelivery),
            ScanFunction::new(Adf, Gray, ChatDelivery),
            ScanFunction::new(Flatbed, Gray, ChatDelivery),
            ScanFunction::new(Adf, Gray, DocumentStore),
            ScanFunction::new(Flatbed, Gray, DocumentStore),
            ScanFunction::new(Adf, Color, DocumentStore),
            ScanFunction::new(Flatbed, Color, DocumentStore),
        ]
    }

    /// Returns a catalog without any function delivering to `target`.
    pub fn without_target(&self, target: ScanTarget) -> Self {
        Self::new(
            self.functions
                .iter()
                .copied()
                .filter(|function| function.target != target)
                .collect(),
        )
    }

    pub fn functions(&self) -> &[ScanFunction] {
        &self.functions
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn targets(&self) -> Vec<ScanTarget> {
        distinct(self.functions.iter().map(|function| function.target))
    }

    pub fn sources(&self, target: ScanTarget) -> Vec<ScanSource> {
        distinct(
            self.functions
                .iter()
                .filter(|function| function.target == target)
                .map(|function| function.source),
        )
    }

    pub fn modes(&self, target: ScanTarget, source: ScanSource) -> Vec<ScanMode> {
        distinct(
            self.functions
                .iter()
                .filter(|function| function.target == target && function.source == source)
                .map(|function| function.mode),
        )
    }

    /// Resolves the unique function matching the given fields.
    ///
    /// `None` fields act as wildcards. Returns `None` when nothing matches or
    /// when the wildcards leave more than one candidate.
    pub fn resolve(
        &self,
        target: Option<ScanTarget>,
        source: Option<ScanSource>,
        mode: Option<ScanMode>,
    ) -> Option<ScanFunction> {
        let mut matches = self.functions.iter().filter(|function| {
            target.is_none_or(|t| function.target == t)
                && source.is_none_or(|s| function.source == s)
                && mode.is_none_or(|m| function.mode == m)
        });

        let first = *matches.next()?;
        // Duplicate catalog entries describe the same function.
        if matches.all(|other| *other == first) {
            Some(first)
        } else {
            None
        }
    }
}

impl Default for ScannerCatalog {
    fn default() -> Self {
        Self::new(Self::default_functions())
    }
}

fn distinct<T: PartialEq>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut out = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_keeps_catalog_order() {
        let catalog = ScannerCatalog::default();

        assert_eq!(
            catalog.targets(),
            vec![ScanTarget::ChatDelivery, ScanTarget::DocumentStore]
        );
        assert_eq!(
            catalog.sources(ScanTarget::ChatDelivery),
            vec![ScanSource::Adf, ScanSource::Flatbed]
        );
        assert_eq!(
            catalog.modes(ScanTarget::DocumentStore, ScanSource::Adf),
            vec![ScanMode::Gray, ScanMode::Color]
        );
    }

    #[test]
    fn test_resolve_every_catalog_entry() {
        let catalog = ScannerCatalog::default();

        for function in catalog.functions() {
            let resolved = catalog.resolve(
                Some(function.target),
                Some(function.source),
                Some(function.mode),
            );
            assert_eq!(resolved, Some(*function));
        }
    }

    #[test]
    fn test_resolve_missing_triple() {
        let catalog = ScannerCatalog::new(vec![ScanFunction::new(
            ScanSource::Flatbed,
            ScanMode::Gray,
            ScanTarget::DocumentStore,
        )]);

        assert_eq!(
            catalog.resolve(
                Some(ScanTarget::DocumentStore),
                Some(ScanSource::Adf),
                Some(ScanMode::Gray)
            ),
            None
        );
    }

    #[test]
    fn test_resolve_wildcard_disambiguation() {
        let catalog = ScannerCatalog::new(vec![
            ScanFunction::new(ScanSource::Adf, ScanMode::Gray, ScanTarget::DocumentStore),
            ScanFunction::new(ScanSource::Flatbed, ScanMode::Gray, ScanTarget::DocumentStore),
            ScanFunction::new(ScanSource::Flatbed, ScanMode::Color, ScanTarget::ChatDelivery),
        ]);

        // Only one function left once the target and source are fixed.
        assert_eq!(
            catalog.resolve(
                Some(ScanTarget::DocumentStore),
                Some(ScanSource::Adf),
                None
            ),
            Some(ScanFunction::new(
                ScanSource::Adf,
                ScanMode::Gray,
                ScanTarget::DocumentStore
            ))
        );
        // Two candidates remain: ambiguous.
        assert_eq!(
            catalog.resolve(Some(ScanTarget::DocumentStore), None, None),
            None
        );
    }

    #[test]
    fn test_without_target() {
        let catalog = ScannerCatalog::default().without_target(ScanTarget::DocumentStore);

        assert_eq!(catalog.targets(), vec![ScanTarget::ChatDelivery]);
        assert_eq!(catalog.functions().len(), 4);
    }
}
