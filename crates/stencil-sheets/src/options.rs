//! Template filling options

/// Options for [`TemplateBook`](crate::TemplateBook)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FillOptions {
    /// Strip forbidden characters from the names of cloned sheets instead
    /// of rejecting them. Off by default.
    pub sanitize_sheet_names: bool,
}

impl FillOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether clone target names are sanitized
    pub fn with_sanitize_sheet_names(mut self, sanitize: bool) -> Self {
        self.sanitize_sheet_names = sanitize;
        self
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(!FillOptions::default().sanitize_sheet_names);
        assert!(FillOptions::new().with_sanitize_sheet_names(true).sanitize_sheet_names);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial() {
        let options: FillOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, FillOptions::default());

        let options: FillOptions =
            serde_json::from_str(r#"{"sanitize_sheet_names": true}"#).unwrap();
        assert!(options.sanitize_sheet_names);
    }
}
