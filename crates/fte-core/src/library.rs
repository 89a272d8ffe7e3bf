// Named format definitions loaded from JSON.

use std::collections::BTreeMap;

use crate::spec::{FormatSpec, SpecError};

/// Formats bundled with the crate.
const BUILTIN_FORMATS: &str = include_str!("../formats/default.json");

/// A named collection of format specifications.
///
/// The JSON layout is a single object mapping format names to
/// [`FormatSpec`] objects:
///
/// ```json
/// { "alphanumeric": { "regex": "^[a-zA-Z0-9]+$", "min_length": 1, "max_length": 512 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatLibrary {
    formats: BTreeMap<String, FormatSpec>,
}

impl FormatLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// The formats shipped with this crate.
    pub fn builtin() -> Result<Self, SpecError> {
        Self::from_json(BUILTIN_FORMATS)
    }

    /// Parse a library from JSON, validating every entry.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let formats: BTreeMap<String, FormatSpec> =
            serde_json::from_str(json).map_err(|e| SpecError::Library(e.to_string()))?;
        for (name, spec) in &formats {
            spec.validate()
                .map_err(|e| SpecError::Library(format!("format {name:?}: {e}")))?;
        }
        Ok(Self { formats })
    }

    /// Serialize the library back to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SpecError> {
        serde_json::to_string_pretty(&self.formats).map_err(|e| SpecError::Library(e.to_string()))
    }

    /// Look up a format by name.
    pub fn get(&self, name: &str) -> Result<&FormatSpec, SpecError> {
        self.formats
            .get(name)
            .ok_or_else(|| SpecError::UnknownFormat(name.to_string()))
    }

    /// Add or replace a format. The spec is validated first.
    pub fn insert(&mut self, name: impl Into<String>, spec: FormatSpec) -> Result<(), SpecError> {
        spec.validate()?;
        self.formats.insert(name.into(), spec);
        Ok(())
    }

    /// Format names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_library_loads() {
        let library = FormatLibrary::builtin().unwrap();
        assert!(library.len() >= 3);
        let spec = library.get("alphanumeric").unwrap();
        assert_eq!(spec.regex, "^[a-zA-Z0-9]+$");
        assert!(library.get("http-request").unwrap().regex.contains(r"\r\n"));
    }

    #[test]
    fn names_are_sorted() {
        let library = FormatLibrary::builtin().unwrap();
        let names: Vec<&str> = library.names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn unknown_format_is_reported() {
        let library = FormatLibrary::new();
        assert_eq!(
            library.get("missing").unwrap_err(),
            SpecError::UnknownFormat("missing".to_string())
        );
    }

    #[test]
    fn invalid_entry_rejects_whole_library() {
        let json = r#"{ "good": {"regex": "a", "max_length": 4},
                        "bad":  {"regex": "a", "min_length": 8, "max_length": 4} }"#;
        let err = FormatLibrary::from_json(json).unwrap_err();
        match err {
            SpecError::Library(msg) => assert!(msg.contains("bad")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            FormatLibrary::from_json("{ not json").unwrap_err(),
            SpecError::Library(_)
        ));
    }

    #[test]
    fn json_round_trip_preserves_entries() {
        let mut library = FormatLibrary::new();
        library
            .insert("ab", FormatSpec::new("^ab*$", 1, 4).unwrap())
            .unwrap();
        let json = library.to_json().unwrap();
        assert_eq!(FormatLibrary::from_json(&json).unwrap(), library);
    }
}
