/// Tuning knobs for registry loading and heuristic normalization
#[derive(Debug, Clone)]
pub struct MarshalConfig {
    /// Property-name fragments that mark a base64 string as binary content
    pub binary_name_hints: Vec<String>,

    /// Property-name fragments that mark long text as a character large object
    pub clob_name_hints: Vec<String>,

    /// Text strictly longer than this (in characters) is eligible for CLOB wrapping
    pub clob_length_threshold: usize,

    /// Extension of entity source files picked up by directory loading
    pub entity_file_extension: String,

    /// Number of compiled mapping descriptors kept in the registry cache
    pub mapping_cache_capacity: usize,
}

impl MarshalConfig {
    pub fn new() -> Self {
        Self {
            binary_name_hints: to_strings(&[
                "blob",
                "binary",
                "bytes",
                "image",
                "file",
                "attachment",
                "content_data",
            ]),
            clob_name_hints: to_strings(&["clob"]),
            clob_length_threshold: 255,
            entity_file_extension: "ts".to_string(),
            mapping_cache_capacity: 128,
        }
    }

    /// Replace the binary property-name hints
    pub fn binary_name_hints(mut self, hints: &[&str]) -> Self {
        self.binary_name_hints = to_strings(hints);
        self
    }

    /// Replace the CLOB property-name hints
    pub fn clob_name_hints(mut self, hints: &[&str]) -> Self {
        self.clob_name_hints = to_strings(hints);
        self
    }

    /// Set the CLOB length threshold
    pub fn clob_length_threshold(mut self, threshold: usize) -> Self {
        self.clob_length_threshold = threshold;
        self
    }

    /// Set the entity source file extension (without the dot)
    pub fn entity_file_extension(mut self, extension: &str) -> Self {
        self.entity_file_extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Set the mapping cache capacity; zero is bumped to one
    pub fn mapping_cache_capacity(mut self, capacity: usize) -> Self {
        self.mapping_cache_capacity = capacity.max(1);
        self
    }

    pub(crate) fn hints_binary(&self, property: &str) -> bool {
        name_matches(property, &self.binary_name_hints)
    }

    pub(crate) fn hints_clob(&self, property: &str) -> bool {
        name_matches(property, &self.clob_name_hints)
    }
}

impl Default for MarshalConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_ascii_lowercase()).collect()
}

fn name_matches(property: &str, hints: &[String]) -> bool {
    let property = property.to_ascii_lowercase();
    hints.iter().any(|hint| property.contains(hint.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = MarshalConfig::new()
            .binary_name_hints(&["Payload"])
            .clob_length_threshold(10)
            .entity_file_extension(".entity.ts")
            .mapping_cache_capacity(0);

        assert!(config.hints_binary("orderPAYLOAD"));
        assert!(!config.hints_binary("imageData"));
        assert_eq!(config.clob_length_threshold, 10);
        assert_eq!(config.entity_file_extension, "entity.ts");
        assert_eq!(config.mapping_cache_capacity, 1);
    }

    #[test]
    fn test_default_hints() {
        let config = MarshalConfig::default();
        assert!(config.hints_binary("profileImage"));
        assert!(config.hints_clob("descriptionClob"));
        assert!(!config.hints_clob("description"));
    }
}
