//! Options that control one generation build.
//!
//! [`GenerationOptions`] is constructed once per build through
//! [`GenerationOptionsBuilder`] and is read-only afterwards, so every compiler
//! invocation of that build sees the same values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use heck::ToUpperCamelCase;
use sha2::{Digest, Sha256};

use crate::error::{ConfigurationError, ConfigurationIssue, ConfigurationIssueKind};
use crate::request::NullableValueType;

/// Schema scalar names, e.g. `Date` or `_Any`.
const SCALAR_NAME_PATTERN: &str = r"^[_A-Za-z][_0-9A-Za-z]*$";

/// Plain or dotted target type names, e.g. `CustomDate` or `java.util.Date`.
const TARGET_TYPE_PATTERN: &str = r"^[A-Za-z_$][0-9A-Za-z_$]*(\.[A-Za-z_$][0-9A-Za-z_$]*)*$";

/// Returns true if `text` matches `regex`. Patterns are anchored, so a match is a full match.
fn matches_pattern(regex: Option<&regress::Regex>, text: &str) -> bool {
    regex.is_some_and(|regex| regex.find(text).is_some())
}

fn is_valid_variant(variant: &str) -> bool {
    variant
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Immutable generation options for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    variant: String,
    custom_type_mapping: BTreeMap<String, String>,
    use_optional: bool,
    has_guava_dep: bool,
    output_dir: PathBuf,
}

impl GenerationOptions {
    /// Path segments of the output directory below a build directory.
    pub const DEFAULT_OUTPUT_DIRECTORY: [&'static str; 3] = ["generated", "source", "graphql"];

    /// Start building options for `output_dir`.
    #[must_use]
    pub fn builder(output_dir: impl Into<PathBuf>) -> GenerationOptionsBuilder {
        GenerationOptionsBuilder::new().output_dir(output_dir)
    }

    /// `<build_dir>/generated/source/graphql`.
    #[must_use]
    pub fn default_output_dir(build_dir: &Path) -> PathBuf {
        Self::DEFAULT_OUTPUT_DIRECTORY
            .iter()
            .fold(build_dir.to_path_buf(), |dir, segment| dir.join(segment))
    }

    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    #[must_use]
    pub fn custom_type_mapping(&self) -> &BTreeMap<String, String> {
        &self.custom_type_mapping
    }

    #[must_use]
    pub fn use_optional(&self) -> bool {
        self.use_optional
    }

    #[must_use]
    pub fn has_guava_dep(&self) -> bool {
        self.has_guava_dep
    }

    /// Absolute output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Which optional-value representation generated accessors use.
    #[must_use]
    pub fn nullable_value_type(&self) -> NullableValueType {
        NullableValueType::from_flags(self.use_optional, self.has_guava_dep)
    }

    /// Task name for this variant, e.g. `generateDebugClasses` for `debug`.
    #[must_use]
    pub fn task_name(&self) -> String {
        format!("generate{}Classes", self.variant.to_upper_camel_case())
    }

    /// Stable hex digest over every option value.
    ///
    /// Two option sets have the same fingerprint iff they compare equal.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let mut field = |bytes: &[u8]| {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };
        field(self.variant.as_bytes());
        for (scalar, target) in &self.custom_type_mapping {
            field(scalar.as_bytes());
            field(target.as_bytes());
        }
        field(&[u8::from(self.use_optional), u8::from(self.has_guava_dep)]);
        field(self.output_dir.as_os_str().as_encoded_bytes());
        format!("sha256:{:x}", hasher.finalize())
    }
}

/// Validating builder for [`GenerationOptions`].
///
/// Mapping entries are kept in insertion order until [`build`](Self::build) so
/// duplicates can be reported instead of silently overwritten.
#[derive(Debug, Clone)]
pub struct GenerationOptionsBuilder {
    variant: String,
    type_mapping: Vec<(String, String)>,
    use_optional: bool,
    has_guava_dep: bool,
    output_dir: Option<PathBuf>,
}

impl Default for GenerationOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationOptionsBuilder {
    /// Defaults: empty variant, no mapping, `use_optional = true`, no Guava.
    #[must_use]
    pub fn new() -> Self {
        Self {
            variant: String::new(),
            type_mapping: Vec::new(),
            use_optional: true,
            has_guava_dep: false,
            output_dir: None,
        }
    }

    #[must_use]
    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    /// Map one schema scalar type to a target-language type.
    #[must_use]
    pub fn type_mapping(mut self, scalar: impl Into<String>, target: impl Into<String>) -> Self {
        self.type_mapping.push((scalar.into(), target.into()));
        self
    }

    #[must_use]
    pub fn type_mappings<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.type_mapping
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn use_optional(mut self, use_optional: bool) -> Self {
        self.use_optional = use_optional;
        self
    }

    #[must_use]
    pub fn has_guava_dep(mut self, has_guava_dep: bool) -> Self {
        self.has_guava_dep = has_guava_dep;
        self
    }

    #[must_use]
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Validate and freeze the options.
    ///
    /// A relative output directory is resolved against the current working
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Invalid`] listing every problem found: a
    /// missing output directory, malformed mapping keys or values, duplicate
    /// scalars, or an invalid variant.
    pub fn build(self) -> Result<GenerationOptions, ConfigurationError> {
        let mut issues: Vec<ConfigurationIssue> = Vec::new();

        if !is_valid_variant(&self.variant) {
            issues.push(ConfigurationIssue::new(
                self.variant.clone(),
                ConfigurationIssueKind::InvalidVariant,
            ));
        }

        let output_dir: Option<PathBuf> = match self.output_dir {
            Some(dir) if !dir.as_os_str().is_empty() => match std::path::absolute(&dir) {
                Ok(absolute) => Some(absolute),
                Err(_) => {
                    issues.push(ConfigurationIssue::new(
                        dir.display().to_string(),
                        ConfigurationIssueKind::UnresolvableOutputDir,
                    ));
                    None
                }
            },
            _ => {
                issues.push(ConfigurationIssue::new(
                    "",
                    ConfigurationIssueKind::MissingOutputDir,
                ));
                None
            }
        };

        let scalar_name: Option<regress::Regex> = regress::Regex::new(SCALAR_NAME_PATTERN).ok();
        let target_type: Option<regress::Regex> = regress::Regex::new(TARGET_TYPE_PATTERN).ok();
        let mut custom_type_mapping: BTreeMap<String, String> = BTreeMap::new();
        for (scalar, target) in self.type_mapping {
            if !matches_pattern(scalar_name.as_ref(), &scalar) {
                issues.push(ConfigurationIssue::new(
                    scalar.clone(),
                    ConfigurationIssueKind::InvalidScalarName,
                ));
            }
            if !matches_pattern(target_type.as_ref(), &target) {
                issues.push(ConfigurationIssue::new(
                    target.clone(),
                    ConfigurationIssueKind::InvalidTargetType,
                ));
            }
            if custom_type_mapping.contains_key(&scalar) {
                issues.push(ConfigurationIssue::new(
                    scalar,
                    ConfigurationIssueKind::DuplicateScalar,
                ));
            } else {
                custom_type_mapping.insert(scalar, target);
            }
        }

        match output_dir {
            Some(output_dir) if issues.is_empty() => Ok(GenerationOptions {
                variant: self.variant,
                custom_type_mapping,
                use_optional: self.use_optional,
                has_guava_dep: self.has_guava_dep,
                output_dir,
            }),
            _ => Err(ConfigurationError::Invalid { issues }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue_kinds(error: &ConfigurationError) -> Vec<ConfigurationIssueKind> {
        error.issues().iter().map(|issue| issue.kind).collect()
    }

    #[test]
    fn scalar_and_target_patterns_compile() {
        assert!(regress::Regex::new(SCALAR_NAME_PATTERN).is_ok());
        assert!(regress::Regex::new(TARGET_TYPE_PATTERN).is_ok());
    }

    #[test]
    fn one_compiled_pattern_checks_many_names() {
        let scalar_name: Option<regress::Regex> = regress::Regex::new(SCALAR_NAME_PATTERN).ok();

        let actual: Vec<bool> = ["Date", "_Any", "1Date", "Date!", ""]
            .iter()
            .map(|name| matches_pattern(scalar_name.as_ref(), name))
            .collect();

        let expected: Vec<bool> = vec![true, true, false, false, false];
        assert_eq!(expected, actual);
        assert!(!matches_pattern(None, "Date"));
    }

    #[test]
    fn build_keeps_values() {
        let options: GenerationOptions = GenerationOptions::builder("/build/gen")
            .variant("debug")
            .type_mapping("Date", "CustomDate")
            .use_optional(true)
            .has_guava_dep(false)
            .build()
            .expect("options should be valid");

        assert_eq!("debug", options.variant());
        assert_eq!(
            Some(&"CustomDate".to_string()),
            options.custom_type_mapping().get("Date")
        );
        assert!(options.use_optional());
        assert!(!options.has_guava_dep());
        assert_eq!(Path::new("/build/gen"), options.output_dir());
    }

    #[test]
    fn defaults_use_optional_without_guava() {
        let options: GenerationOptions = GenerationOptions::builder("/build/gen")
            .build()
            .expect("options should be valid");

        assert!(options.use_optional());
        assert!(!options.has_guava_dep());
        assert!(options.custom_type_mapping().is_empty());
        assert_eq!("", options.variant());
    }

    #[test]
    fn relative_output_dir_is_made_absolute() {
        let options: GenerationOptions = GenerationOptions::builder("build/gen")
            .build()
            .expect("options should be valid");

        assert!(options.output_dir().is_absolute());
        assert!(options.output_dir().ends_with("build/gen"));
    }

    #[test]
    fn missing_output_dir_is_rejected() {
        let error: ConfigurationError = GenerationOptionsBuilder::new()
            .build()
            .expect_err("output dir is required");

        assert_eq!(
            vec![ConfigurationIssueKind::MissingOutputDir],
            issue_kinds(&error)
        );
    }

    #[test]
    fn empty_output_dir_is_rejected() {
        let error: ConfigurationError = GenerationOptions::builder("")
            .build()
            .expect_err("empty output dir is rejected");

        assert_eq!(
            vec![ConfigurationIssueKind::MissingOutputDir],
            issue_kinds(&error)
        );
    }

    #[test]
    fn dotted_target_types_are_accepted() {
        let options: GenerationOptions = GenerationOptions::builder("/build/gen")
            .type_mapping("Date", "java.util.Date")
            .type_mapping("_Any", "Object")
            .build()
            .expect("options should be valid");

        assert_eq!(2, options.custom_type_mapping().len());
    }

    #[test]
    fn malformed_mapping_collects_every_issue() {
        let error: ConfigurationError = GenerationOptions::builder("/build/gen")
            .type_mapping("1Date", "CustomDate")
            .type_mapping("Time", "java.util.")
            .type_mapping("Date", "CustomDate")
            .type_mapping("Date", "OtherDate")
            .build()
            .expect_err("mapping is malformed");

        let expected: Vec<ConfigurationIssueKind> = vec![
            ConfigurationIssueKind::InvalidScalarName,
            ConfigurationIssueKind::InvalidTargetType,
            ConfigurationIssueKind::DuplicateScalar,
        ];
        assert_eq!(expected, issue_kinds(&error));
    }

    #[test]
    fn invalid_variant_is_rejected() {
        let error: ConfigurationError = GenerationOptions::builder("/build/gen")
            .variant("free debug")
            .build()
            .expect_err("variant with a space is rejected");

        assert_eq!(
            vec![ConfigurationIssueKind::InvalidVariant],
            issue_kinds(&error)
        );
    }

    #[test]
    fn default_output_dir_joins_segments() {
        let actual: PathBuf = GenerationOptions::default_output_dir(Path::new("/project/build"));
        let expected: PathBuf = PathBuf::from("/project/build/generated/source/graphql");
        assert_eq!(expected, actual);
    }

    #[test]
    fn task_name_capitalizes_variant() {
        let options: GenerationOptions = GenerationOptions::builder("/build/gen")
            .variant("free-debug")
            .build()
            .expect("options should be valid");

        assert_eq!("generateFreeDebugClasses", options.task_name());
    }

    #[test]
    fn nullable_value_type_follows_flags() {
        let annotated: GenerationOptions = GenerationOptions::builder("/g")
            .use_optional(false)
            .has_guava_dep(true)
            .build()
            .expect("options should be valid");
        let guava: GenerationOptions = GenerationOptions::builder("/g")
            .has_guava_dep(true)
            .build()
            .expect("options should be valid");
        let builtin: GenerationOptions = GenerationOptions::builder("/g")
            .build()
            .expect("options should be valid");

        assert_eq!(NullableValueType::Annotated, annotated.nullable_value_type());
        assert_eq!(NullableValueType::GuavaOptional, guava.nullable_value_type());
        assert_eq!(
            NullableValueType::BuiltinOptional,
            builtin.nullable_value_type()
        );
    }

    #[test]
    fn fingerprint_tracks_every_option() {
        let base: GenerationOptions = GenerationOptions::builder("/build/gen")
            .type_mapping("Date", "CustomDate")
            .build()
            .expect("options should be valid");
        let same: GenerationOptions = GenerationOptions::builder("/build/gen")
            .type_mapping("Date", "CustomDate")
            .build()
            .expect("options should be valid");
        let remapped: GenerationOptions = GenerationOptions::builder("/build/gen")
            .type_mapping("Date", "OtherDate")
            .build()
            .expect("options should be valid");
        let guava: GenerationOptions = GenerationOptions::builder("/build/gen")
            .type_mapping("Date", "CustomDate")
            .has_guava_dep(true)
            .build()
            .expect("options should be valid");

        assert_eq!(base.fingerprint(), same.fingerprint());
        assert_ne!(base.fingerprint(), remapped.fingerprint());
        assert_ne!(base.fingerprint(), guava.fingerprint());
        assert!(base.fingerprint().starts_with("sha256:"));
    }
}
