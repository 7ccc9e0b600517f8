//! The value handed to a [`Compiler`](crate::Compiler) for one stale input.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::options::GenerationOptions;
use crate::source::SourceInput;

/// Optional-value representation emitted for nullable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullableValueType {
    /// Plain values with nullability annotations.
    Annotated,
    /// The target language's built-in optional type.
    BuiltinOptional,
    /// Guava's `Optional`.
    GuavaOptional,
}

impl NullableValueType {
    #[must_use]
    pub fn from_flags(use_optional: bool, has_guava_dep: bool) -> Self {
        match (use_optional, has_guava_dep) {
            (false, _) => Self::Annotated,
            (true, true) => Self::GuavaOptional,
            (true, false) => Self::BuiltinOptional,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Annotated => "annotated",
            Self::BuiltinOptional => "builtin-optional",
            Self::GuavaOptional => "guava-optional",
        }
    }
}

impl fmt::Display for NullableValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input file paired with the build's options.
///
/// Borrowed from the change set and the options; used for exactly one
/// compiler invocation.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    input_file: &'a Path,
    options: &'a GenerationOptions,
}

impl<'a> GenerationRequest<'a> {
    #[must_use]
    pub fn new(input_file: &'a Path, options: &'a GenerationOptions) -> Self {
        Self {
            input_file,
            options,
        }
    }

    /// One request per input, in input order.
    pub fn for_inputs(
        inputs: &'a [SourceInput],
        options: &'a GenerationOptions,
    ) -> impl Iterator<Item = GenerationRequest<'a>> {
        inputs
            .iter()
            .map(move |input| GenerationRequest::new(input.path(), options))
    }

    #[must_use]
    pub fn input_file(&self) -> &'a Path {
        self.input_file
    }

    #[must_use]
    pub fn output_dir(&self) -> &'a Path {
        self.options.output_dir()
    }

    #[must_use]
    pub fn type_mapping(&self) -> &'a BTreeMap<String, String> {
        self.options.custom_type_mapping()
    }

    #[must_use]
    pub fn use_optional(&self) -> bool {
        self.options.use_optional()
    }

    #[must_use]
    pub fn has_guava_dep(&self) -> bool {
        self.options.has_guava_dep()
    }

    #[must_use]
    pub fn nullable_value_type(&self) -> NullableValueType {
        self.options.nullable_value_type()
    }

    #[must_use]
    pub fn options(&self) -> &'a GenerationOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_share_options_and_keep_input_order() {
        let options: GenerationOptions = GenerationOptions::builder("/build/gen")
            .type_mapping("Date", "CustomDate")
            .build()
            .expect("options should be valid");
        let inputs: Vec<SourceInput> = vec![
            SourceInput::out_of_date("schema/a.graphql"),
            SourceInput::out_of_date("schema/b.graphql"),
        ];

        let requests: Vec<GenerationRequest<'_>> =
            GenerationRequest::for_inputs(&inputs, &options).collect();

        let actual: Vec<&Path> = requests.iter().map(GenerationRequest::input_file).collect();
        let expected: Vec<&Path> = vec![
            Path::new("schema/a.graphql"),
            Path::new("schema/b.graphql"),
        ];
        assert_eq!(expected, actual);
        for request in &requests {
            assert!(std::ptr::eq(&options, request.options()));
            assert_eq!(Path::new("/build/gen"), request.output_dir());
            assert_eq!(
                Some(&"CustomDate".to_string()),
                request.type_mapping().get("Date")
            );
        }
    }

    #[test]
    fn nullable_value_type_names() {
        assert_eq!("annotated", NullableValueType::Annotated.to_string());
        assert_eq!(
            "builtin-optional",
            NullableValueType::BuiltinOptional.to_string()
        );
        assert_eq!("guava-optional", NullableValueType::GuavaOptional.to_string());
    }
}
