//! Tests for the error constants and category ranges of `kws_error`.

use kws_error::{codes, Error, ErrorCategory, ErrorSource};

#[test]
fn test_every_category_has_distinct_code_base() {
    let categories = [
        ErrorCategory::Validation,
        ErrorCategory::Capability,
        ErrorCategory::Sizing,
        ErrorCategory::Platform,
        ErrorCategory::Parse,
        ErrorCategory::Io,
        ErrorCategory::Emission,
    ];

    for (i, a) in categories.iter().enumerate() {
        for b in &categories[i + 1..] {
            assert_ne!(a.code_base(), b.code_base());
        }
    }
}

#[test]
fn test_validation_codes_are_distinct() {
    let rule_codes = [
        codes::KEY_VALUE_PAIRS_BELOW_KEYS,
        codes::WORKSPACE_OVERRIDE_WITH_EXTRA_STACKS,
        codes::STACK_ALLOCATOR_INCOMPLETE,
        codes::WORKSPACE_UNDERFLOW,
        codes::EMPTY_MESSAGE_QUEUE_DECLARATION,
        codes::CAPABILITY_DISABLED,
        codes::SIZE_OVERFLOW,
        codes::INVALID_TARGET_PROFILE,
    ];

    for (i, a) in rule_codes.iter().enumerate() {
        assert!(!rule_codes[i + 1..].contains(a), "duplicate code {a}");
    }
}

#[test]
fn test_factory_methods_pick_category() {
    assert!(Error::validation_error("x").is_validation_error());
    assert!(Error::size_overflow("x").is_sizing_error());
    assert!(Error::platform_error("x").is_platform_error());
    assert_eq!(Error::parse_error("x").category(), ErrorCategory::Parse);
    assert_eq!(Error::io_error("x").code(), codes::IO_ERROR);
    assert_eq!(Error::emission_error("x").code, codes::EMISSION_ERROR);
}

#[test]
fn test_diagnostic_code_rendering() {
    assert_eq!(
        Error::STACK_ALLOCATOR_INCOMPLETE.diagnostic_code().to_string(),
        "KWS1003"
    );
    assert_eq!(Error::SIZE_OVERFLOW.diagnostic_code().to_string(), "KWS3000");
}

#[test]
fn test_integer_conversion_maps_to_sizing() {
    let error: Error = u8::try_from(300u32).unwrap_err().into();
    assert!(error.is_sizing_error());
}
