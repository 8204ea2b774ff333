use sked_rrule::{RecurringRule, generate, normalize};

include!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../sked-rrule/tests/rule_cases_data/mod.rs"
));

/// ## Summary
/// Integration-level validation for occurrence generation using shared cases.
#[test_log::test]
fn rule_cases_integration() {
    for case in rule_cases() {
        assert_case(&case);
    }
}
