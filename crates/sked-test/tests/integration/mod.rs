//! Integration tests for the create and update paths.
//!
//! ```sh
//! cargo test -p sked-test --test series_integration
//! ```

mod rule_cases;
mod update;
