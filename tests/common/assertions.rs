//! Domain-specific assertion macros for pagetree harnesses.
//!
//! These wrap `pretty_assertions` and add failure messages that say which
//! query or page was involved, not just which values differed.

// ---------------------------------------------------------------------------
// Suggestion assertions
// ---------------------------------------------------------------------------

/// Assert that a suggestion result renders to exactly the expected strings,
/// in order.
///
/// ```rust
/// assert_suggestions!(search.suggest("female:glasses").await, ["female:glasses"]);
/// ```
#[macro_export]
macro_rules! assert_suggestions {
    ($result:expr, [$($expected:expr),* $(,)?]) => {{
        let expected: Vec<String> = vec![$($expected.to_string()),*];
        match $result {
            Ok(suggestions) => {
                let rendered: Vec<String> =
                    suggestions.iter().map(ToString::to_string).collect();
                pretty_assertions::assert_eq!(
                    rendered, expected,
                    "assert_suggestions! failed: rendered suggestions differ"
                );
            }
            Err(err) => panic!(
                "assert_suggestions! failed: expected {:?}, got error: {}",
                expected, err
            ),
        }
    }};
}

// ---------------------------------------------------------------------------
// Error assertions
// ---------------------------------------------------------------------------

/// Assert that a result is an error matching a pattern.
///
/// ```rust
/// assert_err_matches!(search.suggest("tag").await, SearchError::InvalidQuery(_));
/// ```
#[macro_export]
macro_rules! assert_err_matches {
    ($result:expr, $pattern:pat $(if $guard:expr)?) => {{
        match $result {
            Err($pattern) $(if $guard)? => {}
            Err(other) => panic!(
                "assert_err_matches! failed:\n  expected: {}\n  actual:   {:?}",
                stringify!($pattern),
                other
            ),
            Ok(value) => panic!(
                "assert_err_matches! failed: expected error {}, got Ok({:?})",
                stringify!($pattern),
                value
            ),
        }
    }};
}

// ---------------------------------------------------------------------------
// Page assertions
// ---------------------------------------------------------------------------

/// Assert the structural invariants every decoded page must satisfy: keys
/// strictly ascending, each paired with a locator, key sizes in `1..=32`.
#[macro_export]
macro_rules! assert_well_formed_page {
    ($node:expr) => {{
        let node: &pagetree::TreeNode = &$node;
        assert_eq!(
            node.keys.len(),
            node.locators.len(),
            "assert_well_formed_page! failed: {} keys but {} locators",
            node.keys.len(),
            node.locators.len()
        );
        for pair in node.keys.windows(2) {
            assert!(
                pair[0] < pair[1],
                "assert_well_formed_page! failed: keys not ascending: {:02x?} then {:02x?}",
                pair[0],
                pair[1]
            );
        }
        for key in &node.keys {
            assert!(
                (1..=32).contains(&key.len()),
                "assert_well_formed_page! failed: key size {}",
                key.len()
            );
        }
    }};
}
