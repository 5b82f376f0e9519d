//! Identifier bound shared by state ids and event ids.
//!
//! Identifiers are used as map keys and compared for equality; ordering is
//! never needed. Any closed enum deriving the usual traits qualifies.

use std::fmt::Debug;
use std::hash::Hash;

/// Bound for state and event identifiers.
///
/// Blanket implemented for every type that is `Clone + Eq + Hash + Debug`
/// and thread-safe, so user enums need nothing beyond derives.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::Identifier;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum States {
///     Idle,
///     Running,
/// }
///
/// assert_eq!(States::Idle.describe(), "Idle");
/// assert_eq!(States::Running.describe(), "Running");
/// ```
pub trait Identifier: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Text used for this identifier in reports, errors and logs.
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

impl<T> Identifier for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Initial,
        Processing,
        Complete,
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestEvent {
        Go,
        Retry(u8),
    }

    #[test]
    fn describe_uses_debug_representation() {
        assert_eq!(TestState::Initial.describe(), "Initial");
        assert_eq!(TestState::Processing.describe(), "Processing");
        assert_eq!(TestEvent::Retry(3).describe(), "Retry(3)");
    }

    #[test]
    fn identifiers_work_as_map_keys() {
        let mut map = HashMap::new();
        map.insert(TestState::Complete, 1);
        map.insert(TestState::Initial, 2);

        assert_eq!(map.get(&TestState::Complete), Some(&1));
        assert_eq!(map.get(&TestState::Processing), None);
    }

    #[test]
    fn primitive_types_are_identifiers() {
        fn assert_identifier<T: Identifier>(value: T) -> String {
            value.describe()
        }

        assert_eq!(assert_identifier(7u32), "7");
        assert_eq!(assert_identifier("open"), "\"open\"");
        assert_eq!(assert_identifier(TestEvent::Go), "Go");
    }
}
