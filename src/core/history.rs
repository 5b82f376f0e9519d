//! History policy of composite states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which sub-state a composite state re-enters when it is entered again.
///
/// - `None`: always the initial sub-state.
/// - `Shallow`: the last active direct sub-state, which is then entered by its
///   own initial sub-state chain.
/// - `Deep`: the last active leaf, following remembered sub-states through all
///   nested levels.
///
/// Leaf states ignore their history type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryType {
    #[default]
    None,
    Shallow,
    Deep,
}

impl fmt::Display for HistoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Shallow => "Shallow",
            Self::Deep => "Deep",
        };
        f.write_str(name)
    }
}
