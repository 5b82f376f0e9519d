//! Heterogeneous event arguments.
//!
//! Events carry an ordered list of values of arbitrary types. Each value keeps
//! the type name it was created with so that guard and action holders can
//! describe mismatches without runtime introspection.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A single event argument together with its type tag.
#[derive(Clone)]
pub struct Argument {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Argument {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Name of the type the argument was created from.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Argument<{}>", self.type_name)
    }
}

/// Ordered list of arguments passed along with an event.
///
/// Cloning is cheap: values are reference counted.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::EventArgs;
///
/// let args = EventArgs::none().with(42u32).with(String::from("payload"));
///
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.get::<u32>(0), Some(&42));
/// assert_eq!(args.get::<String>(1).map(String::as_str), Some("payload"));
/// assert_eq!(args.get::<u32>(1), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct EventArgs {
    values: Vec<Argument>,
}

impl EventArgs {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn one<T: Any + Send + Sync>(value: T) -> Self {
        Self::none().with(value)
    }

    /// Append a value, returning the extended list.
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.push(Argument::new(value));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed access to the argument at `index`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index).and_then(Argument::downcast_ref)
    }

    pub fn argument(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.values.iter()
    }

    /// Comma separated type tags, used in diagnostics.
    pub fn describe(&self) -> String {
        self.values
            .iter()
            .map(Argument::type_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<Vec<Argument>> for EventArgs {
    fn from(values: Vec<Argument>) -> Self {
        Self { values }
    }
}

impl FromIterator<Argument> for EventArgs {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Raised when the arguments of an event do not fit a guard or action.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ArgumentError {
    #[error("{callable} ({signature}) expects {expected} argument(s) but the event carried {actual} [{arguments}]")]
    ArityMismatch {
        callable: String,
        signature: String,
        expected: usize,
        actual: usize,
        arguments: String,
    },

    #[error("argument {position} of type `{argument}` cannot be passed to {callable} ({signature})")]
    TypeMismatch {
        callable: String,
        signature: String,
        position: usize,
        argument: String,
    },
}
