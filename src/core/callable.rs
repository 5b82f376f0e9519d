//! Pieces shared by guard and action holders: signature tags, descriptor
//! names and the argument checks performed at call time.

use super::args::{Argument, ArgumentError, EventArgs};
use std::any::{type_name, Any};
use std::fmt;

/// Statically declared shape of a user callable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signature {
    /// Takes nothing; event arguments are ignored.
    NoArgument,
    /// Takes exactly one argument of the named type.
    Typed(&'static str),
    /// Receives the complete argument list.
    PassThrough,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoArgument => write!(f, "fn()"),
            Self::Typed(name) => write!(f, "fn(&{name})"),
            Self::PassThrough => write!(f, "fn(&EventArgs)"),
        }
    }
}

/// Default descriptor for a callable: the last path segment of its type name.
///
/// Function items keep their name (`module::check_limit` becomes
/// `check_limit`); closures have no usable name and become `anonymous`.
pub(crate) fn default_name<F>() -> String {
    let full = type_name::<F>();
    match full.rsplit("::").next() {
        Some(last) if !last.contains('{') && !last.is_empty() => last.to_string(),
        _ => "anonymous".to_string(),
    }
}

/// Fetch the single typed argument a `Signature::Typed` callable expects.
pub(crate) fn single_argument<'a, T: Any>(
    name: &str,
    signature: &Signature,
    args: &'a EventArgs,
) -> Result<&'a T, ArgumentError> {
    if args.len() != 1 {
        return Err(ArgumentError::ArityMismatch {
            callable: name.to_string(),
            signature: signature.to_string(),
            expected: 1,
            actual: args.len(),
            arguments: args.describe(),
        });
    }

    args.argument(0)
        .and_then(Argument::downcast_ref::<T>)
        .ok_or_else(|| ArgumentError::TypeMismatch {
            callable: name.to_string(),
            signature: signature.to_string(),
            position: 0,
            argument: args
                .argument(0)
                .map(|a| a.type_name().to_string())
                .unwrap_or_default(),
        })
}

/// Return values accepted from guard callables.
pub trait GuardOutcome {
    fn into_outcome(self) -> anyhow::Result<bool>;
}

impl GuardOutcome for bool {
    fn into_outcome(self) -> anyhow::Result<bool> {
        Ok(self)
    }
}

impl<Er> GuardOutcome for Result<bool, Er>
where
    Er: Into<anyhow::Error>,
{
    fn into_outcome(self) -> anyhow::Result<bool> {
        self.map_err(Into::into)
    }
}

/// Return values accepted from action callables.
pub trait ActionOutcome {
    fn into_outcome(self) -> anyhow::Result<()>;
}

impl ActionOutcome for () {
    fn into_outcome(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<Er> ActionOutcome for Result<(), Er>
where
    Er: Into<anyhow::Error>,
{
    fn into_outcome(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}
