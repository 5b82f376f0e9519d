//! Guard holders: user predicates that decide whether a transition fires.
//!
//! A guard is evaluated against the arguments of the event being fired. The
//! holder validates the arguments against the guard's declared signature
//! before invoking it.

use super::args::EventArgs;
use super::callable::{default_name, single_argument, GuardOutcome, Signature};
use std::any::{type_name, Any};
use std::fmt;

type Predicate = Box<dyn Fn(&str, &Signature, &EventArgs) -> anyhow::Result<bool> + Send + Sync>;

/// Predicate that determines if a transition can fire.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::{EventArgs, GuardHolder};
///
/// let within_limit = GuardHolder::with_argument(|amount: &u32| *amount <= 100)
///     .named("within_limit");
///
/// assert!(within_limit.check(&EventArgs::one(40u32)).unwrap());
/// assert!(!within_limit.check(&EventArgs::one(400u32)).unwrap());
/// assert!(within_limit.check(&EventArgs::one("forty")).is_err());
/// ```
pub struct GuardHolder {
    name: String,
    signature: Signature,
    predicate: Predicate,
}

impl GuardHolder {
    /// Guard that ignores the event arguments.
    pub fn new<F, R>(predicate: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: GuardOutcome,
    {
        Self {
            name: default_name::<F>(),
            signature: Signature::NoArgument,
            predicate: Box::new(move |_, _, _| predicate().into_outcome()),
        }
    }

    /// Guard taking exactly one argument of type `T`.
    pub fn with_argument<T, F, R>(predicate: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: GuardOutcome,
    {
        Self {
            name: default_name::<F>(),
            signature: Signature::Typed(type_name::<T>()),
            predicate: Box::new(move |name, signature, args| {
                let value = single_argument::<T>(name, signature, args)?;
                predicate(value).into_outcome()
            }),
        }
    }

    /// Guard receiving the whole argument list.
    pub fn with_arguments<F, R>(predicate: F) -> Self
    where
        F: Fn(&EventArgs) -> R + Send + Sync + 'static,
        R: GuardOutcome,
    {
        Self {
            name: default_name::<F>(),
            signature: Signature::PassThrough,
            predicate: Box::new(move |_, _, args| predicate(args).into_outcome()),
        }
    }

    /// Replace the descriptor shown in reports and diagnostics.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Evaluate the guard. Argument mismatches and predicate failures are
    /// both returned as errors.
    pub fn check(&self, args: &EventArgs) -> anyhow::Result<bool> {
        (self.predicate)(&self.name, &self.signature, args)
    }
}

impl fmt::Debug for GuardHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardHolder")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}
