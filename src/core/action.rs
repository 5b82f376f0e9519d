//! Action holders for transition actions and entry/exit actions.

use super::args::EventArgs;
use super::callable::{default_name, single_argument, ActionOutcome, Signature};
use std::any::{type_name, Any};
use std::fmt;

type Callback = Box<dyn Fn(&str, &Signature, &EventArgs) -> anyhow::Result<()> + Send + Sync>;

/// Side-effecting callable run during a transition or on entry/exit.
///
/// Entry and exit actions are invoked without arguments, so only
/// [`ActionHolder::new`] actions make sense there.
pub struct ActionHolder {
    name: String,
    signature: Signature,
    callback: Callback,
}

impl ActionHolder {
    pub fn new<F, R>(action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: ActionOutcome,
    {
        Self {
            name: default_name::<F>(),
            signature: Signature::NoArgument,
            callback: Box::new(move |_, _, _| action().into_outcome()),
        }
    }

    pub fn with_argument<T, F, R>(action: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: ActionOutcome,
    {
        Self {
            name: default_name::<F>(),
            signature: Signature::Typed(type_name::<T>()),
            callback: Box::new(move |name, signature, args| {
                let value = single_argument::<T>(name, signature, args)?;
                action(value).into_outcome()
            }),
        }
    }

    pub fn with_arguments<F, R>(action: F) -> Self
    where
        F: Fn(&EventArgs) -> R + Send + Sync + 'static,
        R: ActionOutcome,
    {
        Self {
            name: default_name::<F>(),
            signature: Signature::PassThrough,
            callback: Box::new(move |_, _, args| action(args).into_outcome()),
        }
    }

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

    pub fn execute(&self, args: &EventArgs) -> anyhow::Result<()> {
        (self.callback)(&self.name, &self.signature, args)
    }
}

impl fmt::Debug for ActionHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHolder")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}
