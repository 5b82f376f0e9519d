//! Macros for ergonomic machine construction.

/// Build `EventArgs` from a list of values.
///
/// # Example
///
/// ```
/// use hsm_engine::event_args;
///
/// let args = event_args![42u32, "door"];
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.get::<u32>(0), Some(&42));
/// assert_eq!(args.get::<&str>(1), Some(&"door"));
///
/// assert!(event_args![].is_empty());
/// ```
#[macro_export]
macro_rules! event_args {
    () => {
        $crate::core::EventArgs::none()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::core::EventArgs::none()$(.with($value))+
    };
}
