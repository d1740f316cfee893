use crate::domain::value::ArgValue;

/// A log call's arguments reduced to the fields a notification needs.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// Primary message, rendered from the first argument
    pub message: String,
    /// Remaining arguments, serialized later as the payload array
    pub rest: Vec<ArgValue>,
    /// Stack trace taken from the first error-like argument, if any
    pub error_stack: Option<String>,
}

/// Reduce a log call's argument list.
///
/// The first argument is always the primary message. An error value found
/// anywhere in the list contributes its stack trace; it stays in the payload,
/// where it serializes as its message string. No argument other than the
/// first is removed.
pub fn normalize(args: Vec<ArgValue>) -> NormalizedRecord {
    let error_stack = args.iter().find_map(|arg| match arg {
        ArgValue::Error(err) => Some(err.stack.clone()),
        _ => None,
    });

    let mut iter = args.into_iter();
    let message = iter.next().map(|arg| arg.as_message_text()).unwrap_or_default();
    let rest = iter.collect();

    NormalizedRecord {
        message,
        rest,
        error_stack,
    }
}
