//! Argument specs and verification outcomes

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use super::event::MessageEvent;

/// A converted argument value
pub type Value = Box<dyn Any + Send + Sync>;

/// Produces the value of an argument that was left out
pub type DefaultProvider = Arc<dyn Fn(&dyn MessageEvent) -> Value + Send + Sync>;

/// Result of verifying a single token
pub enum Verification {
    /// Token accepted, continue with the next argument
    Valid(Value),
    /// Token accepted, stop processing further arguments
    ValidEndNow(Value),
    /// Token rejected, with an optional reason
    Invalid(Option<String>),
}

impl Verification {
    /// Accept `value`
    pub fn valid<T: Any + Send + Sync>(value: T) -> Self {
        Self::Valid(Box::new(value))
    }

    /// Accept `value` and end argument processing
    pub fn end_now<T: Any + Send + Sync>(value: T) -> Self {
        Self::ValidEndNow(Box::new(value))
    }

    /// Reject the token with a reason
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(Some(reason.into()))
    }

    /// Returns true unless the token was rejected
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }
}

impl fmt::Debug for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(_) => f.write_str("Valid(..)"),
            Self::ValidEndNow(_) => f.write_str("ValidEndNow(..)"),
            Self::Invalid(reason) => f.debug_tuple("Invalid").field(reason).finish(),
        }
    }
}

/// Converts a raw token into a typed value
pub trait Verifier: Send + Sync {
    /// Verify `token` in the context of `event`
    fn verify(&self, event: &dyn MessageEvent, token: &str) -> Verification;
}

impl<F> Verifier for F
where
    F: Fn(&dyn MessageEvent, &str) -> Verification + Send + Sync,
{
    fn verify(&self, event: &dyn MessageEvent, token: &str) -> Verification {
        self(event, token)
    }
}

bitflags! {
    /// Tokenizer behaviour of an argument
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ArgumentFlags: u8 {
        /// Consumes the whole remaining message
        const ENDLESS = 0x01;
        /// An empty token is passed to the verifier instead of failing the match
        const ACCEPT_EMPTY = 0x02;
        /// `"quoted text"` is read as a single token
        const ACCEPT_QUOTE = 0x04;
        /// Holds several values; `[a b c]` is read as a single token
        const MULTIPLE = 0x08;
    }
}

/// A typed argument slot of a command
#[derive(Clone)]
pub struct Argument {
    name: String,
    flags: ArgumentFlags,
    /// Maximum values of a multi-value argument, `None` for unbounded
    max_values: Option<usize>,
    verifier: Arc<dyn Verifier>,
    /// Error text that overrides the verifier's reason
    error: Option<String>,
    default: Option<DefaultProvider>,
}

impl Argument {
    /// Create an argument that accepts quoted tokens
    pub fn new<V>(name: impl Into<String>, verifier: V) -> Self
    where
        V: Verifier + 'static,
    {
        Self {
            name: name.into(),
            flags: ArgumentFlags::ACCEPT_QUOTE,
            max_values: None,
            verifier: Arc::new(verifier),
            error: None,
            default: None,
        }
    }

    /// Create an argument from a verifying closure
    pub fn from_fn<F>(name: impl Into<String>, verify: F) -> Self
    where
        F: Fn(&dyn MessageEvent, &str) -> Verification + Send + Sync + 'static,
    {
        Self::new(name, verify)
    }

    /// Consume the remaining message as one token
    pub fn endless(mut self) -> Self {
        self.flags.insert(ArgumentFlags::ENDLESS);
        self
    }

    /// Accept several values, at most `max` when given
    pub fn multiple(mut self, max: Option<usize>) -> Self {
        self.flags.insert(ArgumentFlags::MULTIPLE);
        self.max_values = max;
        self
    }

    /// Allow an empty token to reach the verifier
    pub fn accept_empty(mut self, accept: bool) -> Self {
        self.flags.set(ArgumentFlags::ACCEPT_EMPTY, accept);
        self
    }

    /// Allow `"quoted"` tokens
    pub fn accept_quote(mut self, accept: bool) -> Self {
        self.flags.set(ArgumentFlags::ACCEPT_QUOTE, accept);
        self
    }

    /// Error text reported instead of the verifier's reason
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Value used when the argument is left out of the message
    pub fn default_value<F>(mut self, provider: F) -> Self
    where
        F: Fn(&dyn MessageEvent) -> Value + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(provider));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> ArgumentFlags {
        self.flags
    }

    pub fn is_endless(&self) -> bool {
        self.flags.contains(ArgumentFlags::ENDLESS)
    }

    pub fn is_multiple(&self) -> bool {
        self.flags.contains(ArgumentFlags::MULTIPLE)
    }

    pub fn accepts_empty(&self) -> bool {
        self.flags.contains(ArgumentFlags::ACCEPT_EMPTY)
    }

    pub fn accepts_quote(&self) -> bool {
        self.flags.contains(ArgumentFlags::ACCEPT_QUOTE)
    }

    /// Maximum number of values, `None` when unbounded or single-valued
    pub fn max_values(&self) -> Option<usize> {
        self.max_values
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Build the default value for `event`
    pub fn default_for(&self, event: &dyn MessageEvent) -> Option<Value> {
        self.default.as_ref().map(|provider| provider(event))
    }

    /// Run the verifier on `token`
    pub fn verify(&self, event: &dyn MessageEvent, token: &str) -> Verification {
        self.verifier.verify(event, token)
    }

    /// Reason reported for a rejected token
    pub fn error_reason<'a>(&'a self, verified: Option<&'a str>) -> &'a str {
        self.error
            .as_deref()
            .or(verified)
            .unwrap_or("is invalid")
    }

    /// Usage text: `<name>` with `*` when required, wrapped in `[]` when
    /// the argument holds several values
    pub fn usage(&self) -> String {
        let mut usage = format!("<{}>", self.name);
        if self.is_multiple() {
            usage = format!("[{}]", usage);
        }
        if !self.accepts_empty() && !self.has_default() {
            usage.push('*');
        }
        usage
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("max_values", &self.max_values)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_text(_: &dyn MessageEvent, token: &str) -> Verification {
        Verification::valid(token.to_string())
    }

    #[test]
    fn test_argument_flags() {
        let arg = Argument::new("text", any_text);
        assert!(arg.accepts_quote());
        assert!(!arg.is_endless());
        assert!(!arg.accepts_empty());

        let arg = Argument::new("rest", any_text)
            .endless()
            .accept_empty(true)
            .accept_quote(false);
        assert!(arg.is_endless());
        assert!(arg.accepts_empty());
        assert!(!arg.accepts_quote());

        let arg = Argument::new("words", any_text).multiple(Some(3));
        assert!(arg.is_multiple());
        assert_eq!(arg.max_values(), Some(3));
    }

    #[test]
    fn test_usage() {
        assert_eq!(Argument::new("user", any_text).usage(), "<user>*");
        assert_eq!(
            Argument::new("role", any_text).accept_empty(true).usage(),
            "<role>"
        );
        assert_eq!(
            Argument::new("words", any_text).multiple(None).usage(),
            "[<words>]*"
        );
    }

    #[test]
    fn test_error_reason() {
        let arg = Argument::new("n", any_text);
        assert_eq!(arg.error_reason(None), "is invalid");
        assert_eq!(arg.error_reason(Some("too big")), "too big");

        let arg = arg.error("must be a number");
        assert_eq!(arg.error_reason(Some("too big")), "must be a number");
    }

    #[test]
    fn test_verification_debug() {
        assert_eq!(format!("{:?}", Verification::valid(1u8)), "Valid(..)");
        assert_eq!(
            format!("{:?}", Verification::invalid("nope")),
            "Invalid(Some(\"nope\"))"
        );
        assert!(Verification::end_now(()).is_valid());
        assert!(!Verification::Invalid(None).is_valid());
    }
}
