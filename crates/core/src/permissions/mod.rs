//! Bot permission checks
//!
//! Commands declare the permissions the bot needs in order to run them. The
//! dispatcher unions those with its globally required set and compares the
//! result against the effective permissions reported by the event source.
//!
//! # Usage
//!
//! ```ignore
//! use chatroute_core::permissions::{missing, Permissions};
//!
//! let required = Permissions::SEND_MESSAGES | Permissions::EMBED_LINKS;
//! let effective = Permissions::SEND_MESSAGES;
//! assert_eq!(missing(required, effective), Permissions::EMBED_LINKS);
//! ```

mod types;

pub use types::Permissions;

/// Permissions in `required` that `effective` does not grant
///
/// `ADMINISTRATOR` grants everything.
pub fn missing(required: Permissions, effective: Permissions) -> Permissions {
    if effective.contains(Permissions::ADMINISTRATOR) {
        return Permissions::empty();
    }
    required.difference(effective)
}

/// Parse a list of permission names into a single set
///
/// Returns the first name that could not be resolved as the error.
pub fn parse_names<S: AsRef<str>>(names: &[S]) -> Result<Permissions, String> {
    names.iter().try_fold(Permissions::empty(), |acc, name| {
        Permissions::parse_name(name.as_ref())
            .map(|p| acc | p)
            .ok_or_else(|| name.as_ref().to_string())
    })
}
