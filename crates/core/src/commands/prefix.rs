//! Prefix resolution
//!
//! A message is only considered a command when it starts with a prefix.
//! Besides the configured prefixes, mentioning the bot (`<@id> ` or
//! `<@!id> `) always works as a prefix and cannot be disabled.

use std::sync::Arc;

use super::event::{mention_prefixes, MessageEvent};

/// Default command prefix
pub const DEFAULT_PREFIX: &str = "!";

/// Prefixes to use for a message, e.g. per guild
///
/// Returning `None` falls back to the dispatcher's default prefixes.
pub type PrefixHook = Arc<dyn Fn(&dyn MessageEvent) -> Option<Vec<String>> + Send + Sync>;

/// Prefix a message started with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPrefix {
    /// The bot was mentioned, trailing space included
    Mention(String),
    /// One of the configured prefixes
    Configured(String),
}

impl ResolvedPrefix {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mention(prefix) | Self::Configured(prefix) => prefix,
        }
    }

    pub fn is_mention(&self) -> bool {
        matches!(self, Self::Mention(_))
    }

    pub fn into_string(self) -> String {
        match self {
            Self::Mention(prefix) | Self::Configured(prefix) => prefix,
        }
    }
}

/// Sort prefixes longest first
///
/// With both `hello` and `hello there` configured, `hello there ping` must
/// resolve to `hello there` and not to `hello` with command `there`.
pub fn sort_longest_first(prefixes: &mut [String]) {
    prefixes.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
}

/// Find the prefix `content` starts with
///
/// `prefixes` must already be sorted longest first.
pub fn resolve(content: &str, self_id: u64, prefixes: &[String]) -> Option<ResolvedPrefix> {
    if let Some(mention) = mention_prefixes(self_id)
        .into_iter()
        .find(|mention| content.starts_with(mention.as_str()))
    {
        return Some(ResolvedPrefix::Mention(mention));
    }

    prefixes
        .iter()
        .find(|prefix| content.starts_with(prefix.as_str()))
        .cloned()
        .map(ResolvedPrefix::Configured)
}

/// Returns true for the built-in "which prefixes do you use" query
pub fn is_prefix_query(text: &str) -> bool {
    text == "prefix" || text == "prefixes"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes(list: &[&str]) -> Vec<String> {
        let mut prefixes: Vec<String> = list.iter().map(|p| p.to_string()).collect();
        sort_longest_first(&mut prefixes);
        prefixes
    }

    #[test]
    fn test_sort_longest_first() {
        assert_eq!(
            prefixes(&["!", "hello", "hello there", "?"]),
            vec!["hello there", "hello", "!", "?"]
        );
    }

    #[test]
    fn test_resolve_configured() {
        let list = prefixes(&["hello", "hello there", "!"]);
        assert_eq!(
            resolve("hello there ping", 1, &list),
            Some(ResolvedPrefix::Configured("hello there".into()))
        );
        assert_eq!(
            resolve("!ping", 1, &list),
            Some(ResolvedPrefix::Configured("!".into()))
        );
        assert_eq!(resolve("ping", 1, &list), None);
        assert_eq!(resolve("", 1, &list), None);
    }

    #[test]
    fn test_resolve_mention() {
        let list = prefixes(&["!"]);
        assert_eq!(
            resolve("<@42> ping", 42, &list),
            Some(ResolvedPrefix::Mention("<@42> ".into()))
        );
        assert_eq!(
            resolve("<@!42> ping", 42, &list),
            Some(ResolvedPrefix::Mention("<@!42> ".into()))
        );
        // Someone else's mention, or no space after it
        assert_eq!(resolve("<@43> ping", 42, &list), None);
        assert_eq!(resolve("<@42>ping", 42, &list), None);
    }

    #[test]
    fn test_mention_works_without_configured_prefixes() {
        let resolved = resolve("<@42> ping", 42, &[]).unwrap();
        assert!(resolved.is_mention());
        assert_eq!(resolved.as_str(), "<@42> ");
    }

    #[test]
    fn test_prefix_query() {
        assert!(is_prefix_query("prefix"));
        assert!(is_prefix_query("prefixes"));
        assert!(!is_prefix_query("prefix list"));
        assert!(!is_prefix_query("Prefix"));
    }
}
