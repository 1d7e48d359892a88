//! Common argument verifiers
//!
//! Platform specific types (members, roles, channels) are verified by the
//! platform integration; these cover the plain values most bots need.

use super::argument::{Verification, Verifier};
use super::event::MessageEvent;

/// Any token, as a `String`
pub fn text() -> impl Verifier {
    |_: &dyn MessageEvent, token: &str| Verification::valid(token.to_string())
}

/// A signed integer, as an `i64`
pub fn integer() -> impl Verifier {
    |_: &dyn MessageEvent, token: &str| match token.parse::<i64>() {
        Ok(n) => Verification::valid(n),
        Err(_) => Verification::invalid("is not a number"),
    }
}

/// An integer within `min..=max`, as an `i64`
pub fn integer_range(min: i64, max: i64) -> impl Verifier {
    move |_: &dyn MessageEvent, token: &str| match token.parse::<i64>() {
        Ok(n) if (min..=max).contains(&n) => Verification::valid(n),
        Ok(_) => Verification::invalid(format!("must be between {} and {}", min, max)),
        Err(_) => Verification::invalid("is not a number"),
    }
}

/// `true`/`false`, `yes`/`no`, `on`/`off`, as a `bool`
pub fn boolean() -> impl Verifier {
    |_: &dyn MessageEvent, token: &str| match token.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Verification::valid(true),
        "false" | "no" | "off" | "0" => Verification::valid(false),
        _ => Verification::invalid("is not true or false"),
    }
}

/// A user mention (`<@id>`, `<@!id>`) or bare id, as a `u64`
pub fn user_mention() -> impl Verifier {
    |_: &dyn MessageEvent, token: &str| match parse_user_mention(token) {
        Some(id) => Verification::valid(id),
        None => Verification::invalid("is not a user"),
    }
}

/// Whitespace separated words, as a `Vec<String>`
///
/// Rejects the token when it holds more than `max` words.
pub fn words(max: Option<usize>) -> impl Verifier {
    move |_: &dyn MessageEvent, token: &str| {
        let words: Vec<String> = token.split_whitespace().map(str::to_string).collect();
        match max {
            Some(max) if words.len() > max => {
                Verification::invalid(format!("takes at most {} values", max))
            }
            _ => Verification::valid(words),
        }
    }
}

/// Extract the id from `<@id>`, `<@!id>` or `id`
pub fn parse_user_mention(token: &str) -> Option<u64> {
    let id = token
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|inner| inner.strip_prefix('!').unwrap_or(inner))
        .unwrap_or(token);
    id.parse().ok()
}
