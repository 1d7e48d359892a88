//! Argument tokenizer
//!
//! Splits the text after a trigger into one token per argument. How a
//! token is read depends on the argument:
//!
//! - endless arguments take everything that is left
//! - multi-value arguments read `[a b c]` as one token, `\[` and `\]` escaped
//! - quote accepting arguments read `"a b"` as one token, `\"` escaped
//! - otherwise a token runs up to the next separator
//!
//! An unterminated `[` or `"` is not an error; the token is then read the
//! plain way, delimiter included.

use std::borrow::Cow;

use super::argument::Argument;

/// Character between a trigger and its arguments, and between arguments
pub const SEPARATOR: char = ' ';

/// Cursor over the unparsed rest of a message
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer<'a> {
    rest: &'a str,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    /// Text not consumed yet
    pub fn remaining(&self) -> &'a str {
        self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Consume the separator in front of the next argument
    ///
    /// Returns false if text remains but does not start with a separator.
    pub fn separator(&mut self) -> bool {
        if self.rest.is_empty() {
            return true;
        }

        match self.rest.strip_prefix(SEPARATOR) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Read the token for `argument`
    ///
    /// Returns an empty token when nothing is left.
    pub fn next_token(&mut self, argument: &Argument) -> Cow<'a, str> {
        if argument.is_endless() {
            return Cow::Borrowed(std::mem::take(&mut self.rest));
        }

        if self.rest.is_empty() {
            return Cow::Borrowed("");
        }

        let delimited = if argument.is_multiple() {
            scan_delimited(self.rest, '[', ']')
                .map(|(content, rest)| (unescape(content, &['[', ']']), rest))
        } else if argument.accepts_quote() {
            scan_delimited(self.rest, '"', '"').map(|(content, rest)| (unescape(content, &['"']), rest))
        } else {
            None
        };

        if let Some((token, rest)) = delimited {
            self.rest = rest;
            return token;
        }

        let end = self.rest.find(SEPARATOR).unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        Cow::Borrowed(token)
    }
}

/// Split `text` opening with `open` at the first `close` not preceded by `\`
///
/// Returns the enclosed content and the text after `close`.
fn scan_delimited(text: &str, open: char, close: char) -> Option<(&str, &str)> {
    let body = text.strip_prefix(open)?;
    let bytes = body.as_bytes();

    let mut from = 0;
    loop {
        let index = from + body[from..].find(close)?;
        if index > 0 && bytes[index - 1] == b'\\' {
            from = index + close.len_utf8();
            continue;
        }
        return Some((&body[..index], &body[index + close.len_utf8()..]));
    }
}

/// Replace `\x` with `x` for each delimiter `x`
fn unescape<'a>(content: &'a str, delimiters: &[char]) -> Cow<'a, str> {
    if !content.contains('\\') {
        return Cow::Borrowed(content);
    }

    let mut unescaped = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.peek().copied().filter(|n| delimiters.contains(n)) {
                unescaped.push(next);
                chars.next();
                continue;
            }
        }
        unescaped.push(c);
    }
    Cow::Owned(unescaped)
}
