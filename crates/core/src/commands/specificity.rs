//! Ordering of match candidates, most specific first
//!
//! Candidates are tried in this order and the first full match wins, so a
//! command whose trigger or arguments would swallow input meant for a
//! narrower command must come later:
//!
//! 1. longer trigger first
//! 2. when both take arguments, a command ending in an unbounded
//!    multi-value endless argument goes last
//! 3. more effective arguments first (a bounded multi-value endless
//!    argument counts as its maximum)
//! 4. a fixed last argument before an endless one
//! 5. a command without arguments before one with arguments
//!
//! A form that leaves out defaulted arguments goes after a real command of
//! the same shape.
//!
//! Anything else keeps registration order.

use std::cmp::Ordering;

use super::argument::Argument;
use super::registry::{CommandRegistry, MatchCandidate};

/// Shape of an argument list as seen by the comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Specificity {
    /// Declared count plus `max - 1` for a bounded multi-value endless tail
    pub count: usize,
    /// Tail is a multi-value endless argument without a maximum
    pub unbounded: bool,
    /// Tail is endless
    pub endless: bool,
}

impl Specificity {
    pub fn of(arguments: &[Argument]) -> Self {
        let mut specificity = Self {
            count: arguments.len(),
            unbounded: false,
            endless: false,
        };

        if let Some(last) = arguments.last().filter(|a| a.is_endless()) {
            if last.is_multiple() {
                match last.max_values() {
                    Some(max) => specificity.count += max.saturating_sub(1),
                    None => specificity.unbounded = true,
                }
            }
            specificity.endless = true;
        }

        specificity
    }
}

/// Compare two candidates; `Less` means `a` is tried first
///
/// Candidates whose command is missing from `registry` compare as having
/// no arguments.
pub fn compare(a: &MatchCandidate, b: &MatchCandidate, registry: &CommandRegistry) -> Ordering {
    let by_trigger = b.trigger.chars().count().cmp(&a.trigger.chars().count());
    if by_trigger != Ordering::Equal {
        return by_trigger;
    }

    compare_arguments(used_arguments(a, registry), used_arguments(b, registry))
        .then_with(|| is_synthetic(a, registry).cmp(&is_synthetic(b, registry)))
}

/// Sort candidates most specific first, keeping registration order on ties
pub fn sort_candidates(candidates: &mut [MatchCandidate], registry: &CommandRegistry) {
    candidates.sort_by(|a, b| compare(a, b, registry));
}

fn used_arguments<'r>(candidate: &MatchCandidate, registry: &'r CommandRegistry) -> &'r [Argument] {
    registry
        .get(candidate.key)
        .map(|command| &command.arguments()[..candidate.arity.min(command.arguments().len())])
        .unwrap_or(&[])
}

fn is_synthetic(candidate: &MatchCandidate, registry: &CommandRegistry) -> bool {
    registry
        .get(candidate.key)
        .is_some_and(|command| candidate.is_synthetic(command))
}

fn compare_arguments(a: &[Argument], b: &[Argument]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => {
            let (a, b) = (Specificity::of(a), Specificity::of(b));

            // Bounded before unbounded, then more arguments first, then
            // fixed arity before endless
            a.unbounded
                .cmp(&b.unbounded)
                .then_with(|| b.count.cmp(&a.count))
                .then_with(|| a.endless.cmp(&b.endless))
        }
    }
}
