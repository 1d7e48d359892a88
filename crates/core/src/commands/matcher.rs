//! Matching a message against the candidate commands
//!
//! Candidates are tried in specificity order. A candidate matches when its
//! trigger starts the text on a word boundary, every argument it uses
//! verifies, and no text is left over. The first match wins.

use super::argument::{Value, Verification};
use super::event::MessageEvent;
use super::registry::{CommandKey, CommandRegistry, MatchCandidate};
use super::tokenizer::Tokenizer;

/// A fully matched command
pub struct Match {
    pub key: CommandKey,
    /// Trigger as it appeared in the message
    pub trigger: String,
    /// Verified values, defaults included
    pub arguments: Vec<Value>,
}

/// Outcome of matching one message
pub enum MatchResult {
    Found(Match),
    /// Nothing matched; `possible` holds the commands whose trigger matched
    /// but whose arguments did not, in the order they were tried
    NotFound { possible: Vec<CommandKey> },
}

/// Try `candidates` in order against `text`, the message without its prefix
///
/// `candidates` must already be sorted with
/// [`sort_candidates`](super::specificity::sort_candidates).
pub fn find_match(
    registry: &CommandRegistry,
    candidates: &[MatchCandidate],
    text: &str,
    event: &dyn MessageEvent,
) -> MatchResult {
    let mut possible = Vec::new();

    'candidates: for candidate in candidates {
        let Some(command) = registry.get(candidate.key) else {
            continue;
        };

        let Some((typed, rest)) = strip_trigger(text, &candidate.trigger, command.is_case_sensitive())
        else {
            continue;
        };

        // A trigger never matches the start of a longer word
        let mut tokenizer = Tokenizer::new(rest);
        if !tokenizer.separator() {
            continue;
        }

        let declared = command.arguments();
        let used = &declared[..candidate.arity.min(declared.len())];
        let mut values: Vec<Value> = Vec::with_capacity(declared.len());

        for (index, argument) in used.iter().enumerate() {
            if index > 0 && !tokenizer.separator() {
                continue 'candidates;
            }

            let token = tokenizer.next_token(argument);
            if token.is_empty() && !argument.accepts_empty() {
                record(&mut possible, candidate.key);
                continue 'candidates;
            }

            match argument.verify(event, &token) {
                Verification::Valid(value) => values.push(value),
                Verification::ValidEndNow(value) => {
                    values.push(value);
                    break;
                }
                Verification::Invalid(reason) => {
                    tracing::trace!(
                        "'{}': argument '{}' {}",
                        candidate.trigger,
                        argument.name(),
                        argument.error_reason(reason.as_deref())
                    );
                    record(&mut possible, candidate.key);
                    continue 'candidates;
                }
            }
        }

        if !tokenizer.is_empty() {
            continue;
        }

        // Arguments left out of the message take their defaults
        for argument in &declared[values.len()..] {
            match argument.default_for(event) {
                Some(value) => values.push(value),
                None => break,
            }
        }

        tracing::debug!(
            "Matched '{}' with {} argument(s)",
            candidate.trigger,
            values.len()
        );
        return MatchResult::Found(Match {
            key: candidate.key,
            trigger: typed.to_string(),
            arguments: values,
        });
    }

    MatchResult::NotFound { possible }
}

fn record(possible: &mut Vec<CommandKey>, key: CommandKey) {
    if !possible.contains(&key) {
        possible.push(key);
    }
}

/// Split the trigger off the start of `text`
///
/// Returns the trigger as typed and the text after it.
fn strip_trigger<'a>(text: &'a str, trigger: &str, case_sensitive: bool) -> Option<(&'a str, &'a str)> {
    let mut chars = text.char_indices();
    for expected in trigger.chars() {
        let (_, actual) = chars.next()?;
        let equal = if case_sensitive {
            actual == expected
        } else {
            actual.to_lowercase().eq(expected.to_lowercase())
        };
        if !equal {
            return None;
        }
    }

    let end = chars.next().map_or(text.len(), |(index, _)| index);
    Some(text.split_at(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::specificity::sort_candidates;
    use crate::commands::testing::TestEvent;
    use crate::commands::{verifiers, Argument, CommandBuilder};

    fn noop(trigger: &str) -> CommandBuilder {
        CommandBuilder::new(trigger).handler(|_| Ok(()))
    }

    fn run(registry: &CommandRegistry, text: &str) -> MatchResult {
        let mut candidates = registry.candidates(|_| true);
        sort_candidates(&mut candidates, registry);
        find_match(registry, &candidates, text, &TestEvent::new(text))
    }

    fn found(result: MatchResult) -> Match {
        match result {
            MatchResult::Found(found) => found,
            MatchResult::NotFound { possible } => panic!("no match, {} possible", possible.len()),
        }
    }

    fn possible(result: MatchResult) -> Vec<CommandKey> {
        match result {
            MatchResult::Found(found) => panic!("unexpected match '{}'", found.trigger),
            MatchResult::NotFound { possible } => possible,
        }
    }

    #[test]
    fn test_strip_trigger() {
        assert_eq!(strip_trigger("Ping now", "ping", false), Some(("Ping", " now")));
        assert_eq!(strip_trigger("Ping now", "ping", true), None);
        assert_eq!(strip_trigger("pi", "ping", false), None);
        assert_eq!(strip_trigger("ping", "ping", true), Some(("ping", "")));
        assert_eq!(strip_trigger("ÉCHO x", "écho", false), Some(("ÉCHO", " x")));
    }

    #[test]
    fn test_trigger_needs_word_boundary() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("ping")).unwrap();

        assert_eq!(found(run(&registry, "ping")).trigger, "ping");
        assert_eq!(found(run(&registry, "PING")).trigger, "PING");
        assert!(possible(run(&registry, "pingpong")).is_empty());
        // Left over text
        assert!(possible(run(&registry, "ping extra")).is_empty());
    }

    #[test]
    fn test_case_sensitive_command() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("Exact").case_sensitive()).unwrap();

        assert!(matches!(run(&registry, "Exact"), MatchResult::Found(_)));
        assert!(matches!(run(&registry, "exact"), MatchResult::NotFound { .. }));
    }

    #[test]
    fn test_arguments_are_verified() {
        let mut registry = CommandRegistry::new();
        let add = registry
            .register(
                noop("add")
                    .argument(Argument::new("a", verifiers::integer()))
                    .argument(Argument::new("b", verifiers::integer())),
            )
            .unwrap();

        let matched = found(run(&registry, "add 2 -5"));
        assert_eq!(matched.key, add);
        assert_eq!(matched.arguments.len(), 2);
        assert_eq!(matched.arguments[1].downcast_ref::<i64>(), Some(&-5));

        assert_eq!(possible(run(&registry, "add 2 x")), vec![add]);
        assert_eq!(possible(run(&registry, "add 2")), vec![add]);
        // Two separators leave an empty second token
        assert_eq!(possible(run(&registry, "add 2  3")), vec![add]);
    }

    #[test]
    fn test_tokenizer_modes() {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                noop("tag")
                    .argument(Argument::new("name", verifiers::text()))
                    .argument(Argument::new("kind", verifiers::text()).accept_quote(false))
                    .argument(Argument::new("words", verifiers::words(None)).multiple(None)),
            )
            .unwrap();

        let matched = found(run(&registry, r#"tag "a b" c [d e]"#));
        assert_eq!(matched.arguments[0].downcast_ref::<String>().unwrap(), "a b");
        assert_eq!(matched.arguments[1].downcast_ref::<String>().unwrap(), "c");
        assert_eq!(
            matched.arguments[2].downcast_ref::<Vec<String>>().unwrap(),
            &vec!["d".to_string(), "e".to_string()]
        );
    }

    #[test]
    fn test_endless_argument() {
        let mut registry = CommandRegistry::new();
        let echo = registry
            .register(noop("echo").argument(Argument::new("text", verifiers::text()).endless()))
            .unwrap();

        let matched = found(run(&registry, "echo hello  there "));
        assert_eq!(
            matched.arguments[0].downcast_ref::<String>().unwrap(),
            "hello  there "
        );
        assert_eq!(possible(run(&registry, "echo")), vec![echo]);
    }

    #[test]
    fn test_prefix_trigger_tried_after_longer_one() {
        let mut registry = CommandRegistry::new();
        let role = registry
            .register(
                noop("role")
                    .argument(Argument::new("name", verifiers::text()).endless())
                    .child(noop("info")),
            )
            .unwrap();
        let info = registry.children(role).next().unwrap().0;

        assert_eq!(found(run(&registry, "role info")).key, info);
        assert_eq!(found(run(&registry, "role information")).key, role);
    }

    #[test]
    fn test_zero_argument_command_wins_over_optional_argument() {
        // Intentional ordering: `role info` with no arguments is tried before
        // `role info <role>` whose argument has a default
        let mut registry = CommandRegistry::new();
        let role = registry
            .register(
                CommandBuilder::new("role")
                    .passive()
                    .child(noop("info").argument(
                        Argument::new("role", verifiers::text())
                            .default_value(|_| Box::new("everyone".to_string())),
                    ))
                    .child(noop("info")),
            )
            .unwrap();
        let children: Vec<CommandKey> = registry.children(role).map(|(key, _)| key).collect();
        let (optional, plain) = (children[0], children[1]);

        let matched = found(run(&registry, "role info"));
        assert_eq!(matched.key, plain);
        assert!(matched.arguments.is_empty());

        assert_eq!(found(run(&registry, "role info admins")).key, optional);
    }

    #[test]
    fn test_defaults_fill_left_out_arguments() {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                noop("avatar").argument(
                    Argument::new("user", verifiers::user_mention())
                        .default_value(|event| Box::new(event.author_id())),
                ),
            )
            .unwrap();

        let matched = found(run(&registry, "avatar"));
        assert_eq!(
            matched.arguments[0].downcast_ref::<u64>(),
            Some(&crate::commands::testing::AUTHOR_ID)
        );

        let matched = found(run(&registry, "avatar <@5>"));
        assert_eq!(matched.arguments[0].downcast_ref::<u64>(), Some(&5));
    }

    #[test]
    fn test_invalid_default_form_records_real_command() {
        let mut registry = CommandRegistry::new();
        let roll = registry
            .register(
                noop("roll").argument(
                    Argument::new("sides", verifiers::integer_range(2, 100))
                        .default_value(|_| Box::new(6i64)),
                ),
            )
            .unwrap();

        assert_eq!(possible(run(&registry, "roll 1000")), vec![roll]);
    }

    #[test]
    fn test_valid_end_now_stops_processing() {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                noop("remind")
                    .argument(Argument::from_fn("when", |_, token| {
                        if token == "never" {
                            Verification::end_now(0u32)
                        } else {
                            Verification::valid(1u32)
                        }
                    }))
                    .argument(Argument::new("what", verifiers::text()).endless()),
            )
            .unwrap();

        let matched = found(run(&registry, "remind never"));
        assert_eq!(matched.arguments.len(), 1);

        let matched = found(run(&registry, "remind later tea"));
        assert_eq!(matched.arguments.len(), 2);

        // Text after an early stop is still left over
        assert!(matches!(run(&registry, "remind never tea"), MatchResult::NotFound { .. }));
    }

    #[test]
    fn test_possible_matches_are_deduplicated() {
        let mut registry = CommandRegistry::new();
        let ban = registry
            .register(
                noop("ban")
                    .argument(Argument::new("user", verifiers::user_mention()))
                    .argument(Argument::new("days", verifiers::integer()).default_value(|_| Box::new(0i64))),
            )
            .unwrap();

        // Both the full and the shortened form reject the user
        assert_eq!(possible(run(&registry, "ban someone")), vec![ban]);
    }
}
