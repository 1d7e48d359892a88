//! Help and prefix messages

use std::sync::Arc;

use super::event::MessageEvent;
use super::registry::{CommandKey, CommandRegistry};

/// Custom help renderer
///
/// Returning `None` falls back to [`render_default`].
pub type HelpHook = Arc<dyn Fn(&dyn MessageEvent, &HelpRequest<'_>) -> Option<String> + Send + Sync>;

/// Footer explaining the usage notation
pub const HELP_FOOTER: &str = "* means required. [] means multiple arguments of that type.";

/// Input for rendering a help message
pub struct HelpRequest<'a> {
    /// Prefix the message used
    pub prefix: &'a str,
    /// Message text after the prefix
    pub content: &'a str,
    pub registry: &'a CommandRegistry,
    /// Commands the message partially matched
    pub possible: &'a [CommandKey],
}

/// Default help message: one usage line per possible command
pub fn render_default(request: &HelpRequest<'_>) -> String {
    let lines: Vec<String> = request
        .possible
        .iter()
        .filter_map(|key| {
            let command = request.registry.get(*key)?;
            let trigger = request
                .registry
                .trigger_chains(*key)
                .into_iter()
                .next()
                .unwrap_or_else(|| command.trigger().to_string());
            let usage = format!("{} {}", trigger, command.argument_info());
            Some(usage.trim_end().to_string())
        })
        .collect();

    format!("Help\n{}\n{}", lines.join("\n"), HELP_FOOTER)
}

/// Answer to the prefix query, e.g. `My prefixes are **!**, **?**`
pub fn render_prefixes(prefixes: &[String]) -> String {
    let list = prefixes
        .iter()
        .map(|prefix| format!("**{}**", prefix))
        .collect::<Vec<_>>()
        .join(", ");

    if prefixes.len() > 1 {
        format!("My prefixes are {}", list)
    } else {
        format!("My prefix is {}", list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{verifiers, Argument, CommandBuilder};

    #[test]
    fn test_render_prefixes() {
        assert_eq!(render_prefixes(&["!".into()]), "My prefix is **!**");
        assert_eq!(
            render_prefixes(&["!".into(), "?".into()]),
            "My prefixes are **!**, **?**"
        );
    }

    #[test]
    fn test_render_default() {
        let mut registry = CommandRegistry::new();
        let role = registry
            .register(
                CommandBuilder::new("role").passive().child(
                    CommandBuilder::new("info")
                        .argument(Argument::new("role", verifiers::text()))
                        .handler(|_| Ok(())),
                ),
            )
            .unwrap();
        let info = registry.children(role).next().unwrap().0;
        let tag = registry
            .register(
                CommandBuilder::new("tag")
                    .argument(Argument::new("words", verifiers::words(None)).multiple(None))
                    .handler(|_| Ok(())),
            )
            .unwrap();

        let text = render_default(&HelpRequest {
            prefix: "!",
            content: "role info",
            registry: &registry,
            possible: &[info, tag],
        });

        assert_eq!(
            text,
            format!("Help\nrole info <role>*\ntag [<words>]*\n{}", HELP_FOOTER)
        );
    }
}
