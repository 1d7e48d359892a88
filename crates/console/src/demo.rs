//! Demonstration commands

use std::thread;
use std::time::Duration;

use chatroute_core::{verifiers, Argument, CommandBuilder, CommandRegistry, RegistryError};
use rand::Rng;

/// Build the registry of demo commands
pub fn registry() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new();

    registry.register(
        CommandBuilder::new("ping")
            .description("Check that the bot is alive")
            .handler(|ctx| {
                ctx.reply("Pong!");
                Ok(())
            }),
    )?;

    registry.register(
        CommandBuilder::new("avatar")
            .alias("av")
            .description("Show the avatar of a user, yourself by default")
            .argument(
                Argument::new("user", verifiers::user_mention())
                    .default_value(|event| Box::new(event.author_id())),
            )
            .handler(|ctx| {
                let user = ctx.arg::<u64>(0).copied().unwrap_or_else(|| ctx.author_id());
                ctx.reply_fmt(format_args!("Avatar of <@{}>: https://cdn.example.com/avatars/{}.png", user, user));
                Ok(())
            }),
    )?;

    registry.register(
        CommandBuilder::new("role")
            .alias("r")
            .description("Role commands")
            .passive()
            .child(
                CommandBuilder::new("info")
                    .description("List the roles")
                    .handler(|ctx| {
                        ctx.reply("Roles: everyone, moderators, admins");
                        Ok(())
                    }),
            )
            .child(
                CommandBuilder::new("info")
                    .description("Describe a role")
                    .argument(Argument::new("role", verifiers::text()).endless())
                    .handler(|ctx| {
                        let role = ctx.arg::<String>(0).map(String::as_str).unwrap_or_default();
                        ctx.reply_fmt(format_args!("Role **{}** has no special permissions", role));
                        Ok(())
                    }),
            ),
    )?;

    registry.register(
        CommandBuilder::new("echo")
            .description("Repeat a message")
            .argument(Argument::new("text", verifiers::text()).endless())
            .handler(|ctx| {
                ctx.reply(ctx.arg::<String>(0).map(String::as_str).unwrap_or_default());
                Ok(())
            }),
    )?;

    registry.register(
        CommandBuilder::new("tags")
            .description("Echo a list of tags")
            .argument(Argument::new("tags", verifiers::words(Some(5))).multiple(Some(5)))
            .handler(|ctx| {
                let tags = ctx.arg::<Vec<String>>(0).cloned().unwrap_or_default();
                ctx.reply_fmt(format_args!("Tags: {}", tags.join(", ")));
                Ok(())
            }),
    )?;

    registry.register(
        CommandBuilder::new("roll")
            .description("Roll a die")
            .cooldown(Duration::from_secs(3))
            .argument(
                Argument::new("sides", verifiers::integer_range(2, 100))
                    .default_value(|_| Box::new(6i64)),
            )
            .handler(|ctx| {
                let sides = ctx.arg::<i64>(0).copied().unwrap_or(6);
                ctx.reply_fmt(format_args!("You rolled {} (d{})", roll(sides), sides));
                Ok(())
            }),
    )?;

    registry.register(
        CommandBuilder::new("slow")
            .description("Take a while, without blocking other messages")
            .execute_async()
            .handler(|ctx| {
                thread::sleep(Duration::from_secs(2));
                ctx.reply("Done, that took a while");
                Ok(())
            }),
    )?;

    registry.register(
        CommandBuilder::new("commands")
            .description("Count the registered commands")
            .developer_only()
            .handler(|ctx| {
                ctx.reply_fmt(format_args!("{} commands registered", ctx.registry().len()));
                Ok(())
            }),
    )?;

    tracing::info!("Registered {} demo commands", registry.len());
    Ok(registry)
}

fn roll(sides: i64) -> i64 {
    rand::thread_rng().gen_range(1..=sides.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds() {
        let registry = registry().unwrap();
        assert!(registry.find("ping").is_some());
        assert!(registry.find("r info").is_some());
        assert!(registry.find("av").is_some());
        // role, its two info subcommands, and seven more
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_roll_in_range() {
        for sides in [2, 6, 100] {
            for _ in 0..200 {
                assert!((1..=sides).contains(&roll(sides)));
            }
        }

        // Every face comes up eventually
        let mut seen = [false; 6];
        for _ in 0..1000 {
            seen[(roll(6) - 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
