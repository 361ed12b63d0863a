use poise::FrameworkError;
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::{Context, Data, Error};

/// Greeting posted to the announce channel at start-up.
fn greeting(prefix: &str) -> String {
    format!(
        "Heya! Anna reporting for duty! Ask me anything, but remember my knowledge is mostly from early 2023. For super fresh info, use `{prefix}search <your query>`!"
    )
}

/// Logs the bot identity and posts the greeting if a channel is configured.
///
/// Failures are logged and swallowed, start-up carries on either way.
pub async fn on_ready(
    ctx: &serenity::Context,
    ready: &serenity::Ready,
    config: &Config,
) {
    info!("Logged in as {} ({})", ready.user.name, ready.user.id);

    let Some(channel_id) = config.announce_channel else {
        return;
    };

    match serenity::ChannelId::new(channel_id)
        .say(ctx, greeting(&config.prefix))
        .await
    {
        Ok(_) => info!("Sent startup message to channel {}", channel_id),
        Err(serenity::Error::Http(e)) => {
            warn!("Could not send startup message to channel {}: {}", channel_id, e)
        }
        Err(e) => error!("Failed to send startup message: {}", e),
    }
}

/// Reply for any failed precondition that has no wording of its own.
const CHECK_FAILED: &str = "You can't run this command here or lack permissions.";

/// The first required parameter the invocation left out, given the raw prefix `args`.
fn missing_argument<'a, I>(required: I, args: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    required.into_iter().nth(args.split_whitespace().count())
}

fn missing_argument_reply(help: &str, missing: Option<&str>) -> String {
    match missing {
        Some(name) => format!("You forgot something! Missing argument: `{name}`. Try `{help}`."),
        None => format!("You forgot something! Try `{help}`."),
    }
}

async fn reply(ctx: Context<'_>, text: impl Into<String>) {
    if let Err(e) = ctx.say(text).await {
        error!("Failed to send error reply: {}", e);
    }
}

/// Turns framework errors into friendly replies.
pub async fn on_error(error: FrameworkError<'_, Data, Error>) {
    match error {
        FrameworkError::Command { error, ctx, .. } => {
            error!(
                "Unhandled command error in '{}': {}",
                ctx.command().qualified_name,
                error
            );
            reply(ctx, "Something went wrong! I've logged the error.").await;
        }
        FrameworkError::CooldownHit {
            remaining_cooldown,
            ctx,
            ..
        } => {
            reply(
                ctx,
                format!(
                    "Hold your horses! Try again in {:.2} seconds.",
                    remaining_cooldown.as_secs_f64()
                ),
            )
            .await;
        }
        FrameworkError::MissingUserPermissions { ctx, .. } => {
            reply(ctx, "Oops! You don't have the right permissions to do that.").await;
        }
        FrameworkError::MissingBotPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            warn!(
                "Missing bot permissions for '{}': {}",
                ctx.command().qualified_name,
                missing_permissions
            );
            reply(ctx, CHECK_FAILED).await;
        }
        FrameworkError::ArgumentParse {
            error, input, ctx, ..
        } => {
            let help = format!("{}help {}", ctx.prefix(), ctx.command().qualified_name);
            let text = match input {
                Some(input) if error.is::<serenity::MemberParseError>() => {
                    format!("I couldn't find the member '{input}'. Are they in this server?")
                }
                Some(_) => {
                    format!("That doesn't look right. Invalid argument provided. Check `{help}`.")
                }
                None => {
                    let args = match ctx {
                        poise::Context::Prefix(prefix) => prefix.args,
                        poise::Context::Application(_) => "",
                    };
                    let required = ctx
                        .command()
                        .parameters
                        .iter()
                        .filter(|parameter| parameter.required)
                        .map(|parameter| parameter.name.as_str());
                    missing_argument_reply(&help, missing_argument(required, args))
                }
            };
            reply(ctx, text).await;
        }
        FrameworkError::GuildOnly { ctx, .. } => {
            reply(ctx, CHECK_FAILED).await;
        }
        FrameworkError::NotAnOwner { ctx, .. } => {
            reply(ctx, "Only my owner can use that command!").await;
        }
        FrameworkError::CommandCheckFailed { ctx, .. } => {
            reply(ctx, CHECK_FAILED).await;
        }
        FrameworkError::UnknownCommand {
            ctx, msg, prefix, ..
        } => {
            let text = format!("Huh? I don't know that command. Try `{prefix}help`.");
            if let Err(e) = msg.channel_id.say(ctx, text).await {
                error!("Failed to answer unknown command: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}
