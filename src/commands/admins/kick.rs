use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::{error, info};

use super::*;
use crate::{CommandResult, Context};

/// Kicks a member from the server.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "KICK_MEMBERS",
    category = "Moderation"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] member: serenity::Member,
    #[description = "Why they are being kicked"]
    #[rest]
    reason: Option<String>,
) -> CommandResult {
    if let Err(refusal) = vet_target(ctx, &member).await? {
        ctx.say(refusal.message(ModAction::Kick)).await?;
        return Ok(());
    }

    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());
    let moderator = &ctx.author().name;
    let audit = audit_reason(ModAction::Kick, moderator, &reason);

    let reply = match member.kick_with_reason(ctx, &audit).await {
        Ok(()) => {
            info!("{} kicked {}. Reason: {}", moderator, member.user.name, reason);
            format!("{} has been kicked. Reason: {reason}", member.mention())
        }
        Err(e) if is_forbidden(&e) => {
            "I don't have the permissions to kick this member. Check my roles?".to_string()
        }
        Err(e) => {
            error!("Failed to kick {}: {}", member.user.name, e);
            format!("Something went wrong trying to kick {}.", member.mention())
        }
    };

    ctx.say(reply).await?;
    Ok(())
}
