use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::{error, info};

use super::*;
use crate::{CommandResult, Context};

/// Bans a member from the server.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS",
    required_bot_permissions = "BAN_MEMBERS",
    category = "Moderation"
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "Member to ban"] member: serenity::Member,
    #[description = "Why they are being banned"]
    #[rest]
    reason: Option<String>,
) -> CommandResult {
    if let Err(refusal) = vet_target(ctx, &member).await? {
        ctx.say(refusal.message(ModAction::Ban)).await?;
        return Ok(());
    }

    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());
    let moderator = &ctx.author().name;
    let audit = audit_reason(ModAction::Ban, moderator, &reason);

    let reply = match member.ban_with_reason(ctx, 0, &audit).await {
        Ok(()) => {
            info!("{} banned {}. Reason: {}", moderator, member.user.name, reason);
            format!("Okay, {} has been banned. Reason: {reason}", member.mention())
        }
        Err(e) if is_forbidden(&e) => {
            "I don't have the required permissions to ban this member. Maybe check my role hierarchy?"
                .to_string()
        }
        Err(e) => {
            error!("Failed to ban {}: {}", member.user.name, e);
            format!("Something went wrong trying to ban {}.", member.mention())
        }
    };

    ctx.say(reply).await?;
    Ok(())
}
