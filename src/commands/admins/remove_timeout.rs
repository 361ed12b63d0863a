use poise::serenity_prelude::{self as serenity, EditMember, Mentionable, Timestamp};
use tracing::{error, info};

use super::*;
use crate::{CommandResult, Context};

/// Removes a timeout from a member.
#[poise::command(
    prefix_command,
    slash_command,
    rename = "removetimeout",
    aliases("rt", "untimeout"),
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    required_bot_permissions = "MODERATE_MEMBERS",
    category = "Moderation"
)]
pub async fn remove_timeout(
    ctx: Context<'_>,
    #[description = "Member whose timeout to lift"] member: serenity::Member,
) -> CommandResult {
    if !timeout_active(member.communication_disabled_until, Timestamp::now()) {
        ctx.say(format!("{} isn't currently timed out.", member.mention()))
            .await?;
        return Ok(());
    }

    let moderator = &ctx.author().name;
    let audit = format!("Timeout removed by {moderator}");
    let edit = EditMember::new()
        .enable_communication()
        .audit_log_reason(&audit);

    let reply = match member.guild_id.edit_member(ctx, member.user.id, edit).await {
        Ok(_) => {
            info!("{} removed timeout from {}.", moderator, member.user.name);
            format!("Okay, {}'s timeout has been removed.", member.mention())
        }
        Err(e) if is_forbidden(&e) => "I don't have the permissions to remove timeouts. Check my 'Moderate Members' permission.".to_string(),
        Err(e) => {
            error!("Failed to remove timeout from {}: {}", member.user.name, e);
            format!(
                "Something went wrong trying to remove the timeout from {}.",
                member.mention()
            )
        }
    };

    ctx.say(reply).await?;
    Ok(())
}
