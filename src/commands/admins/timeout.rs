use std::time::Duration;

use poise::serenity_prelude::{self as serenity, EditMember, Mentionable, Timestamp};
use tracing::{error, info};

use super::*;
use crate::utils::time_span::{TimeSpanError, parse_time_span};
use crate::{CommandResult, Context};

/// Discord refuses communication timeouts longer than this.
const MAX_TIMEOUT: Duration = Duration::from_secs(28 * 24 * 60 * 60);

const INVALID_SPAN: &str =
    "Invalid time format. Use numbers followed by s, m, h, or d (e.g., `10m`, `1h`, `3d`).";

/// Times out a member (e.g. 10s, 5m, 1h, 1d, max 28d).
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    required_bot_permissions = "MODERATE_MEMBERS",
    category = "Moderation"
)]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "Member to time out"] member: serenity::Member,
    #[description = "How long, e.g. 10m, 1h or 3d"] span: String,
    #[description = "Why they are being timed out"]
    #[rest]
    reason: Option<String>,
) -> CommandResult {
    if let Err(refusal) = vet_target(ctx, &member).await? {
        ctx.say(refusal.message(ModAction::Timeout)).await?;
        return Ok(());
    }

    let duration = match validate_timeout(parse_time_span(&span)) {
        Ok(duration) => duration,
        Err(message) => {
            ctx.say(message).await?;
            return Ok(());
        }
    };

    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());
    let moderator = &ctx.author().name;
    let audit = audit_reason(ModAction::Timeout, moderator, &reason);

    // Bounded by MAX_TIMEOUT, so the cast cannot wrap.
    let until = Timestamp::from_unix_timestamp(
        Timestamp::now().unix_timestamp() + duration.as_secs() as i64,
    )?;
    let edit = EditMember::new()
        .disable_communication_until_datetime(until)
        .audit_log_reason(&audit);

    let reply = match member.guild_id.edit_member(ctx, member.user.id, edit).await {
        Ok(_) => {
            info!(
                "{} timed out {} for {}. Reason: {}",
                moderator, member.user.name, span, reason
            );
            format!(
                "{} has been timed out for {span}. Reason: {reason}",
                member.mention()
            )
        }
        Err(e) if is_forbidden(&e) => "I don't have the permissions to timeout this member. Check my 'Moderate Members' permission and role hierarchy.".to_string(),
        Err(e) => {
            error!("Failed to timeout {}: {}", member.user.name, e);
            format!("Something went wrong trying to timeout {}.", member.mention())
        }
    };

    ctx.say(reply).await?;
    Ok(())
}

/// Turns a parsed span into a usable timeout, or the message explaining why not.
fn validate_timeout(span: Result<Duration, TimeSpanError>) -> Result<Duration, &'static str> {
    match span {
        Ok(duration) if duration.is_zero() => Err("Timeout duration must be positive."),
        Ok(duration) if duration > MAX_TIMEOUT => Err("Timeout duration cannot exceed 28 days."),
        Ok(duration) => Ok(duration),
        Err(TimeSpanError::Overflow(_)) => Err("Timeout duration cannot exceed 28 days."),
        Err(TimeSpanError::Malformed(_)) => Err(INVALID_SPAN),
    }
}
