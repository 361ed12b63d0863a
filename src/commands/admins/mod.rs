//! Moderation commands. Each one is a thin wrapper over a Discord endpoint
//! with the same preconditions: nobody moderates themselves or the bot, and
//! only members who outrank their target (or own the guild) may act.

pub(crate) mod ban;
pub(crate) mod kick;
pub(crate) mod purge;
pub(crate) mod remove_timeout;
pub(crate) mod timeout;

use ::serenity::http::HttpError;
use poise::serenity_prelude as serenity;
use serenity::{Member, PartialGuild, Timestamp, UserId};

use crate::{Context, Error};

/// Reason recorded when the moderator gives none.
const DEFAULT_REASON: &str = "No reason provided";

/// The actions that share the target preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModAction {
    Ban,
    Kick,
    Timeout,
}

impl ModAction {
    fn verb(self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Kick => "kick",
            Self::Timeout => "timeout",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Ban => "Banned",
            Self::Kick => "Kicked",
            Self::Timeout => "Timed out",
        }
    }
}

/// Why a moderation target was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRefusal {
    /// The moderator picked themselves.
    SelfTarget,
    /// The moderator picked the bot.
    BotTarget,
    /// The target's highest role is at or above the moderator's.
    Outranked,
}

impl TargetRefusal {
    pub fn message(self, action: ModAction) -> String {
        match (self, action) {
            (Self::SelfTarget, ModAction::Ban) => "You can't ban yourself, silly!".to_string(),
            (Self::SelfTarget, ModAction::Kick) => "You can't kick yourself!".to_string(),
            (Self::SelfTarget, ModAction::Timeout) => "Can't timeout yourself!".to_string(),
            (Self::BotTarget, ModAction::Ban) => "I'm not banning myself!".to_string(),
            (Self::BotTarget, ModAction::Kick) => "Can't kick me!".to_string(),
            (Self::BotTarget, ModAction::Timeout) => {
                "Nice try, but no timing out the bot!".to_string()
            }
            (Self::Outranked, action) => format!(
                "You can't {} someone with a role higher than or equal to yours.",
                action.verb()
            ),
        }
    }
}

/// Rank facts about one member, as far as moderation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub user_id: UserId,
    /// Position of the member's highest role, 0 when they have none.
    pub top_role: u16,
}

/// Checks the preconditions shared by ban, kick and timeout.
pub fn check_target(
    moderator: Standing,
    target: Standing,
    bot_id: UserId,
    owner_id: UserId,
) -> Result<(), TargetRefusal> {
    if target.user_id == moderator.user_id {
        return Err(TargetRefusal::SelfTarget);
    }
    if target.user_id == bot_id {
        return Err(TargetRefusal::BotTarget);
    }
    if moderator.user_id != owner_id && moderator.top_role <= target.top_role {
        return Err(TargetRefusal::Outranked);
    }
    Ok(())
}

fn standing(guild: &PartialGuild, member: &Member) -> Standing {
    let top_role = member
        .roles
        .iter()
        .filter_map(|role_id| guild.roles.get(role_id))
        .map(|role| role.position)
        .max()
        .unwrap_or(0);

    Standing {
        user_id: member.user.id,
        top_role,
    }
}

/// Looks up the guild and the invoking member, then applies [`check_target`].
async fn vet_target(ctx: Context<'_>, target: &Member) -> Result<Result<(), TargetRefusal>, Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("Moderation commands only work inside a server")?;
    let guild = guild_id.to_partial_guild(ctx).await?;
    let moderator = guild_id.member(ctx, ctx.author().id).await?;

    Ok(check_target(
        standing(&guild, &moderator),
        standing(&guild, target),
        ctx.framework().bot_id,
        guild.owner_id,
    ))
}

/// Audit-log entry for an action, e.g. `Banned by anna: spam`.
pub fn audit_reason(action: ModAction, moderator: &str, reason: &str) -> String {
    format!("{} by {moderator}: {reason}", action.past_tense())
}

/// Whether Discord refused the call for lack of permissions.
fn is_forbidden(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 403
    )
}

/// Whether a communication timeout ending at `until` is still running at `now`.
pub fn timeout_active(until: Option<Timestamp>, now: Timestamp) -> bool {
    until.is_some_and(|until| until.unix_timestamp() > now.unix_timestamp())
}
