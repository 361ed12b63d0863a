use std::time::Duration;

use poise::serenity_prelude::{GetMessages, MessageId, Timestamp};
use tracing::{error, info};

use super::*;
use crate::{CommandResult, Context};

/// Discord's bulk-delete ceiling.
const MAX_PURGE: i64 = 100;

/// How long the confirmation stays up.
const CONFIRMATION_TTL: Duration = Duration::from_secs(5);

/// Oldest message age, in seconds, sent to bulk delete. A minute short of
/// Discord's 14-day cut-off so a message cannot age out mid-request.
const BULK_DELETE_MAX_AGE: i64 = 14 * 24 * 60 * 60 - 60;

/// Deletes recent messages in this channel.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES",
    required_bot_permissions = "MANAGE_MESSAGES",
    category = "Moderation"
)]
pub async fn purge(
    ctx: Context<'_>,
    #[description = "How many messages to delete (1-100)"] amount: i64,
) -> CommandResult {
    if !(1..=MAX_PURGE).contains(&amount) {
        ctx.say("Please provide a number between 1 and 100.").await?;
        return Ok(());
    }

    // Prefix invocations also clear the command message itself.
    let invocation = match ctx {
        poise::Context::Prefix(prefix) => Some(prefix.msg.id),
        poise::Context::Application(_) => None,
    };

    let reply = match delete_recent(ctx, amount as u8, invocation).await {
        Ok(deleted) => {
            info!(
                "{} purged {} message(s) in {}",
                ctx.author().name,
                deleted,
                ctx.channel_id()
            );
            format!("Poof! Deleted {deleted} message(s).")
        }
        Err(e) if is_forbidden(&e) => {
            "I need the 'Manage Messages' permission to do that!".to_string()
        }
        Err(e) => {
            error!("Failed to purge messages: {}", e);
            "Something went wrong while deleting messages.".to_string()
        }
    };

    let handle = ctx.say(reply).await?;
    tokio::time::sleep(CONFIRMATION_TTL).await;
    handle.delete(ctx).await?;

    Ok(())
}

/// Deletes up to `amount` messages older than `invocation`, then `invocation` itself.
///
/// Returns how many messages were removed, not counting the invocation.
async fn delete_recent(
    ctx: Context<'_>,
    amount: u8,
    invocation: Option<MessageId>,
) -> Result<usize, serenity::Error> {
    let channel = ctx.channel_id();

    let mut query = GetMessages::new().limit(amount);
    if let Some(id) = invocation {
        query = query.before(id);
    }
    let ids: Vec<MessageId> = channel
        .messages(ctx, query)
        .await?
        .iter()
        .map(|message| message.id)
        .collect();

    let (recent, old) = split_bulk_deletable(&ids, Timestamp::now());
    if !recent.is_empty() {
        channel.delete_messages(ctx, &recent).await?;
    }
    // Bulk delete rejects the whole batch if any message is too old.
    for id in old {
        channel.delete_message(ctx, id).await?;
    }
    if let Some(id) = invocation {
        channel.delete_message(ctx, id).await?;
    }

    Ok(ids.len())
}

/// Splits `ids` into those young enough for bulk delete and those that must
/// be deleted one by one, keeping their order.
fn split_bulk_deletable(ids: &[MessageId], now: Timestamp) -> (Vec<MessageId>, Vec<MessageId>) {
    ids.iter().copied().partition(|id| {
        now.unix_timestamp() - id.created_at().unix_timestamp() < BULK_DELETE_MAX_AGE
    })
}
