use poise::serenity_prelude::Mentionable;

use crate::{CommandResult, Context};

/// Says hello back!
#[poise::command(prefix_command, slash_command, category = "Fun")]
pub async fn hello(ctx: Context<'_>) -> CommandResult {
    ctx.say(format!("Hello {}!", ctx.author().mention())).await?;
    Ok(())
}
