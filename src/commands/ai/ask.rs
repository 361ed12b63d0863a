use poise::CreateReply;
use poise::serenity_prelude::{Colour, CreateEmbed, CreateEmbedFooter};
use tracing::{debug, info};

use super::*;
use crate::{CommandResult, Context};

/// Ask Anna anything! Uses Gemini AI.
#[poise::command(
    prefix_command,
    slash_command,
    aliases("write"),
    user_cooldown = 5,
    category = "Fun"
)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "What do you want to ask?"]
    #[rest]
    query: String,
) -> CommandResult {
    debug!("Ask request from {}: {}", ctx.author().name, query);
    ctx.defer_or_broadcast().await?;

    let data = ctx.data();
    let outcome = data.gemini.generate(&query, true).await;
    let mut response = outcome.to_string();

    if let Some(search_query) = fallback_query(&outcome, &query) {
        info!("Gemini declined, searching for '{}' instead", search_query);
        ctx.say("Hmm, I can't directly answer that, but maybe the web can help! Searching...")
            .await?;
        let found = data.search.search(&search_query, DEFAULT_NUM_RESULTS).await;
        response.push_str(&fallback_links(&found));
    }

    let author = ctx.author();
    let display_name = match ctx.author_member().await {
        Some(member) => member.display_name().to_string(),
        None => author.display_name().to_string(),
    };

    let embed = CreateEmbed::new()
        .title("✨ Anna Says...")
        .description(truncate(&format_response(&response), DEFAULT_MAX_LENGTH))
        .color(Colour::new(rand::random::<u32>() & 0xFF_FFFF))
        .footer(CreateEmbedFooter::new(format!("Asked by {display_name}")).icon_url(author.face()));

    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}
