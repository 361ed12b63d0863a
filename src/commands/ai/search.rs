use poise::CreateReply;
use poise::serenity_prelude::{Colour, CreateEmbed, CreateEmbedFooter};
use tracing::debug;

use super::*;
use crate::{CommandResult, Context};

/// Searches the web using Google Search.
#[poise::command(
    prefix_command,
    slash_command,
    user_cooldown = 10,
    category = "Utility"
)]
pub async fn search(
    ctx: Context<'_>,
    #[description = "Your search query"]
    #[rest]
    query: String,
) -> CommandResult {
    debug!("Search request from {}: {}", ctx.author().name, query);
    ctx.defer_or_broadcast().await?;

    let data = ctx.data();
    match summarize_search(&data.gemini, &data.search, &query).await {
        SearchSummary::Summary(summary) => {
            let reply = CreateReply::default().embed(summary_embed(&query, summary));
            ctx.send(reply).await?;
        }
        SearchSummary::Unavailable(message) => {
            ctx.say(message).await?;
        }
    }

    Ok(())
}

fn summary_embed(query: &str, summary: String) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("🔎 Google Search Summary for '{}'", query_preview(query)))
        .description(summary)
        .color(Colour::BLUE)
        .field(
            "Search Link",
            format!("[View on Google]({})", google_link(query)),
            false,
        )
        .footer(CreateEmbedFooter::new(
            "Summarized using Gemini based on Google Custom Search results.",
        ))
}
