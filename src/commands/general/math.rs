use tracing::debug;

use crate::utils::text::{DEFAULT_MAX_LENGTH, truncate};
use crate::utils::wolfram::MathOutcome;
use crate::{CommandResult, Context};

const NO_ANSWER: &str = "Sorry, I couldn't find an answer.";

/// Answers math queries. Uses the Wolfram|Alpha API.
#[poise::command(
    prefix_command,
    slash_command,
    aliases("wa", "wolfram", "mq"),
    category = "Utility"
)]
pub async fn math(
    ctx: Context<'_>,
    #[description = "What to calculate"]
    #[rest]
    query: String,
) -> CommandResult {
    ctx.defer_or_broadcast().await?;

    let outcome = ctx.data().wolfram.solve(&query).await;
    if let Some(answer) = &outcome {
        debug!("Answered '{}' from {:?}", query, answer.tier);
    }

    ctx.say(math_reply(outcome)).await?;
    Ok(())
}

fn math_reply(outcome: MathOutcome) -> String {
    match outcome {
        Some(answer) => truncate(&answer.text, DEFAULT_MAX_LENGTH),
        None => NO_ANSWER.to_string(),
    }
}
