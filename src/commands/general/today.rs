use chrono::{Local, NaiveDate};

use crate::{CommandResult, Context};

/// Gets the current date and day.
#[poise::command(prefix_command, slash_command, category = "Fun")]
pub async fn today(ctx: Context<'_>) -> CommandResult {
    ctx.say(today_reply(Local::now().date_naive())).await?;
    Ok(())
}

fn today_reply(date: NaiveDate) -> String {
    format!(
        "Today is {}. Hope it's a good one! Maybe time for snacks?",
        date.format("%A, %B %d, %Y")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_reply() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        assert_eq!(
            today_reply(date),
            "Today is Monday, May 05, 2025. Hope it's a good one! Maybe time for snacks?"
        );
    }
}
