use crate::{CommandResult, Context};

/// Adds two whole numbers.
#[poise::command(prefix_command, slash_command, category = "Fun")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "First number"] num1: i64,
    #[description = "Second number"] num2: i64,
) -> CommandResult {
    ctx.say(sum_reply(num1, num2)).await?;
    Ok(())
}

fn sum_reply(num1: i64, num2: i64) -> String {
    match num1.checked_add(num2) {
        Some(result) => format!("Okay, {num1} + {num2} = {result}. Easy peasy!"),
        None => format!("Whoa, {num1} + {num2} is too big even for me!"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(2, 3, "Okay, 2 + 3 = 5. Easy peasy!" ; "small")]
    #[test_case(-7, 4, "Okay, -7 + 4 = -3. Easy peasy!" ; "negative")]
    #[test_case(i64::MAX, 1, "Whoa, 9223372036854775807 + 1 is too big even for me!" ; "overflow")]
    fn test_sum_reply(a: i64, b: i64, expected: &str) {
        assert_eq!(sum_reply(a, b), expected);
    }
}
