//! This module aggregates all the command modules for the bot.

/// Commands moderators use to keep a server tidy (ban, kick, timeout, purge).
#[cfg(feature = "moderation")]
pub(crate) mod admins;
/// Commands backed by Gemini and Google Custom Search.
pub(crate) mod ai;
/// Small everyday commands and maths.
pub(crate) mod general;

use crate::{Data, Error};

/// Every command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    let mut commands = vec![
        general::help::help(),
        general::help::register(),
        general::hello::hello(),
        general::add::add(),
        general::today::today(),
        ai::ask::ask(),
        ai::search::search(),
    ];

    #[cfg(feature = "wolfram")]
    commands.push(general::math::math());

    #[cfg(feature = "moderation")]
    commands.extend(vec![
        admins::ban::ban(),
        admins::kick::kick(),
        admins::timeout::timeout(),
        admins::remove_timeout::remove_timeout(),
        admins::purge::purge(),
    ]);

    commands
}
