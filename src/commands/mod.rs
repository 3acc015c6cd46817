use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]

pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Subscribe to prayer reminders")]
    Subscribe,
    #[command(description = "Unsubscribe from prayer reminders")]
    Unsubscribe,
    #[command(description = "Show today's prayer times")]
    Times,
    #[command(description = "Toggle congregation (jamaah) mode")]
    Jamaah,
    #[command(description = "Show help message")]
    Help,
}
