/// A chat command understood by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pay,
    PayLink,
    Status,
    Refund,
    RefundById(Option<String>),
    SendStars {
        receiver: Option<String>,
        amount: Option<String>,
    },
    Unknown(String),
}

impl Command {
    /// Parses message text. Returns `None` for anything that is not a
    /// `/command`. A `@botname` suffix on the command is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head);
        let mut arg = || parts.next().map(str::to_string);

        let command = match name {
            "start" => Command::Start,
            "pay" => Command::Pay,
            "paylink" => Command::PayLink,
            "status" => Command::Status,
            "refund" => Command::Refund,
            "refundbyid" => Command::RefundById(arg()),
            "sendstars" => {
                let receiver = arg();
                let amount = arg();
                Command::SendStars { receiver, amount }
            }
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}
