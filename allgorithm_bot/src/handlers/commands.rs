use teloxide::types::BotCommand;

/// What a command does; the message handler maps these to functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Help,
    NewTopic,
    LoadDating,
    DatingPanel,
}

pub struct Command {
    /// Including the `/` and a hint of the parameters, if any.
    pub callname: &'static str,
    /// May contain HTML.
    pub description: &'static str,
    pub kind: CommandKind,
    /// Only for the admin. Not shown in the command list nor in help for
    /// anyone else.
    admin_only: bool,
}

const START: Command = Command {
    callname: "/start",
    description: "Say hi and tell the bot who you are.",
    kind: CommandKind::Start,
    admin_only: false,
};

const HELP: Command = Command {
    callname: "/help",
    description: "Show this help.",
    kind: CommandKind::Help,
    admin_only: false,
};

const NEW_TOPIC: Command = Command {
    callname: "/new_topic",
    description: "During Fast Dates, get a new secret topic for you and your partner.",
    kind: CommandKind::NewTopic,
    admin_only: false,
};

const LOAD_DATING: Command = Command {
    callname: "/load_dating &lt;event id&gt;",
    description: "Seat the paid participants of an event and give them their numbers.",
    kind: CommandKind::LoadDating,
    admin_only: true,
};

const DATING_PANEL: Command = Command {
    callname: "/dating_panel",
    description: "Show the Fast Dates control panel.",
    kind: CommandKind::DatingPanel,
    admin_only: true,
};

pub const COMMANDS: &[Command] = &[START, HELP, NEW_TOPIC, LOAD_DATING, DATING_PANEL];

impl Command {
    pub fn is_matching_callname(&self, command: &str) -> bool {
        self.callname
            .split_ascii_whitespace()
            .next()
            .is_some_and(|x| x.eq_ignore_ascii_case(command))
    }

    /// Find the command by what the user typed, like "/help".
    pub fn find(command: &str) -> Option<&'static Command> {
        COMMANDS.iter().find(|c| c.is_matching_callname(command))
    }

    pub fn is_admin_only(&self) -> bool {
        self.admin_only
    }

    pub fn generate_help(for_admin: bool) -> String {
        let mut response = String::from("<b>HELP:</b>\n\n");
        for command in COMMANDS {
            if command.admin_only && !for_admin {
                continue;
            }
            response += command.callname;
            response += " - ";
            response += command.description;
            response += "\n\n";
        }
        response.truncate(response.trim_end().len());
        response
    }

    /// The list for Telegram's command menu. Admin commands are left out.
    pub fn generate_bot_commands() -> Vec<BotCommand> {
        let mut output = Vec::new();

        for command in COMMANDS {
            if command.admin_only {
                continue;
            }
            let Some(callname) = command.callname.split_ascii_whitespace().next() else {
                continue;
            };

            // Cut off the /
            let callname = callname[1..].trim().to_string();
            let description = command
                .description
                .replace("&lt;", "<")
                .replace("&gt;", ">");

            output.push(BotCommand {
                command: callname,
                description,
            });
        }

        output
    }
}
