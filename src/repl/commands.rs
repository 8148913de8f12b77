use crate::backend::CompanyProfile;

/// All slash commands supported by the REPL.
#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    Find {
        profile: CompanyProfile,
    },
    Companies,
    /// 1-based position in the last company list.
    Select {
        position: usize,
    },
    Generate {
        company: Option<String>,
    },
    To {
        address: Option<String>,
    },
    Cc {
        address: Option<String>,
    },
    Subject {
        text: Option<String>,
    },
    /// Inline body text, or `None` to read lines until a lone ".".
    Body {
        text: Option<String>,
    },
    Show,
    Send,
    Feedback {
        text: String,
    },
    Clear,
    Help {
        command: Option<String>,
    },
    Exit,
}

/// Description of a command for help display.
pub struct CommandHelp {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

pub static COMMAND_HELP: &[CommandHelp] = &[
    CommandHelp {
        name: "find",
        usage: "/find [--industry <v>] [--size <v>] [--sector <v>] [--location <v>] [--vibe <v>] [--details <text>]",
        description: "Search for companies matching a target profile. Values may span several words. Omitted fields use the defaults (Technology, Medium, Software, California, Professional).",
    },
    CommandHelp {
        name: "companies",
        usage: "/companies",
        description: "List the companies from the last search",
    },
    CommandHelp {
        name: "select",
        usage: "/select <n>",
        description: "Target company n from the list; fills the company name and recipient",
    },
    CommandHelp {
        name: "generate",
        usage: "/generate [company name]",
        description: "Generate an outreach email, showing the workflow progress while the backend works",
    },
    CommandHelp {
        name: "to",
        usage: "/to [address]",
        description: "Show or set the recipient address",
    },
    CommandHelp {
        name: "cc",
        usage: "/cc [address]",
        description: "Show or set the CC address",
    },
    CommandHelp {
        name: "subject",
        usage: "/subject [text]",
        description: "Show or set the subject line",
    },
    CommandHelp {
        name: "body",
        usage: "/body [text]",
        description: "Replace the email body. Without text, type lines and finish with a lone '.'",
    },
    CommandHelp {
        name: "show",
        usage: "/show",
        description: "Show the current draft",
    },
    CommandHelp {
        name: "send",
        usage: "/send",
        description: "Send the current draft",
    },
    CommandHelp {
        name: "feedback",
        usage: "/feedback <text>",
        description: "Leave feedback on the generated email",
    },
    CommandHelp {
        name: "clear",
        usage: "/clear",
        description: "Reset the draft (keeps the company list)",
    },
    CommandHelp {
        name: "help",
        usage: "/help [command]",
        description: "Show help for all or a specific command",
    },
    CommandHelp {
        name: "exit",
        usage: "/exit",
        description: "Quit the REPL",
    },
];

/// All command names for tab completion.
pub static COMMAND_NAMES: &[&str] = &[
    "/find",
    "/companies",
    "/select",
    "/generate",
    "/to",
    "/cc",
    "/subject",
    "/body",
    "/show",
    "/send",
    "/feedback",
    "/clear",
    "/help",
    "/exit",
];

/// Flags accepted by /find.
pub static FIND_FLAGS: &[&str] = &[
    "--industry",
    "--size",
    "--sector",
    "--location",
    "--vibe",
    "--details",
];

/// Parse a raw input line into a SlashCommand, or return an error message.
pub fn parse_command(input: &str) -> Result<SlashCommand, String> {
    let input = input.trim();
    if !input.starts_with('/') {
        return Err("Commands must start with /. Type /help for available commands.".into());
    }

    let (cmd, rest) = match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    };
    let rest_opt = if rest.is_empty() { None } else { Some(rest.to_string()) };

    match cmd {
        "/find" => parse_find(rest),
        "/companies" | "/list" => Ok(SlashCommand::Companies),
        "/select" => parse_select(rest),
        "/generate" | "/gen" => Ok(SlashCommand::Generate { company: rest_opt }),
        "/to" => Ok(SlashCommand::To { address: rest_opt }),
        "/cc" => Ok(SlashCommand::Cc { address: rest_opt }),
        "/subject" => Ok(SlashCommand::Subject { text: rest_opt }),
        "/body" => Ok(SlashCommand::Body { text: rest_opt }),
        "/show" => Ok(SlashCommand::Show),
        "/send" => Ok(SlashCommand::Send),
        "/feedback" => match rest_opt {
            Some(text) => Ok(SlashCommand::Feedback { text }),
            None => Err("Usage: /feedback <text>".into()),
        },
        "/clear" => Ok(SlashCommand::Clear),
        "/help" => Ok(SlashCommand::Help {
            command: rest
                .split_whitespace()
                .next()
                .map(|s| s.trim_start_matches('/').to_string()),
        }),
        "/exit" | "/quit" | "/q" => Ok(SlashCommand::Exit),
        other => Err(format!("Unknown command: {}. Type /help for available commands.", other)),
    }
}

fn parse_find(rest: &str) -> Result<SlashCommand, String> {
    let args: Vec<&str> = rest.split_whitespace().collect();
    let mut profile = CompanyProfile {
        industry: String::new(),
        size: String::new(),
        sector: String::new(),
        location: String::new(),
        vibe: String::new(),
        details: String::new(),
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i];
        i += 1;
        // A value runs until the next flag, so "New York" needs no quoting
        let start = i;
        while i < args.len() && !args[i].starts_with("--") {
            i += 1;
        }
        let value = args[start..i].join(" ");
        let field = match flag {
            "--industry" | "-i" => &mut profile.industry,
            "--size" | "-s" => &mut profile.size,
            "--sector" => &mut profile.sector,
            "--location" | "-l" => &mut profile.location,
            "--vibe" => &mut profile.vibe,
            "--details" | "-d" => &mut profile.details,
            other => {
                return Err(format!("Unknown flag for /find: {}", other));
            }
        };
        if value.is_empty() {
            return Err(format!("Missing value for {}", flag));
        }
        *field = value;
    }

    Ok(SlashCommand::Find {
        profile: profile.with_defaults(),
    })
}

fn parse_select(rest: &str) -> Result<SlashCommand, String> {
    let Some(arg) = rest.split_whitespace().next() else {
        return Err("Usage: /select <n>".into());
    };
    match arg.parse::<usize>() {
        Ok(position) if position >= 1 => Ok(SlashCommand::Select { position }),
        _ => Err(format!("Invalid company number: {}", arg)),
    }
}
