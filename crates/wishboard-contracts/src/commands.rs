use crate::wish::Category;

/// One-line summaries printed by `/help`.
pub const BOARD_HELP: &[&str] = &[
    "/list [category]          show the board, optionally filtered",
    "/add \"title\" amount [cat] create a wish (image resolved before saving)",
    "/save id amount           add savings toward a wish",
    "/complete id              mark a wish achieved (one-way)",
    "/remove id                delete a wish (asks for confirmation)",
    "/plan id                  generate a 3-step action plan",
    "/regen id [\"prompt\"]      regenerate the wish image",
    "/quit                     leave the board",
];

#[derive(Debug, Clone, PartialEq)]
pub enum BoardCommand {
    Noop,
    Help,
    List { category: Option<Category> },
    Add {
        title: String,
        amount: f64,
        category: Option<Category>,
    },
    Save { id: String, amount: f64 },
    Complete { id: String },
    Remove { id: String },
    Plan { id: String },
    Regenerate { id: String, prompt: Option<String> },
    Quit,
    Invalid { message: String },
    Unknown { input: String },
}

/// Parses one line of board-shell input. Commands are slash-prefixed;
/// anything else is handed back as `Unknown` so the shell can hint at /help.
pub fn parse_command(text: &str) -> BoardCommand {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return BoardCommand::Noop;
    }
    let Some(slash_tail) = trimmed.strip_prefix('/') else {
        return BoardCommand::Unknown {
            input: trimmed.to_string(),
        };
    };

    let command_len = slash_tail
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    if command_len == 0 {
        return BoardCommand::Unknown {
            input: trimmed.to_string(),
        };
    }
    let command = slash_tail[..command_len].to_ascii_lowercase();
    let args = split_args(slash_tail[command_len..].trim());

    match command.as_str() {
        "help" => BoardCommand::Help,
        "quit" | "exit" => BoardCommand::Quit,
        "list" => match args.first() {
            None => BoardCommand::List { category: None },
            Some(raw) => match raw.parse::<Category>() {
                Ok(category) => BoardCommand::List {
                    category: Some(category),
                },
                Err(message) => BoardCommand::Invalid { message },
            },
        },
        "add" => parse_add(&args),
        "save" => parse_save(&args),
        "complete" => one_id(&args, |id| BoardCommand::Complete { id }),
        "remove" | "delete" => one_id(&args, |id| BoardCommand::Remove { id }),
        "plan" => one_id(&args, |id| BoardCommand::Plan { id }),
        "regen" | "regenerate" => match args.split_first() {
            None => BoardCommand::Invalid {
                message: "/regen requires a wish id".to_string(),
            },
            Some((id, rest)) => BoardCommand::Regenerate {
                id: id.clone(),
                prompt: if rest.is_empty() {
                    None
                } else {
                    Some(rest.join(" "))
                },
            },
        },
        _ => BoardCommand::Unknown {
            input: trimmed.to_string(),
        },
    }
}

fn parse_add(args: &[String]) -> BoardCommand {
    let (Some(title), Some(raw_amount)) = (args.first(), args.get(1)) else {
        return BoardCommand::Invalid {
            message: "/add requires a title and an amount".to_string(),
        };
    };
    let Ok(amount) = raw_amount.parse::<f64>() else {
        return BoardCommand::Invalid {
            message: format!("'{raw_amount}' is not an amount"),
        };
    };
    let category = match args.get(2) {
        None => None,
        Some(raw) => match raw.parse::<Category>() {
            Ok(category) => Some(category),
            Err(message) => return BoardCommand::Invalid { message },
        },
    };
    BoardCommand::Add {
        title: title.clone(),
        amount,
        category,
    }
}

fn parse_save(args: &[String]) -> BoardCommand {
    let (Some(id), Some(raw_amount)) = (args.first(), args.get(1)) else {
        return BoardCommand::Invalid {
            message: "/save requires a wish id and an amount".to_string(),
        };
    };
    match raw_amount.parse::<f64>() {
        Ok(amount) => BoardCommand::Save {
            id: id.clone(),
            amount,
        },
        Err(_) => BoardCommand::Invalid {
            message: format!("'{raw_amount}' is not an amount"),
        },
    }
}

fn one_id(args: &[String], build: impl Fn(String) -> BoardCommand) -> BoardCommand {
    match args.first() {
        Some(id) if args.len() == 1 => build(id.clone()),
        _ => BoardCommand::Invalid {
            message: "expected exactly one wish id".to_string(),
        },
    }
}

fn split_args(arg: &str) -> Vec<String> {
    if arg.is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts.into_iter().filter(|value| !value.is_empty()).collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use crate::wish::Category;

    use super::{parse_command, BoardCommand};

    #[test]
    fn parse_add_with_quoted_title() {
        let command = parse_command("/add \"Ferrari rojo 458\" 250000 vehiculos");
        assert_eq!(
            command,
            BoardCommand::Add {
                title: "Ferrari rojo 458".to_string(),
                amount: 250000.0,
                category: Some(Category::Vehicles),
            }
        );
    }

    #[test]
    fn parse_save_and_complete() {
        assert_eq!(
            parse_command("/save 3fa9 150.50"),
            BoardCommand::Save {
                id: "3fa9".to_string(),
                amount: 150.50,
            }
        );
        assert_eq!(
            parse_command("/COMPLETE 3fa9"),
            BoardCommand::Complete {
                id: "3fa9".to_string(),
            }
        );
    }

    #[test]
    fn parse_regen_with_optional_prompt() {
        assert_eq!(
            parse_command("/regen 3fa9"),
            BoardCommand::Regenerate {
                id: "3fa9".to_string(),
                prompt: None,
            }
        );
        assert_eq!(
            parse_command("/regen 3fa9 \"mansión en acantilado\" futurista"),
            BoardCommand::Regenerate {
                id: "3fa9".to_string(),
                prompt: Some("mansión en acantilado futurista".to_string()),
            }
        );
    }

    #[test]
    fn bad_amounts_and_missing_args_are_invalid() {
        assert!(matches!(
            parse_command("/add \"Solo título\""),
            BoardCommand::Invalid { .. }
        ));
        assert!(matches!(
            parse_command("/save 3fa9 mucho"),
            BoardCommand::Invalid { .. }
        ));
        assert!(matches!(
            parse_command("/list lujos"),
            BoardCommand::Invalid { .. }
        ));
    }

    #[test]
    fn empty_input_is_noop_and_bare_text_is_unknown() {
        assert_eq!(parse_command("   "), BoardCommand::Noop);
        assert_eq!(
            parse_command("quiero un yate"),
            BoardCommand::Unknown {
                input: "quiero un yate".to_string(),
            }
        );
        assert!(matches!(
            parse_command("/teleport"),
            BoardCommand::Unknown { .. }
        ));
    }
}
