use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::chat::client::Completion;
use crate::chat::engine::Engine;
use crate::chat::message::{Message, Role};
use crate::config::ModelChoice;

const HELP_TEXT: &str = "
Available commands:

/quit             Exits the program.
/change           Changes the model being used.
/save <path>      Saves the current transcript to the given path.
/load <path>      Loads a transcript from the given path.
/help             Displays this help message.
/system           Reads one line and appends it as a system message.
/reset            Clears the transcript and the screen.

Anything not starting with '/' is sent to the model as a user message.
";

/// A parsed `/` command. Anything without the prefix is a user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Change,
    Save(Option<String>),
    Load(Option<String>),
    Help,
    System,
    Reset,
    Unknown(String),
}

impl Command {
    /// Returns `None` when the line is ordinary user text.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('/')?;
        let mut words = rest.split_whitespace();
        let word = words.next().unwrap_or("").to_lowercase();
        let arg = words.next().map(str::to_string);

        Some(match word.as_str() {
            "quit" => Self::Quit,
            "change" => Self::Change,
            "save" => Self::Save(arg),
            "load" => Self::Load(arg),
            "help" => Self::Help,
            "system" => Self::System,
            "reset" => Self::Reset,
            other => Self::Unknown(other.to_string()),
        })
    }
}

/// Parses a menu selection; the prior selection stays in place when the
/// input is not a number or is out of range.
pub fn parse_selection(input: &str, len: usize) -> Result<usize, String> {
    let index: usize = input
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", input.trim()))?;
    if index < len {
        Ok(index)
    } else {
        Err(format!("there is no model numbered {index}"))
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Blocking line-oriented loop around the conversation engine.
pub struct Repl<C> {
    engine: Engine<C>,
    models: Vec<ModelChoice>,
    selected: usize,
}

impl<C: Completion> Repl<C> {
    /// `models` is the `/change` menu; the first entry is the startup
    /// selection.
    pub fn new(engine: Engine<C>, models: Vec<ModelChoice>) -> Self {
        Self {
            engine,
            models,
            selected: 0,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        clear_screen();
        println!(
            "{}",
            format!("parley — chatting with {} (/help for commands)", self.current().name).dimmed()
        );

        loop {
            let Some(line) = read_line(&format!("{}", "USER > ".cyan().bold()))? else {
                break;
            };
            if line.is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Some(command) => {
                    if let Flow::Quit = self.dispatch(command)? {
                        break;
                    }
                }
                None => self.user_turn(line),
            }
        }
        Ok(())
    }

    fn current(&self) -> &ModelChoice {
        &self.models[self.selected]
    }

    fn dispatch(&mut self, command: Command) -> io::Result<Flow> {
        match command {
            Command::Quit => {
                println!("{}", "Quitting...".red().bold());
                return Ok(Flow::Quit);
            }
            Command::Change => self.change_model()?,
            Command::Save(None) => report_error("No save path given"),
            Command::Save(Some(path)) => match self.engine.transcript().save(&path) {
                Ok(written) => {
                    report_ok(&format!("Saved transcript to {}", written.display()));
                }
                Err(err) => report_error(&err.to_string()),
            },
            Command::Load(None) => report_error("No load path given"),
            Command::Load(Some(path)) => {
                clear_screen();
                match self.engine.transcript_mut().load(&path) {
                    Ok(read) => {
                        report_ok(&format!("Loaded transcript from {}", read.display()));
                        self.replay();
                    }
                    Err(err) => report_error(&err.to_string()),
                }
            }
            Command::Help => println!("{HELP_TEXT}"),
            Command::System => {
                if let Some(line) = read_line(&format!("{}", "SYSTEM > ".magenta().bold()))? {
                    if !line.is_empty() {
                        self.engine
                            .transcript_mut()
                            .push(Message::text(Role::System, line));
                    }
                }
            }
            Command::Reset => {
                clear_screen();
                self.engine.transcript_mut().reset();
                report_ok("Chat has been reset");
            }
            Command::Unknown(word) => {
                report_error(&format!("Unknown command '/{word}' (try /help)"));
            }
        }
        Ok(Flow::Continue)
    }

    fn change_model(&mut self) -> io::Result<()> {
        for (index, model) in self.models.iter().enumerate() {
            println!("{index}) {}", model.name);
        }
        let Some(input) = read_line("which model do you want to change to > ")? else {
            return Ok(());
        };
        match parse_selection(&input, self.models.len()) {
            Ok(index) => {
                self.selected = index;
                report_ok(&format!("Model changed to {}", self.current().name));
            }
            Err(message) => report_error(&message),
        }
        Ok(())
    }

    fn user_turn(&mut self, line: String) {
        let ModelChoice { name, tools } = self.current().clone();
        match self.engine.send(line, Role::User, &name, tools) {
            Ok(reply) => {
                println!("{}{reply}\n", "ASSISTANT > ".green().bold());
            }
            Err(err) => report_error(&format!("Error: {err}")),
        }
    }

    /// Prints user/assistant messages that carry content, in order.
    fn replay(&self) {
        for message in self.engine.transcript().messages() {
            match (message.role, message.content.as_deref()) {
                (Role::User, Some(content)) => {
                    println!("{}{content}", "USER > ".cyan().bold());
                }
                (Role::Assistant, Some(content)) => {
                    println!("{}{content}\n", "ASSISTANT > ".green().bold());
                }
                _ => {}
            }
        }
    }
}

fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buffer = String::new();
    if io::stdin().read_line(&mut buffer)? == 0 {
        return Ok(None);
    }
    Ok(Some(buffer.trim_end_matches(['\r', '\n']).to_string()))
}

fn report_ok(message: &str) {
    println!("{}", message.green().bold());
}

fn report_error(message: &str) {
    println!("{}", message.red().bold());
}

fn clear_screen() {
    print!("\x1b[2J\x1b[1;1H");
}
