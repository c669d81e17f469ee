use std::process;

use clap::Parser;
use owo_colors::OwoColorize;

use parley::chat::client::HttpCompletions;
use parley::chat::engine::Engine;
use parley::chat::tools::{ToolFunction, ToolParam, ToolParamType, ToolRegistry};
use parley::config;
use parley::repl::Repl;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("PARLEY_GIT_SHA"), ")");

#[derive(Debug, Parser)]
#[command(
    name = "parley",
    about = "Interactive chat client with model-invoked local tools",
    version = VERSION
)]
struct Cli {}

fn builtin_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(
        ToolFunction::new("think", "Returns whatever you put in it").with_param(ToolParam::new(
            "thought",
            ToolParamType::String,
            true,
            Some("The thought that is returned to you".to_string()),
        )),
        Box::new(|args| {
            // validation guarantees a string "thought" argument
            let thought = args
                .get("thought")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            println!("{}{}", "THOUGHT > ".yellow().bold(), thought.yellow());
            Ok(thought.to_string())
        }),
    );

    registry
}

fn main() {
    let _cli = Cli::parse();

    let models = match config::load_models() {
        Ok(models) => models,
        Err(err) => {
            eprintln!("{}", err.red().bold());
            process::exit(1);
        }
    };

    let engine = Engine::new(HttpCompletions::new(), builtin_tools());
    let mut repl = Repl::new(engine, models);
    if let Err(err) = repl.run() {
        eprintln!("{err}");
        process::exit(1);
    }
}
