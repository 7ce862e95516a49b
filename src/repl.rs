use std::{borrow::Cow, path::PathBuf, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use reedline::{FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch, Reedline, Signal};
use rig::{
    agent::Agent,
    completion::{Message, Prompt as _},
    providers::anthropic::completion::CompletionModel,
};
use termimad::{crossterm::style::Color, MadSkin, StyledChar};

const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_BLUE: &str = "\x1b[1;34m";
const DIM: &str = "\x1b[2m";
const GRAY: &str = "\x1b[38;5;245m";
const RESET: &str = "\x1b[0m";

const HISTORY_CAPACITY: usize = 1000;

const ORDERS_PROMPT: &str = "Give me a quick planning overview: list the active \
    manufacturing orders, rank the open ones by priority and flag any with high risk \
    or missing materials.";

// ── Prompt ─────────────────────────────────────────────────────

/// Left side shows the role, right side the database being worked on.
struct PlannerPrompt {
    db: String,
}

impl Prompt for PlannerPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{BOLD_BLUE}planner{RESET}"))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{DIM}{}{RESET}", self.db))
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed(" > ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(&self, _search: PromptHistorySearch) -> Cow<'_, str> {
        Cow::Borrowed("(history)> ")
    }
}

fn editor() -> Reedline {
    let path = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
        .join(".mrp-copilot")
        .join("history.txt");
    match FileBackedHistory::with_file(HISTORY_CAPACITY, path) {
        Ok(history) => Reedline::create().with_history(Box::new(history)),
        Err(e) => {
            tracing::warn!(error = %e, "history file unavailable, keeping history in memory");
            Reedline::create()
        }
    }
}

// ── Slash commands ─────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum SlashCommand {
    Help,
    Orders,
    Clear,
    Quit,
    Unknown(String),
}

impl SlashCommand {
    /// `None` for ordinary chat input.
    fn parse(input: &str) -> Option<Self> {
        let word = input.strip_prefix('/')?.split_whitespace().next().unwrap_or_default();
        Some(match word {
            "help" | "?" => Self::Help,
            "orders" => Self::Orders,
            "clear" => Self::Clear,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        })
    }
}

fn print_help() {
    println!(
        "\n{BOLD_BLUE}MRP Copilot{RESET}: production planning assistant\n\n\
         {DIM}Commands:{RESET}\n  \
         /help    Show this help message\n  \
         /orders  Overview of active orders, priorities and risks\n  \
         /clear   Forget the conversation so far\n  \
         /quit    Exit (or Ctrl+D)\n\n\
         Ask about orders, stock or capacity; the copilot reads the ERP before answering.\n"
    );
}

// ── Chat ───────────────────────────────────────────────────────

fn markdown_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.bold.set_fg(Color::White);
    for header in &mut skin.headers {
        header.set_fg(Color::Blue);
    }
    skin.bullet = StyledChar::from_fg_char(Color::Green, '-');
    skin.table.set_fg(Color::AnsiValue(250));
    skin.inline_code.set_fg(Color::AnsiValue(180));
    skin.code_block.set_fg(Color::AnsiValue(180));
    skin
}

fn spinner() -> ProgressBar {
    let frames: Vec<String> = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]
        .iter()
        .map(|f| format!("{GRAY}{f}{RESET}"))
        .collect();
    let frames: Vec<&str> = frames.iter().map(String::as_str).collect();
    let style = ProgressStyle::default_spinner()
        .template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&frames);

    let bar = ProgressBar::new_spinner();
    bar.set_style(style);
    bar.set_message(format!("{GRAY}Checking the ERP...{RESET}"));
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// One conversation with the copilot. History is kept across turns until
/// `/clear`.
struct ChatSession<'a> {
    copilot: &'a Agent<CompletionModel>,
    history: Vec<Message>,
    skin: MadSkin,
}

impl<'a> ChatSession<'a> {
    fn new(copilot: &'a Agent<CompletionModel>) -> Self {
        Self {
            copilot,
            history: Vec::new(),
            skin: markdown_skin(),
        }
    }

    fn ask(&mut self, rt: &tokio::runtime::Runtime, input: &str) {
        let bar = spinner();
        let copilot = self.copilot;
        let history = &mut self.history;
        let outcome = rt.block_on(async { copilot.prompt(input).with_history(history).await });
        bar.finish_and_clear();

        match outcome {
            Ok(answer) => {
                println!("\n{BOLD_GREEN}Copilot>{RESET}");
                self.skin.print_text(&answer);
                println!();
            }
            Err(e) => {
                tracing::warn!(error = %e, "copilot prompt failed");
                eprintln!("\n{BOLD_RED}[Error]{RESET} {e}\n");
            }
        }
    }
}

// ── Entry point ────────────────────────────────────────────────

pub fn run(rt: &tokio::runtime::Runtime, copilot: &Agent<CompletionModel>, db: &str) -> anyhow::Result<()> {
    let mut editor = editor();
    let prompt = PlannerPrompt { db: db.to_string() };
    let mut chat = ChatSession::new(copilot);

    loop {
        let input = match editor.read_line(&prompt)? {
            Signal::Success(line) => line,
            Signal::CtrlD | Signal::CtrlC => break,
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match SlashCommand::parse(input) {
            None => chat.ask(rt, input),
            Some(SlashCommand::Help) => print_help(),
            Some(SlashCommand::Orders) => chat.ask(rt, ORDERS_PROMPT),
            Some(SlashCommand::Clear) => {
                chat.history.clear();
                println!("{DIM}Conversation cleared.{RESET}");
            }
            Some(SlashCommand::Quit) => break,
            Some(SlashCommand::Unknown(name)) => {
                println!("{DIM}Unknown command /{name}; try /help.{RESET}");
            }
        }
    }

    Ok(())
}
