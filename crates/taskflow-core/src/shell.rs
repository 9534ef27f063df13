use std::io::{self, Write};
use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::{Local, NaiveDate};
use tracing::{debug, instrument};

use crate::controller::{Confirm, Outcome, ViewController, ViewEvent};
use crate::draft::DraftField;
use crate::filter::{PriorityFilter, StatusFilter};
use crate::render::Renderer;
use crate::task::TaskId;

const HELP: &str = "\
commands:
  ls                          show tasks
  search <term>               filter by title/description (empty clears)
  filter <all|active|completed>
  priority <all|low|medium|high>
  clear                       reset search and filters
  new                         open the create form
  edit <row|id>               open the edit form
  set <field> <value>         fields: title, description, priority, due, list
  submit | cancel             finish or discard the open form
  toggle <row|id>             complete or reopen
  delete <row|id>             delete after confirmation
  lists                       show lists
  retry                       reload after a failed load
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Search(String),
    Filter(StatusFilter),
    Priority(PriorityFilter),
    Clear,
    New,
    Edit(String),
    Set(DraftField, String),
    Submit,
    Cancel,
    Toggle(String),
    Delete(String),
    Lists,
    Retry,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        let target = |name: &str| {
            if rest.is_empty() {
                Err(anyhow!("usage: {name} <row|id>"))
            } else {
                Ok(rest.to_string())
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "ls" | "list" => Ok(Self::List),
            "search" => Ok(Self::Search(rest.to_string())),
            "filter" => Ok(Self::Filter(rest.parse()?)),
            "priority" => Ok(Self::Priority(rest.parse()?)),
            "clear" => Ok(Self::Clear),
            "new" | "add" => Ok(Self::New),
            "edit" => target("edit").map(Self::Edit),
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(f, v)| (f, v.trim()))
                    .unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err(anyhow!("usage: set <field> <value>"));
                }
                Ok(Self::Set(field.parse()?, value.to_string()))
            }
            "submit" | "save" => Ok(Self::Submit),
            "cancel" | "close" => Ok(Self::Cancel),
            "toggle" | "done" => target("toggle").map(Self::Toggle),
            "delete" | "rm" => target("delete").map(Self::Delete),
            "lists" => Ok(Self::Lists),
            "retry" => Ok(Self::Retry),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(anyhow!("unknown command: {other} (try `help`)")),
        }
    }
}

/// Asks on stdout and reads the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

/// Reads stdin one line at a time without holding its lock between
/// lines, so [`StdinConfirm`] can read answers in between.
pub fn stdin_lines() -> impl Iterator<Item = io::Result<String>> {
    std::iter::from_fn(|| {
        let mut buf = String::new();
        match io::stdin().read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => Some(Ok(buf)),
            Err(err) => Some(Err(err)),
        }
    })
}

/// Line-driven presentation over a [`ViewController`].
pub struct Shell<'a> {
    controller: &'a ViewController,
    renderer: Renderer,
    today: Box<dyn Fn() -> NaiveDate + 'a>,
    rows: Vec<TaskId>,
}

impl<'a> Shell<'a> {
    pub fn new(controller: &'a ViewController, renderer: Renderer) -> Self {
        Self {
            controller,
            renderer,
            today: Box::new(|| Local::now().date_naive()),
            rows: vec![],
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Box::new(move || today);
        self
    }

    #[instrument(skip_all)]
    pub async fn run<I, W>(&mut self, lines: I, out: &mut W) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = io::Result<String>>,
        W: Write,
    {
        self.controller.load().await;
        self.show(out)?;
        writeln!(out, "Type `help` for commands.")?;
        prompt(out)?;

        for line in lines {
            let line = line.context("failed reading input")?;
            if line.trim().is_empty() {
                prompt(out)?;
                continue;
            }

            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command, out).await?,
                Err(err) => writeln!(out, "{err}")?,
            }
            prompt(out)?;
        }

        writeln!(out)?;
        Ok(())
    }

    #[instrument(skip(self, out))]
    pub async fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> anyhow::Result<()> {
        let event = match command {
            Command::Help => {
                writeln!(out, "{HELP}")?;
                return Ok(());
            }
            Command::Lists => {
                let lists = self.controller.snapshot((self.today)()).lists;
                self.renderer.print_lists(out, &lists)?;
                return Ok(());
            }
            Command::List | Command::Quit => None,
            Command::Search(term) => Some(ViewEvent::SearchChanged(term)),
            Command::Filter(status) => Some(ViewEvent::FilterChanged(status)),
            Command::Priority(priority) => Some(ViewEvent::PriorityChanged(priority)),
            Command::Clear => Some(ViewEvent::ClearFilters),
            Command::New => Some(ViewEvent::Edit(None)),
            Command::Edit(target) => Some(ViewEvent::Edit(Some(self.resolve(&target)))),
            Command::Set(field, value) => Some(ViewEvent::DraftChanged(field, value)),
            Command::Submit => Some(ViewEvent::Submit),
            Command::Cancel => Some(ViewEvent::Close),
            Command::Toggle(target) => Some(ViewEvent::ToggleStatus(self.resolve(&target))),
            Command::Delete(target) => Some(ViewEvent::Delete(self.resolve(&target))),
            Command::Retry => Some(ViewEvent::Retry),
        };

        if let Some(event) = event {
            let outcome = self.controller.dispatch(event).await;
            debug!(?outcome, "event handled");
            match outcome {
                Outcome::Busy => writeln!(out, "still working on that one")?,
                Outcome::Skipped if !self.controller.is_form_open() => {
                    writeln!(out, "nothing to do")?;
                }
                _ => {}
            }
        }

        let notifications = self.controller.take_notifications();
        self.renderer.print_notifications(out, &notifications)?;
        self.show(out)
    }

    /// Row numbers refer to the most recently shown table.
    fn resolve(&self, target: &str) -> TaskId {
        target
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| self.rows.get(idx))
            .cloned()
            .unwrap_or_else(|| target.to_string())
    }

    fn show<W: Write>(&mut self, out: &mut W) -> anyhow::Result<()> {
        let view = self.controller.snapshot((self.today)());
        if let Some(form) = &view.form {
            return self.renderer.print_form(out, form);
        }
        self.rows = view.rows.iter().map(|row| row.task.id.clone()).collect();
        self.renderer.print_snapshot(out, &view)
    }
}

fn prompt<W: Write>(out: &mut W) -> anyhow::Result<()> {
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            "search  buy milk ".parse::<Command>().expect("parse"),
            Command::Search("buy milk".to_string())
        );
        assert_eq!(
            "filter active".parse::<Command>().expect("parse"),
            Command::Filter(StatusFilter::Active)
        );
        assert_eq!(
            "set title Call mom".parse::<Command>().expect("parse"),
            Command::Set(DraftField::Title, "Call mom".to_string())
        );
        assert_eq!(
            "set description".parse::<Command>().expect("parse"),
            Command::Set(DraftField::Description, String::new())
        );
        assert_eq!("Q".parse::<Command>().expect("parse"), Command::Quit);
        assert_eq!("search".parse::<Command>().expect("parse"), Command::Search(String::new()));
    }

    #[test]
    fn rejects_bad_input() {
        assert!("toggle".parse::<Command>().is_err());
        assert!("filter later".parse::<Command>().is_err());
        assert!("set colour red".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }
}
