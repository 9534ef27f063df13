use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::controller::{Level, Notification};
use crate::task::Priority;
use crate::view::{FormView, ListEntry, LoadState, ViewSnapshot};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self::with_color(cfg.get_bool("color").unwrap_or(true) && io::stdout().is_terminal())
    }

    fn with_color(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self::with_color(false)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_snapshot<W: Write>(&self, out: &mut W, view: &ViewSnapshot) -> anyhow::Result<()> {
        match &view.load {
            LoadState::Idle | LoadState::Loading => {
                writeln!(out, "Loading tasks...")?;
                return Ok(());
            }
            LoadState::Failed(message) => {
                writeln!(out, "{}", self.paint("Something went wrong", "31"))?;
                writeln!(out, "{message}")?;
                writeln!(out, "Type `retry` to try again.")?;
                return Ok(());
            }
            LoadState::Ready => {}
        }

        let filter = &view.filter;
        let mut summary = format!(
            "{} of {} tasks | status: {} | priority: {}",
            view.rows.len(),
            view.total,
            filter.status,
            filter.priority
        );
        if !filter.search.is_empty() {
            summary.push_str(&format!(" | search: \"{}\"", filter.search));
        }
        if view.show_clear_filters {
            summary.push_str(" | `clear` resets filters");
        }
        writeln!(out, "{summary}")?;

        if let Some(empty) = view.empty {
            writeln!(out)?;
            writeln!(out, "{}", empty.title())?;
            writeln!(out, "{}", empty.hint())?;
            if empty.offers_create() {
                writeln!(out, "Type `new` to create a task.")?;
            }
            return Ok(());
        }

        let headers = vec![
            "#".to_string(),
            "".to_string(),
            "Title".to_string(),
            "Priority".to_string(),
            "List".to_string(),
            "Due".to_string(),
        ];

        let mut rows = Vec::with_capacity(view.rows.len());
        for (idx, row) in view.rows.iter().enumerate() {
            let check = if row.busy {
                "[~]"
            } else if row.task.is_completed() {
                "[x]"
            } else {
                "[ ]"
            };

            let title = if row.task.is_completed() {
                self.paint(&row.task.title, "2")
            } else {
                row.task.title.clone()
            };

            let priority = format!("{} Priority", row.task.priority.label());
            let priority = match row.task.priority {
                Priority::High => self.paint(&priority, "31"),
                Priority::Medium => self.paint(&priority, "33"),
                Priority::Low => priority,
            };

            let list = row
                .list
                .as_ref()
                .map(|badge| badge.name.clone())
                .unwrap_or_default();

            let due = row.due_label.clone().unwrap_or_default();
            let due = if row.overdue {
                self.paint(&due, "31")
            } else {
                due
            };

            rows.push(vec![
                self.paint(&(idx + 1).to_string(), "33"),
                check.to_string(),
                title,
                priority,
                list,
                due,
            ]);
        }

        write_table(&mut *out, headers, rows)?;
        Ok(())
    }

    pub fn print_form<W: Write>(&self, out: &mut W, form: &FormView) -> anyhow::Result<()> {
        let draft = &form.draft;
        writeln!(out, "{}", self.paint(form.heading(), "1"))?;
        writeln!(out, "  title       {}", draft.title)?;
        writeln!(out, "  description {}", draft.description)?;
        writeln!(out, "  priority    {}", draft.priority)?;
        writeln!(out, "  due         {}", draft.due_date)?;
        writeln!(out, "  list        {}", draft.list_id)?;
        writeln!(
            out,
            "`set <field> <value>` to edit, `submit` to {}, `cancel` to discard",
            form.submit_label().to_ascii_lowercase()
        )?;
        Ok(())
    }

    pub fn print_lists<W: Write>(&self, out: &mut W, lists: &[ListEntry]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Name".to_string(),
            "Color".to_string(),
            "Tasks".to_string(),
        ];
        let rows = lists
            .iter()
            .map(|list| {
                vec![
                    list.id.clone(),
                    list.name.clone(),
                    list.color.clone(),
                    list.task_count.to_string(),
                ]
            })
            .collect();
        write_table(out, headers, rows)
    }

    pub fn print_notifications<W: Write>(
        &self,
        out: &mut W,
        notifications: &[Notification],
    ) -> anyhow::Result<()> {
        for note in notifications {
            let line = match note.level {
                Level::Success => self.paint(&format!("✓ {}", note.message), "32"),
                Level::Error => self.paint(&format!("✗ {}", note.message), "31"),
            };
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_pads_by_visible_width() {
        let mut out = Vec::new();
        write_table(
            &mut out,
            vec!["A".to_string(), "B".to_string()],
            vec![vec!["\x1b[31mred\x1b[0m".to_string(), "x".to_string()]],
        )
        .expect("write table");

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "A   B ");
        assert_eq!(lines[1], "--- - ");
        assert_eq!(strip_ansi(lines[2]), "red x ");
    }

    #[test]
    fn color_setting_follows_config_booleans() {
        for value in ["off", "no", "false", "0", "N"] {
            let mut cfg = Config::default();
            cfg.apply_overrides(vec![("color".to_string(), value.to_string())]);
            assert!(!Renderer::new(&cfg).color, "color = {value}");
        }
    }

    #[test]
    fn painting_is_skipped_without_color() {
        assert_eq!(Renderer::plain().paint("x", "31"), "x");
        assert_eq!(Renderer::with_color(true).paint("x", "31"), "\x1b[31mx\x1b[0m");
    }

    #[test]
    fn failed_load_prints_retry_hint() {
        let view = ViewSnapshot {
            load: LoadState::Failed("list not found: 9".to_string()),
            rows: vec![],
            total: 0,
            filter: Default::default(),
            show_clear_filters: false,
            empty: None,
            form: None,
            lists: vec![],
        };
        let mut out = Vec::new();
        Renderer::plain()
            .print_snapshot(&mut out, &view)
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("Something went wrong"));
        assert!(text.contains("list not found: 9"));
        assert!(text.contains("retry"));
    }
}
