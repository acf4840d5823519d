use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::db::{self, Handle};
use crate::error::SqdashError;
use crate::history::{HistoryStore, SavedQuery};
use crate::session::SessionState;
use crate::types::{ColumnInfo, QuerySpec, ResultSet, Value};

type InputLines = io::Lines<io::StdinLock<'static>>;

const MAX_CELL_WIDTH: usize = 40;

/// Interactive line-oriented session over one open handle.
///
/// Dot-commands drive the dashboard; any other input runs as SQL
/// against the open database. Operational failures print as alerts and
/// the loop continues; only terminal I/O errors end it.
pub struct Shell {
    handle: Handle,
    session: SessionState,
    history: HistoryStore,
    last_sql: Option<String>,
}

enum Flow {
    Continue,
    Quit,
}

impl Shell {
    pub fn new(handle: Handle, history: HistoryStore) -> Self {
        Self {
            handle,
            session: SessionState::new(),
            history,
            last_sql: None,
        }
    }

    /// Read-eval loop. Returns on `.quit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        println!("sqdash shell. Type .help for commands, .quit to leave.");
        let mut input = io::stdin().lock().lines();
        loop {
            print!("sqdash> ");
            io::stdout().flush()?;
            let Some(line) = input.next() else { break };
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match self.dispatch(line, &mut input)? {
                Flow::Continue => {}
                Flow::Quit => break,
            }
        }
        self.session.clear();
        self.handle.close()?;
        Ok(())
    }

    fn dispatch(&mut self, line: &str, input: &mut InputLines) -> Result<Flow> {
        let (command, rest) = split_command(line);
        match command {
            ".quit" | ".exit" => return Ok(Flow::Quit),
            ".help" => print_help(),
            ".tables" => self.show_tables(),
            ".schema" => self.show_schema(rest),
            ".fetch" => self.fetch(rest, input)?,
            ".export" => self.export(rest),
            ".save" => self.save(rest),
            ".history" => print_history(&self.history.list()),
            ".run" => self.run_saved(rest),
            ".edit" => self.edit_saved(rest, input)?,
            ".rm" => self.remove_saved(rest),
            _ if line.starts_with('.') => println!("unknown command: {command} (try .help)"),
            _ => self.submit_sql(line),
        }
        Ok(Flow::Continue)
    }

    fn submit_sql(&mut self, sql: &str) {
        self.last_sql = Some(sql.to_string());
        match self.session.submit(&mut self.handle, sql) {
            Ok(result) => print_result(result),
            Err(e) => alert(&e),
        }
    }

    fn show_tables(&mut self) {
        match db::list_tables(&mut self.handle) {
            Ok(tables) if tables.is_empty() => println!("no tables"),
            Ok(tables) => {
                for table in tables {
                    println!("{table}");
                }
            }
            Err(e) => alert(&e),
        }
    }

    fn show_schema(&mut self, arg: &str) {
        if arg.is_empty() {
            println!("usage: .schema TABLE");
            return;
        }
        match db::describe(&mut self.handle, arg) {
            Ok(columns) => print!("{}", render_schema(&columns)),
            Err(e) => alert(&e),
        }
    }

    /// Prompt for each clause of a SELECT and run the assembled
    /// statement. Blank answers leave the clause out.
    fn fetch(&mut self, arg: &str, input: &mut InputLines) -> io::Result<()> {
        let table = if arg.is_empty() {
            let Some(table) = prompt(input, "table")? else {
                return Ok(());
            };
            table
        } else {
            arg.to_string()
        };
        let Some(columns) = prompt(input, "columns (comma separated, blank for all)")? else {
            return Ok(());
        };
        let Some(where_clause) = prompt(input, "where")? else {
            return Ok(());
        };
        let Some(group_by) = prompt(input, "group by")? else {
            return Ok(());
        };
        let Some(having) = prompt(input, "having")? else {
            return Ok(());
        };
        let Some(order_by) = prompt(input, "order by")? else {
            return Ok(());
        };
        let Some(limit) = prompt(input, "limit")? else {
            return Ok(());
        };
        let Some(offset) = prompt(input, "offset")? else {
            return Ok(());
        };

        let spec = QuerySpec {
            table,
            columns,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
        };
        match self.session.submit_spec(&mut self.handle, &spec) {
            Ok(result) => print_result(result),
            Err(e) => alert(&e),
        }
        Ok(())
    }

    fn export(&mut self, arg: &str) {
        if arg.is_empty() {
            println!("usage: .export PATH");
            return;
        }
        match self.session.export_csv(Path::new(arg)) {
            Ok(()) => println!("exported to {arg}"),
            Err(e) => alert(&e),
        }
    }

    fn save(&mut self, arg: &str) {
        let Some(query) = self.last_sql.clone() else {
            println!("no query to save; run one first");
            return;
        };
        match self.history.append(&mut self.handle, arg, &query) {
            Ok(()) => println!("saved '{arg}'"),
            Err(e) => alert(&e),
        }
    }

    fn run_saved(&mut self, arg: &str) {
        let Some(index) = parse_index(arg) else {
            println!("usage: .run INDEX");
            return;
        };
        let Some(entry) = self.history.get(index) else {
            println!("no saved query at index {index}");
            return;
        };
        println!("{}", entry.query);
        self.submit_sql(&entry.query);
    }

    fn edit_saved(&mut self, arg: &str, input: &mut InputLines) -> io::Result<()> {
        let Some(index) = parse_index(arg) else {
            println!("usage: .edit INDEX");
            return Ok(());
        };
        let Some(current) = self.history.get(index) else {
            println!("no saved query at index {index}");
            return Ok(());
        };

        println!("editing '{}' (blank keeps the current value)", current.title);
        let Some(title) = prompt(input, &format!("title [{}]", current.title))? else {
            return Ok(());
        };
        let Some(query) = prompt(input, &format!("query [{}]", current.query))? else {
            return Ok(());
        };
        let title = if title.is_empty() { current.title } else { title };
        let query = if query.is_empty() { current.query } else { query };

        match self.history.update(&mut self.handle, index, &title, &query) {
            Ok(()) => println!("updated '{title}'"),
            Err(e) => alert(&e),
        }
        Ok(())
    }

    fn remove_saved(&mut self, arg: &str) {
        let Some(index) = parse_index(arg) else {
            println!("usage: .rm INDEX");
            return;
        };
        if self.history.get(index).is_none() {
            println!("no saved query at index {index}");
            return;
        }
        match self.history.delete(index) {
            Ok(()) => println!("removed {index}"),
            Err(e) => alert(&e),
        }
    }
}

fn prompt(input: &mut InputLines, label: &str) -> io::Result<Option<String>> {
    print!("{label}: ");
    io::stdout().flush()?;
    match input.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

fn alert(e: &SqdashError) {
    eprintln!("{e}");
}

fn print_help() {
    println!("commands:");
    println!("  .tables          list user tables");
    println!("  .schema TABLE    show columns, types, and key roles");
    println!("  .fetch [TABLE]   build a SELECT clause by clause");
    println!("  .export PATH     write the last result to a CSV file");
    println!("  .save TITLE      save the last query to history");
    println!("  .history         list saved queries");
    println!("  .run INDEX       replay a saved query");
    println!("  .edit INDEX      edit a saved query");
    println!("  .rm INDEX        delete a saved query");
    println!("  .quit            close the session and leave");
    println!("anything else runs as SQL against the open database");
}

/// Print a result set as a text table with a row-count footer, or a
/// distinct notice when the statement produced no rows.
pub fn print_result(result: &ResultSet) {
    if result.is_empty() {
        println!("no rows ({} ms)", result.exec_ms);
        return;
    }
    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(Value::to_text).collect())
        .collect();
    print!("{}", render_table(&result.columns, &rows));
    println!("{} row(s) in {} ms", result.rows.len(), result.exec_ms);
}

pub fn print_history(history: &[SavedQuery]) {
    if history.is_empty() {
        println!("history is empty");
        return;
    }
    for (index, entry) in history.iter().enumerate() {
        println!(
            "{index:3}  {title:<24}  {query}",
            title = truncate_cell(&entry.title, 24),
            query = entry.query
        );
    }
}

pub fn render_schema(columns: &[ColumnInfo]) -> String {
    let headers: Vec<String> = ["column", "type", "key"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows: Vec<Vec<String>> = columns
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.data_type.clone(),
                c.key.marker().to_string(),
            ]
        })
        .collect();
    render_table(&headers, &rows)
}

/// Fixed-width text table. Column widths follow the content, capped at
/// [`MAX_CELL_WIDTH`]; longer cells are truncated with an ellipsis.
fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| cell_width(c)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell_width(cell));
        }
    }

    let mut out = String::new();
    push_row(&mut out, columns, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn cell_width(cell: &str) -> usize {
    cell.chars().count().min(MAX_CELL_WIDTH)
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let cell = truncate_cell(cell, MAX_CELL_WIDTH);
        line.push_str(&cell);
        for _ in cell.chars().count()..*width {
            line.push(' ');
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate_cell(cell: &str, max: usize) -> String {
    if cell.chars().count() <= max {
        cell.to_string()
    } else {
        let kept: String = cell.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    }
}

fn parse_index(arg: &str) -> Option<usize> {
    arg.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyRole;
    use pretty_assertions::assert_eq;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_table_pads_and_rules() {
        let columns = strings(&["id", "name"]);
        let rows = vec![strings(&["1", "apple"]), strings(&["2", "pear"])];
        assert_eq!(
            render_table(&columns, &rows),
            "id  name\n\
             --  -----\n\
             1   apple\n\
             2   pear\n"
        );
    }

    #[test]
    fn test_render_table_truncates_long_cells() {
        let columns = strings(&["note"]);
        let long = "x".repeat(60);
        let rows = vec![vec![long]];
        let rendered = render_table(&columns, &rows);
        let last_line = rendered.lines().last().unwrap();
        assert_eq!(last_line.chars().count(), MAX_CELL_WIDTH);
        assert!(last_line.ends_with("..."));
    }

    #[test]
    fn test_render_schema_lists_key_markers() {
        let columns = vec![
            ColumnInfo {
                name: "id".to_string(),
                data_type: "INTEGER".to_string(),
                key: KeyRole::Primary,
            },
            ColumnInfo {
                name: "name".to_string(),
                data_type: "TEXT".to_string(),
                key: KeyRole::None,
            },
        ];
        assert_eq!(
            render_schema(&columns),
            "column  type     key\n\
             ------  -------  ---\n\
             id      INTEGER  PRI\n\
             name    TEXT\n"
        );
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command(".schema  orders "), (".schema", "orders"));
        assert_eq!(split_command(".tables"), (".tables", ""));
        assert_eq!(split_command(".save my title"), (".save", "my title"));
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("3"), Some(3));
        assert_eq!(parse_index("three"), None);
        assert_eq!(parse_index("-1"), None);
    }
}
