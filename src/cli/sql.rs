//! CLI `sql` command: run one operator-supplied statement and render the result.

use anyhow::Result;
use std::io::{BufRead, Write};

use crate::db::{ConnectionProvider, QueryOutcome, RowSet};
use crate::schema::SchemaAdmin;

const RULE_WIDTH: usize = 100;

/// Read a statement line by line until an empty line or EOF.
pub fn read_statement(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut lines = Vec::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.trim().is_empty() {
            break;
        }
        lines.push(line.to_string());
    }

    let sql = lines.join("\n");
    Ok((!sql.trim().is_empty()).then_some(sql))
}

/// Trim whitespace and a trailing `;`, which the driver rejects outside
/// PL/SQL blocks.
pub fn normalize_statement(sql: &str) -> String {
    let sql = sql.trim();
    let upper = sql.to_uppercase();
    let plsql = upper.starts_with("BEGIN") || upper.starts_with("DECLARE") || upper.ends_with("END;");
    if plsql {
        return sql.to_string();
    }
    sql.trim_end_matches(';').trim_end().to_string()
}

fn render_rows(rows: &RowSet) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!("Query executed. {} rows returned.\n", rows.len());
    if rows.is_empty() {
        return out;
    }
    out.push_str(&format!("{rule}\n{}\n{rule}\n", rows.columns.join(" | ")));
    for row in &rows.rows {
        let cells: Vec<&str> = row.iter().map(|v| v.as_deref().unwrap_or("NULL")).collect();
        out.push_str(&cells.join(" | "));
        out.push('\n');
    }
    out.push_str(&rule);
    out.push('\n');
    out
}

/// Text rendering of a statement's result.
pub fn render_outcome(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Rows(rows) => render_rows(rows),
        QueryOutcome::RowsAffected(n) => format!("Statement executed. {n} rows affected.\n"),
    }
}

/// Run `statement`, or read one from `input` when none is given.
pub fn sql<P: ConnectionProvider>(
    admin: &SchemaAdmin<P>,
    statement: Option<String>,
    input: &mut impl BufRead,
) -> Result<()> {
    let statement = match statement {
        Some(s) => Some(s),
        None => {
            println!("Enter the SQL statement. Finish with an empty line.");
            read_statement(input)?
        }
    };
    let Some(statement) = statement else {
        println!("No SQL entered. Cancelled.");
        return Ok(());
    };

    let statement = normalize_statement(&statement);
    println!("\nExecuting:\n{statement}\n");

    match admin.run_sql(&statement) {
        Ok(outcome) => {
            print!("{}", render_outcome(&outcome));
            Ok(())
        }
        Err(e) => {
            super::print_error(&e);
            anyhow::bail!("statement failed")
        }
    }
}
