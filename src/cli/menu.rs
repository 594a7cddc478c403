//! Interactive menu.
//!
//! [`handle`] maps one line of operator input to an [`Effect`] without touching
//! the terminal or the database; [`run_menu`] is the loop that reads input,
//! calls `handle`, and performs the effect.

use anyhow::Result;
use std::io::{BufRead, Write};

use super::clean::CleanArgs;
use super::InterruptSlot;
use crate::config::OraConfig;
use crate::db::ConnectionProvider;
use crate::schema::SchemaAdmin;

const MENU: &str = "\
Oracle Schema Utility
=====================
  1. List all tables
  2. Check Flyway control table
  3. Clean schema (drop all tables and sequences)
  4. Run custom SQL
  5. Verify Flyway migrations
  0. Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ListTables,
    FlywayControl,
    CleanSchema,
    CustomSql,
    VerifyMigrations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Run(MenuAction),
    Quit,
    Invalid(String),
}

pub fn handle(input: &str) -> Effect {
    match input.trim() {
        "1" => Effect::Run(MenuAction::ListTables),
        "2" => Effect::Run(MenuAction::FlywayControl),
        "3" => Effect::Run(MenuAction::CleanSchema),
        "4" => Effect::Run(MenuAction::CustomSql),
        "5" => Effect::Run(MenuAction::VerifyMigrations),
        "0" => Effect::Quit,
        other => Effect::Invalid(other.to_string()),
    }
}

fn perform<P: ConnectionProvider>(
    action: MenuAction,
    admin: &SchemaAdmin<P>,
    config: &OraConfig,
    interrupts: &InterruptSlot,
    input: &mut impl BufRead,
) -> Result<()> {
    match action {
        MenuAction::ListTables => super::tables::tables(admin, false),
        MenuAction::FlywayControl => super::history::history(admin),
        MenuAction::CleanSchema => {
            super::clean::clean(admin, &CleanArgs::default(), interrupts, input)
        }
        MenuAction::CustomSql => super::sql::sql(admin, None, input),
        MenuAction::VerifyMigrations => {
            super::verify::verify(admin, &config.verify.expected_tables)
        }
    }
}

/// Show the menu and serve choices until `0` or end of input.
///
/// A failing action is reported and the menu comes back; it never ends the loop.
pub fn run_menu<P: ConnectionProvider>(
    admin: &SchemaAdmin<P>,
    config: &OraConfig,
    interrupts: &InterruptSlot,
    input: &mut impl BufRead,
) -> Result<()> {
    println!("{MENU}");
    loop {
        print!("\nChoose an option (0-5): ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        match handle(&line) {
            Effect::Run(action) => {
                println!();
                if let Err(e) = perform(action, admin, config, interrupts, input) {
                    eprintln!("Error: {e:#}");
                }
            }
            Effect::Quit => break,
            Effect::Invalid(choice) => {
                println!("Invalid option {choice:?}. Choose a number from 0 to 5.");
                println!("\n{MENU}");
            }
        }
    }
    println!("\nClosing...");
    Ok(())
}
