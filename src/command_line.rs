use crate::catalog::{LoadReport, Session, TABLES};
use crate::config::Settings;
use anyhow::{anyhow, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::error;

/// Runs the operator console over a catalog session.
///
/// This function enters a loop that prompts for commands and executes them.
/// The supported commands are:
/// - info: Print the table layout
/// - connect: Open the session (bundle and credentials from settings or prompted)
/// - create_tables: Create the catalog tables if missing
/// - initialize: Prepare the statements
/// - load_items: Bulk-load an items corpus
/// - load_reviews: Bulk-load a reviews corpus
/// - item: Print one item
/// - user_reviews: Print a reviewer's reviews, newest first
/// - item_reviews: Print a product's reviews, newest first
/// - close: Close the session
/// - exit: Exit the program
///
/// Command failures are reported and the loop continues; only console I/O
/// errors end it.
pub async fn run(session: &mut Session, settings: &Settings) -> Result<()> {
    loop {
        let Some(command) = prompt_line(
            "Enter command (info/connect/create_tables/initialize/load_items/load_reviews/item/user_reviews/item_reviews/close/exit)",
            None,
        )?
        else {
            break;
        };
        let outcome: Result<()> = match command.as_str() {
            "info" => {
                print_info(session);
                Ok(())
            }
            "connect" => connect(session, settings).await,
            "create_tables" => session.create_tables().await.map_err(Into::into),
            "initialize" => session.initialize().await.map_err(Into::into),
            "load_items" => load_items(session).await,
            "load_reviews" => load_reviews(session).await,
            "item" => print_item(session).await,
            "user_reviews" => print_user_reviews(session).await,
            "item_reviews" => print_item_reviews(session).await,
            "close" => session.close().await.map_err(Into::into),
            "exit" => break,
            "" => Ok(()),
            _ => {
                println!("Unknown command. Please try again.");
                Ok(())
            }
        };
        if let Err(e) = outcome {
            error!("{command} failed: {e:#}");
        }
    }
    Ok(())
}

/// Prints the keyspace and the layout of every catalog table.
fn print_info(session: &Session) {
    println!("\n--- Catalog Information ---");
    match session.keyspace() {
        Some(keyspace) => println!("Keyspace: {keyspace}"),
        None => println!("Keyspace: <not connected>"),
    }
    for table in TABLES {
        println!("{}", table.describe());
    }
    println!("---------------------------\n");
}

/// Connects with the configured bundle and credentials, prompting for any
/// that are missing.
async fn connect(session: &mut Session, settings: &Settings) -> Result<()> {
    let bundle = match &settings.bundle {
        Some(path) => path.clone(),
        None => PathBuf::from(prompt("Enter bundle path", Some("bundle.json"))?),
    };
    let username = match settings.credentials.username() {
        "" => prompt("Enter username", None)?,
        username => username.to_string(),
    };
    let password = match settings.credentials.password() {
        "" => prompt("Enter password", None)?,
        password => password.to_string(),
    };
    session
        .connect(&bundle, &username, &password, &settings.keyspace)
        .await?;
    Ok(())
}

async fn load_items(session: &Session) -> Result<()> {
    let path = prompt("Enter items file", Some("meta_Books.json"))?;
    let report = session.load_items(&path).await?;
    print_report("items", &report);
    Ok(())
}

async fn load_reviews(session: &Session) -> Result<()> {
    let path = prompt("Enter reviews file", Some("reviews_Books.json"))?;
    let report = session.load_reviews(&path).await?;
    print_report("reviews", &report);
    Ok(())
}

fn print_report(what: &str, report: &LoadReport) {
    println!(
        "Loaded {what}: {} submitted, {} written, {} failed{}",
        report.submitted,
        report.written,
        report.failed,
        if report.timed_out { " (timed out)" } else { "" }
    );
}

async fn print_item(session: &Session) -> Result<()> {
    let asin = prompt_required("Enter asin", Some("B000GFK7L6"))?;
    print!("{}", line_terminated(session.item(&asin).await?));
    Ok(())
}

/// Item blocks end with a newline; the `not exists` marker does not.
fn line_terminated(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

async fn print_user_reviews(session: &Session) -> Result<()> {
    let reviewer_id = prompt_required("Enter reviewerID", Some("A2E2F6NKVKB4ZT"))?;
    session
        .user_reviews(&reviewer_id)
        .await?
        .iter()
        .for_each(|line| print!("{line}"));
    Ok(())
}

async fn print_item_reviews(session: &Session) -> Result<()> {
    let asin = prompt_required("Enter asin", Some("B000GFK7L6"))?;
    session
        .item_reviews(&asin)
        .await?
        .iter()
        .for_each(|line| print!("{line}"));
    Ok(())
}

/// Prompts the user for input and returns the entered string, or `None` once
/// stdin is exhausted.
///
/// # Arguments
///
/// * `message` - The message to display to the user
/// * `example` - An optional example value shown next to the message
fn prompt_line(message: &str, example: Option<&str>) -> Result<Option<String>> {
    let full_message = if let Some(ex) = example {
        format!("{} (e.g., {}): ", message, ex)
    } else {
        format!("{}: ", message)
    };
    print!("{}", full_message);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn prompt(message: &str, example: Option<&str>) -> Result<String> {
    prompt_line(message, example)?.ok_or_else(|| anyhow!("end of input"))
}

fn prompt_required(message: &str, example: Option<&str>) -> Result<String> {
    let input = prompt(message, example)?;
    if input.is_empty() {
        return Err(anyhow!("a value is required"));
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NOT_EXISTS;

    #[test]
    fn test_item_output_ends_with_one_newline() {
        assert_eq!(line_terminated(NOT_EXISTS.to_string()), "not exists\n");
        let block = "asin: B001\ntitle: T\nimage: na\ncategories: [na]\ndescription: na\n";
        assert_eq!(line_terminated(block.to_string()), block);
    }
}
