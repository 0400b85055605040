//! Demo of a remote-backed table over a synthetic customer directory.
//!
//! Logs go to `tabula.log`; pass `--verbose` for debug output.

use std::fs::File;
use std::sync::Arc;
use std::sync::Mutex;

use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};
use tabula_lib::column::DialogConfig;
use tabula_lib::dialog::DialogState;
use tabula_lib::error::{FetchError, TableError};
use tabula_lib::model::{Record, Value};
use tabula_lib::page::CellContent;
use tabula_lib::source::{FetchRequest, PageResult, fetch_fn};
use tabula_lib::{Column, TableEngine};

type Directory = Arc<Mutex<Vec<Record>>>;

fn directory(n: u64) -> Directory {
    let cities = ["Lisbon", "Oslo", "Quito", "Hanoi"];
    let rows = (1..=n)
        .map(|id| {
            Record::new(id)
                .set("name", format!("Customer {id:02}"))
                .set("address", Value::map([("city", cities[id as usize % cities.len()])]))
        })
        .collect();
    Arc::new(Mutex::new(rows))
}

/// Serves one page, filtering on a case-insensitive `name` substring.
fn serve(rows: &[Record], request: &FetchRequest) -> PageResult {
    let needle = request
        .filters
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_lowercase);
    let matching: Vec<&Record> = rows
        .iter()
        .filter(|row| match &needle {
            Some(needle) => row
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .collect();
    let page = matching
        .iter()
        .skip(request.offset())
        .take(request.page_size)
        .map(|row| (*row).clone())
        .collect();
    PageResult::new(page, matching.len())
}

fn print_page(title: &str, engine: &TableEngine) {
    println!("== {title}");
    let Some(page) = engine.page() else {
        println!("(no page)");
        return;
    };
    let header: Vec<&str> = engine.schema().columns().iter().map(|c| c.label.as_str()).collect();
    println!("{}", header.join(" | "));
    let rows = page.rows_with_parity().zip(page.cells(engine.schema()));
    for ((_, odd), cells) in rows {
        let cells: Vec<String> = cells
            .into_iter()
            .map(|cell| match cell.content {
                CellContent::Text(text) => text,
                CellContent::Link { text, .. } => format!("[{text}]"),
                CellContent::Icon { name } => format!("<{name}>"),
                CellContent::Placeholder(_) => "-".to_string(),
            })
            .collect();
        println!("{}{}", if odd { "  " } else { "" }, cells.join(" | "));
    }
    match page.footer() {
        Some(footer) => println!(
            "Showing {} to {} of {} rows",
            footer.showing_from, footer.showing_to, footer.total_rows
        ),
        None => println!("No rows"),
    }
    let nav = engine.navigator();
    println!(
        "first={} previous={} next={} last={}",
        nav.first, nav.previous, nav.next, nav.last
    );
}

async fn run(directory: Directory) -> Result<(), TableError> {
    let dialog = Arc::new(DialogState::new());
    let backend = directory.clone();
    let engine = TableEngine::builder()
        .columns(vec![
            Column::text("name", "Name").with_target("/customers/detail"),
            Column::text("address.city", "City"),
            Column::icon("delete", "", "trash").with_dialog(DialogConfig::new(
                serde_json::json!({ "title": "Delete customer" }),
            )),
        ])
        .fetcher(fetch_fn(move |request: FetchRequest| {
            let backend = backend.clone();
            async move {
                let rows = backend.lock().unwrap_or_else(|e| e.into_inner());
                Ok::<_, FetchError>(serve(&rows, &request))
            }
        }))
        .dialog(dialog.clone())
        .filters(["name"])
        .build()?;

    engine.start().await?;
    print_page("First page", &engine);

    engine.go_last().await?;
    print_page("Last page", &engine);

    let sizes: Vec<String> = engine
        .config()
        .page_size_options()
        .iter()
        .map(usize::to_string)
        .collect();
    println!("Page sizes: {}", sizes.join(", "));
    engine.set_page_size(20).await?;
    print_page("Page size 20", &engine);

    engine.set_filter("name", "customer 1").await?;
    print_page("Filtered by name", &engine);

    // Delete the first row shown through the confirmation dialog.
    if let Some(row) = engine.page().and_then(|page| page.rows().first().cloned()) {
        engine.activate("delete", &row);
        directory
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|r| r.id() != row.id());
        info!("Deleted customer {}", row.id());
        dialog.set_confirmed(true);
        dialog.hide();
        engine.poll_dialog().await?;
        print_page("After delete", &engine);
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let level = if std::env::args().any(|arg| arg == "--verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    match File::create("tabula.log") {
        Ok(file) => {
            if let Err(e) = WriteLogger::init(level, Config::default(), file) {
                eprintln!("Failed to initialize logger: {}", e);
            }
        }
        Err(e) => eprintln!("Failed to create log file: {}", e),
    }

    if let Err(e) = run(directory(45)).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
