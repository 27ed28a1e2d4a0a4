mod calendar;
mod display;
mod error;
mod parser;
mod reconcile;
mod report;
mod web;

use calendar::{build_cells, Calendar};
use display::{print_calendar, print_changes, write_calendar_csv, write_counts_csv};
use parser::load_survey;
use reconcile::{reconcile, IdentityPolicy, ReconcileOptions, ReconcilePolicy};
use report::{duplicate_aliases, render_report, slot_counts};

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  doctor-availability <input.csv> [output.csv] [options]");
    eprintln!("  doctor-availability web [port]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --latest-wins          later responses replace earlier ones (default: union)");
    eprintln!("  --by-name              group by surname even when an email column exists");
    eprintln!("  --include-unchanged    report identical resubmissions too");
    eprintln!("  --report <path>        also write the per-doctor slot count CSV");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    // Check if we should run in web mode
    if args.len() > 1 && args[1] == "web" {
        let port = args
            .get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);
        let password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()); // Default password, change this!
        env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

        println!("Starting web server on port {}...", port);
        println!("Admin password: {}", password);
        println!("Access the site at http://localhost:{}", port);

        web::start_server(port, password).await?;
        return Ok(());
    }

    // Batch mode
    let mut input: Option<String> = None;
    let mut output: Option<String> = None;
    let mut report_path: Option<String> = None;
    let mut options = ReconcileOptions::default();
    let mut force_by_name = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--latest-wins" => options.policy = ReconcilePolicy::LatestWins,
            "--by-name" => force_by_name = true,
            "--include-unchanged" => options.include_unchanged = true,
            "--report" => report_path = iter.next().cloned(),
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other if input.is_none() => input = Some(other.to_string()),
            other if output.is_none() => output = Some(other.to_string()),
            other => {
                eprintln!("Unexpected argument: {}", other);
                print_usage();
                std::process::exit(2);
            }
        }
    }

    let input = match input {
        Some(path) => path,
        None => {
            print_usage();
            std::process::exit(2);
        }
    };

    println!("Loading survey responses from CSV...");
    let (responses, detected_identity) = load_survey(&input)?;
    let identity = if force_by_name {
        IdentityPolicy::ByNormalizedName
    } else {
        detected_identity
    };
    println!("Loaded {} responses", responses.len());

    let (entries, changes) = reconcile(responses, identity, options);
    println!("Reconciled into {} doctors", entries.len());

    let cells = build_cells(&entries);
    let counts = slot_counts(&cells);
    let duplicates = duplicate_aliases(&entries);
    let calendar = Calendar::build(cells);

    print_calendar(&calendar);
    print_changes(&changes);
    print!("\n{}", render_report(&counts, &changes, &duplicates));

    if let Some(path) = output {
        write_calendar_csv(&calendar, &path)?;
        println!("Calendario salvato in {}", path);
    }
    if let Some(path) = report_path {
        write_counts_csv(&counts, &path)?;
        println!("Riepilogo turni salvato in {}", path);
    }

    Ok(())
}
