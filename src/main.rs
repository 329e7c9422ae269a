use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::Path;

// Use library instead of local modules
use recipe_share::entities::ingredient::import_ingredients_csv;
use recipe_share::entities::tag::load_tags_json;
use recipe_share::entities::user::find_user_by_email;
use recipe_share::{export_pdf, export_text, init_logging, open_database, shopping_list_for_user, Config};

const USAGE: &str = "Usage:
  recipe-share init
  recipe-share import-ingredients <file.csv>
  recipe-share load-tags <file.json>
  recipe-share export <email> <output> [--text]";

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let config = Config::load()?;

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(&config),
        Some("import-ingredients") => run_import_ingredients(&config, arg(&args, 2)?),
        Some("load-tags") => run_load_tags(&config, arg(&args, 2)?),
        Some("export") => {
            let as_text = args.iter().any(|a| a == "--text");
            run_export(&config, arg(&args, 2)?, arg(&args, 3)?, as_text)
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}

fn arg(args: &[String], index: usize) -> Result<&str> {
    match args.get(index) {
        Some(value) if !value.starts_with("--") => Ok(value.as_str()),
        _ => bail!("Missing argument\n{USAGE}"),
    }
}

fn run_init(config: &Config) -> Result<()> {
    println!("🔧 Setting up database...");
    open_database(&config.database_path)?;
    println!("✓ Database initialized at {}", config.database_path.display());
    Ok(())
}

fn run_import_ingredients(config: &Config, csv_path: &str) -> Result<()> {
    let conn = open_database(&config.database_path)?;

    println!("📂 Loading ingredients from {csv_path}...");
    let inserted = import_ingredients_csv(&conn, Path::new(csv_path))?;
    println!("✓ Inserted {inserted} ingredients");

    Ok(())
}

fn run_load_tags(config: &Config, json_path: &str) -> Result<()> {
    let conn = open_database(&config.database_path)?;

    println!("📂 Loading tags from {json_path}...");
    let inserted = load_tags_json(&conn, Path::new(json_path))?;
    println!("✓ Done. Inserted {inserted} tags");

    Ok(())
}

fn run_export(config: &Config, email: &str, output: &str, as_text: bool) -> Result<()> {
    let conn = open_database(&config.database_path)?;

    let user = find_user_by_email(&conn, email)?;
    let lines = shopping_list_for_user(&conn, user.id)?;
    let document = if as_text {
        export_text(&lines)?
    } else {
        export_pdf(&lines)?
    };

    fs::write(output, &document).with_context(|| format!("Failed to write {output}"))?;
    println!("🛒 Wrote {} ingredients ({} bytes) to {output}", lines.len(), document.len());

    Ok(())
}
