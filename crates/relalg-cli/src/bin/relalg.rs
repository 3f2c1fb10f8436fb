//! relalg CLI
//!
//! Evaluate a relational-algebra query and walk through its steps.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use relalg::Step;
use relalg_cli::render::{self, HighlightStyle};
use relalg_cli::{Catalog, Database};

#[derive(Clone, Copy, ValueEnum)]
enum GraphMode {
    /// The shown step and its direct operands
    Operation,
    /// Every step of the query
    Execution,
}

#[derive(Parser)]
#[command(name = "relalg")]
#[command(about = "Step-by-step relational algebra interpreter")]
#[command(after_help = "\
EXAMPLES:
    # Run a query against the built-in University database
    relalg 'π[name](σ[age>25](Students))'

    # Load a database file and run its third example
    relalg --database library.json --example 3

    # Show only step 2, with a Mermaid diagram of where its inputs come from
    relalg --step 2 --graph operation 'Students ⋈_{id=student_id} Enrollments'

SYNTAX:
    π[a, b](R)        projection
    σ[attr>value](R)  selection (>=, <=, >, <, =, !=)
    L ∪ R             union
    L ⋈_{x=y} R       equi-join
")]
struct Args {
    /// Query to evaluate
    query: Option<String>,

    /// Database JSON files to load; the last one loaded is used
    #[arg(short, long)]
    database: Vec<PathBuf>,

    /// Name of the loaded database to query
    #[arg(long = "use", value_name = "NAME")]
    use_database: Option<String>,

    /// Run the database's N-th example query (1-based)
    #[arg(short, long, value_name = "N", conflicts_with = "query")]
    example: Option<usize>,

    /// Show only step N (1-based)
    #[arg(short, long, value_name = "N")]
    step: Option<usize>,

    /// Print a Mermaid diagram for the shown step
    #[arg(long, value_enum)]
    graph: Option<GraphMode>,

    /// Print the trace as JSON
    #[arg(long)]
    json: bool,

    /// Print the parsed expression tree
    #[arg(long)]
    tree: bool,

    /// List databases, tables and example queries
    #[arg(long)]
    list: bool,

    /// Print the ER diagram of the database
    #[arg(long)]
    schema: bool,

    /// Write the database as JSON into this directory
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut catalog = Catalog::new();
    for path in &args.database {
        let db = Database::load(path)
            .with_context(|| format!("loading database {}", path.display()))?;
        catalog.add(db);
    }
    if let Some(name) = &args.use_database {
        catalog.switch_to(name)?;
    }
    let db = catalog.current();
    log::info!("using database {:?}", db.name);

    if args.list {
        print_listing(&catalog);
    }
    if args.schema {
        println!("{}", db.schema());
    }
    if let Some(dir) = &args.export {
        let path = db.export_to(dir)?;
        println!("Exported {} to {}", db.name, path.display());
    }

    let query = match (&args.query, args.example) {
        (Some(query), _) => query.clone(),
        (None, Some(n)) => n
            .checked_sub(1)
            .and_then(|i| db.examples.get(i))
            .cloned()
            .with_context(|| {
                format!("{} has {} example queries", db.name, db.examples.len())
            })?,
        (None, None) if args.list || args.schema || args.export.is_some() => return Ok(()),
        (None, None) => bail!("no query given (pass a query, --example N or --list)"),
    };

    let expr = relalg::compile(&query)?;
    if args.tree {
        print!("{}", relalg::advanced::outline(&expr));
    }
    let steps = relalg::run_compiled(&expr, db)?;

    let shown = match args.step {
        Some(n) if (1..=steps.len()).contains(&n) => n - 1..n,
        Some(n) => bail!("step {n} out of range, the query has {} steps", steps.len()),
        None => 0..steps.len(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&steps[shown])?);
        return Ok(());
    }

    let style = if std::io::stdout().is_terminal() {
        HighlightStyle::Ansi
    } else {
        HighlightStyle::Brackets
    };
    for index in shown.clone() {
        print_step(&query, &steps, index, style);
    }

    if let Some(mode) = args.graph {
        let current = shown.end - 1;
        let diagram = match mode {
            GraphMode::Operation => render::step_graph(&steps, current),
            GraphMode::Execution => Some(render::execution_graph(&steps, current)),
        };
        if let Some(diagram) = diagram {
            println!("{diagram}");
        }
    }

    Ok(())
}

fn print_step(query: &str, steps: &[Step], index: usize, style: HighlightStyle) {
    let step = &steps[index];
    println!(
        "Step {} of {}: {}",
        index + 1,
        steps.len(),
        step.description
    );
    println!("  {}", render::highlight(query, step.span, style));
    println!("{}", render::table(&step.data));
}

fn print_listing(catalog: &Catalog) {
    let current = &catalog.current().name;
    for db in catalog.databases() {
        let marker = if &db.name == current { "*" } else { " " };
        println!("{marker} {}", db.name);
        if let Some(description) = &db.description {
            println!("    {description}");
        }
        for (name, relation) in &db.tables {
            println!("    {name} ({} rows)", relation.len());
        }
        for (i, example) in db.examples.iter().enumerate() {
            println!("    [{}] {example}", i + 1);
        }
    }
}
