//! # CLI Module
//!
//! Command-line interface for the recipe duplicate detector.
//!
//! ## Usage
//! ```bash
//! # Hash a photo
//! recipe-dedup hash margarita.jpg
//!
//! # Register a recipe in the local signature database
//! recipe-dedup add margarita.jpg --name Margarita -i "Tequila:2:oz" -i "Lime Juice:1:oz"
//!
//! # Check a new upload
//! recipe-dedup check upload.jpg --name Margarita -i "Lime Juice:1:oz" -i "Tequila:2:oz"
//!
//! # JSON output
//! recipe-dedup check upload.jpg --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use recipe_dedup::core::aggregator::DuplicateCheckResult;
use recipe_dedup::core::detector::{DetectorConfig, DuplicateDetector};
use recipe_dedup::core::fingerprint::{FingerprintBuilder, IngredientLine};
use recipe_dedup::core::hasher::{ImageHashes, PerceptualHasher};
use recipe_dedup::core::matcher::MatchType;
use recipe_dedup::core::store::{RecipeSignature, SqliteSignatureStore};
use recipe_dedup::error::{HashError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recipe Dedup - Catch duplicate recipes before they are saved
#[derive(Parser, Debug)]
#[command(name = "recipe-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the content and perceptual hash of an image
    Hash {
        /// Image file
        image: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Print the fingerprint of a recipe
    Fingerprint {
        /// Recipe name
        #[arg(short, long)]
        name: String,

        /// Ingredient as NAME[:AMOUNT[:UNIT]] (repeatable)
        #[arg(short, long = "ingredient")]
        ingredients: Vec<IngredientLine>,
    },

    /// Register a recipe's signature in the database
    Add {
        /// Recipe image
        image: PathBuf,

        /// Recipe name
        #[arg(short, long)]
        name: String,

        /// Ingredient as NAME[:AMOUNT[:UNIT]] (repeatable)
        #[arg(short, long = "ingredient")]
        ingredients: Vec<IngredientLine>,

        /// Recipe id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Signature database path
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Check an image (and optionally a recipe) for duplicates
    Check {
        /// Image to check
        image: PathBuf,

        /// Recipe name
        #[arg(short, long)]
        name: Option<String>,

        /// Ingredient as NAME[:AMOUNT[:UNIT]] (repeatable)
        #[arg(short, long = "ingredient")]
        ingredients: Vec<IngredientLine>,

        /// Recipe id to ignore (the recipe being edited)
        #[arg(long)]
        exclude: Option<String>,

        /// Similarity threshold (lower = stricter, 0-64)
        #[arg(short, long, default_value = "10")]
        threshold: u32,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Signature database path
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Hash { image, output } => run_hash(&image, output),
        Commands::Fingerprint { name, ingredients } => run_fingerprint(&name, &ingredients),
        Commands::Add {
            image,
            name,
            ingredients,
            id,
            db,
        } => run_add(&image, &name, &ingredients, id, db),
        Commands::Check {
            image,
            name,
            ingredients,
            exclude,
            threshold,
            output,
            db,
        } => run_check(&image, name, &ingredients, exclude, threshold, output, db),
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recipe-dedup")
        .join("recipes.db")
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| {
        HashError::IoError {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

fn open_detector(
    db: Option<PathBuf>,
    config: DetectorConfig,
) -> Result<(Arc<SqliteSignatureStore>, DuplicateDetector)> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store = Arc::new(SqliteSignatureStore::open(&db_path)?);
    let detector = DuplicateDetector::builder(store.clone()).config(config).build()?;
    Ok((store, detector))
}

fn run_hash(image: &Path, output: OutputFormat) -> Result<()> {
    let bytes = read_image(image)?;
    let hashes = ImageHashes::from_image_data(&bytes, &PerceptualHasher::new())?;

    match output {
        OutputFormat::Pretty => {
            let term = Term::stdout();
            term.write_line(&format!("{}", style(image.display()).bold())).ok();
            term.write_line(&format!("  content:    {}", style(&hashes.content_hash).cyan()))
                .ok();
            term.write_line(&format!("  perceptual: {}", style(&hashes.perceptual_hash).cyan()))
                .ok();
        }
        OutputFormat::Json => println!("{:#}", serde_json::json!(hashes)),
    }

    Ok(())
}

fn run_fingerprint(name: &str, ingredients: &[IngredientLine]) -> Result<()> {
    println!("{}", FingerprintBuilder::new().fingerprint(name, ingredients));
    Ok(())
}

fn run_add(
    image: &Path,
    name: &str,
    ingredients: &[IngredientLine],
    id: Option<String>,
    db: Option<PathBuf>,
) -> Result<()> {
    let term = Term::stderr();
    let bytes = read_image(image)?;
    let (store, detector) = open_detector(db, DetectorConfig::default())?;

    let id = id.unwrap_or_else(RecipeSignature::generate_id);
    let hashes = detector.compute_hashes(&bytes)?;

    // Advisory: report, then save regardless
    let check = detector.check_for_duplicates(
        &bytes,
        Some(name),
        Some(ingredients),
        Some(&id),
        Some(&hashes),
    )?;
    if check.is_duplicate {
        print_pretty_results(&term, &check);
    }

    let recipe = detector.compute_recipe_hashes(&bytes, name, ingredients, Some(&hashes))?;
    let signature = RecipeSignature::new(id.clone(), name)
        .content_hash(recipe.content_hash)
        .perceptual_hash(recipe.perceptual_hash)
        .fingerprint(recipe.recipe_fingerprint);
    store.upsert(&signature)?;

    term.write_line(&format!(
        "{} Saved {} as {}",
        style("✓").green().bold(),
        style(name).cyan(),
        style(&id).dim()
    ))
    .ok();

    Ok(())
}

fn run_check(
    image: &Path,
    name: Option<String>,
    ingredients: &[IngredientLine],
    exclude: Option<String>,
    threshold: u32,
    output: OutputFormat,
    db: Option<PathBuf>,
) -> Result<()> {
    let bytes = read_image(image)?;
    let config = DetectorConfig::builder().similarity_threshold(threshold).build()?;
    let (_store, detector) = open_detector(db, config)?;

    let ingredients = (!ingredients.is_empty()).then_some(ingredients);
    let result = detector.check_for_duplicates(
        &bytes,
        name.as_deref(),
        ingredients,
        exclude.as_deref(),
        None,
    )?;

    match output {
        OutputFormat::Pretty => print_pretty_results(&Term::stdout(), &result),
        OutputFormat::Json => print_json_results(&result),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, result: &DuplicateCheckResult) {
    if !result.is_duplicate {
        term.write_line(&format!("{} No duplicates found", style("✓").green().bold()))
            .ok();
        return;
    }

    term.write_line(&format!(
        "{} {} possible duplicate(s)",
        style("!").yellow().bold(),
        style(result.matches.len()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    for m in &result.matches {
        let label = match m.match_type {
            MatchType::ExactImage => style(m.match_type.to_string()).red(),
            MatchType::SimilarImage => style(m.match_type.to_string()).yellow(),
            MatchType::SameRecipe => style(m.match_type.to_string()).magenta(),
        };
        term.write_line(&format!(
            "  {} {} ({:.0}%)",
            label,
            style(&m.recipe_name).bold(),
            m.confidence * 100.0
        ))
        .ok();
        term.write_line(&format!("    {} {}", style(&m.recipe_id).dim(), style(&m.details).dim()))
            .ok();
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "{}",
        style("Duplicates are advisory. Nothing was blocked or deleted.").dim()
    ))
    .ok();
}

fn print_json_results(result: &DuplicateCheckResult) {
    let output = serde_json::json!({
        "is_duplicate": result.is_duplicate,
        "best_match": result.best_match(),
        "matches": result.matches,
    });

    println!("{:#}", output);
}
