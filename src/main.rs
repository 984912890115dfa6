//! # recipe-dedup CLI
//!
//! Command-line interface for the recipe duplicate detector.
//!
//! ## Usage
//! ```bash
//! recipe-dedup check upload.jpg --name Margarita -i "Tequila:2:oz"
//! RUST_LOG=recipe_dedup=debug recipe-dedup check upload.jpg --output json
//! ```

mod cli;

use recipe_dedup::Result;

fn main() -> Result<()> {
    recipe_dedup::init_tracing();
    cli::run()
}
