use anyhow::{Context, Result};
use brief_core::{validate_brief, Validation};

use crate::cli::ValidateArgs;

pub fn run(args: ValidateArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.file.display()))?;

    match validate_brief(&value) {
        Validation::Valid(brief) => {
            println!(
                "✅ {} is a valid brief: {} key points, {} conflicts, {} items to verify, {} sources.",
                args.file.display(),
                brief.key_points.len(),
                brief.conflicts.len(),
                brief.what_to_verify.len(),
                brief.sources.len()
            );
            Ok(())
        }
        Validation::Invalid(violations) => {
            println!("❌ Validation errors in {}:", args.file.display());
            for v in &violations {
                println!("  - {}", v);
            }
            anyhow::bail!("{} violation(s)", violations.len())
        }
    }
}
