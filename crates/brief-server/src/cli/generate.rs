use anyhow::Result;
use tracing::info;

use crate::cli::GenerateArgs;
use crate::config::BriefConfig;

pub async fn run(args: GenerateArgs, config: &BriefConfig) -> Result<()> {
    let store = config.open_store()?;
    let generator = config.generator(store)?;

    if let Some(dispatch) = generator.dispatch() {
        info!("Generating via {}", dispatch);
    }

    let brief = generator.generate(&args.urls).await.map_err(|e| {
        if let Some(violations) = e.violations() {
            for v in violations {
                eprintln!("  - {}", v);
            }
        }
        anyhow::anyhow!("{} ({})", e, e.kind())
    })?;

    println!("{}", serde_json::to_string_pretty(&brief)?);
    Ok(())
}
