//! `derby-bundle write`: one bundle-and-write.

use crate::cli::BundleArgs;
use crate::commands::utils;
use crate::error::Result;
use crate::ui;

pub async fn execute(args: BundleArgs) -> Result<()> {
    let config = utils::load_config(&args, false)?;
    let (app, backend) = utils::app_and_backend(&config);

    ui::info(&format!("Bundling {}", config.app.filename.display()));
    let artifact = app.write_scripts(&backend, &args.dir, &config.bundle).await?;

    ui::success(&format!("Wrote {}", artifact.script_filename.display()));
    if let Some(map) = &artifact.script_map_filename {
        ui::success(&format!("Wrote {}", map.display()));
    }
    println!("{}", artifact.script_url);
    println!("{}", artifact.script_hash);
    Ok(())
}
