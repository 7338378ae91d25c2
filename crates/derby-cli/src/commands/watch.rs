//! `derby-bundle watch`: write, then rewrite on every change until Ctrl-C.

use derby_bundler::RefreshEvent;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::BundleArgs;
use crate::commands::utils;
use crate::error::Result;
use crate::ui;

pub async fn execute(args: BundleArgs) -> Result<()> {
    let config = utils::load_config(&args, true)?;
    let (app, backend) = utils::app_and_backend(&config);

    let mut refresh = app.subscribe_refresh();
    let reporter = tokio::spawn(async move {
        loop {
            match refresh.recv().await {
                Ok(RefreshEvent::ScriptsUpdated { script_url, .. }) => {
                    println!("{script_url}");
                }
                Err(RecvError::Lagged(skipped)) => {
                    ui::warning(&format!("missed {skipped} rebuild notifications"));
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    ui::info(&format!(
        "Watching {} (Ctrl-C to stop)",
        config.app.filename.display()
    ));

    let result = tokio::select! {
        result = app.watch(&backend, &args.dir, &config.bundle) => result,
        _ = tokio::signal::ctrl_c() => {
            app.stop_watching();
            Ok(())
        }
    };
    reporter.abort();

    result?;
    if let Some(artifact) = app.artifact() {
        ui::success(&format!("Last bundle: {}", artifact.script_url));
    }
    Ok(())
}
