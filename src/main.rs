mod console;
mod menus;
mod table;
mod terminal;

use chrono::Local;
use clinic_core::CoreConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use console::Console;
use terminal::EditorTerminal;

/// Main entry point for the interactive clinic console
///
/// Resolves configuration once, prompts for a login and runs the menu of the
/// authenticated user's role until they log out.
///
/// # Environment Variables
/// - `CLINIC_DATA_DIR`: Directory holding the collection files (default: "data")
/// - `CLINIC_BILLING_MODE`: `deferred` (default) or `consulted-only`
/// - `CLINIC_LOW_STOCK_LIMIT`: Pharmacist low-stock alert threshold (default: 5)
/// - `RUST_LOG`: Log filter; logs go to stderr
///
/// # Returns
/// * `Ok(())` - When the operator logs out or closes input
/// * `Err(anyhow::Error)` - If configuration or the terminal cannot be set up
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("clinic=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = Arc::new(CoreConfig::resolve(|key| std::env::var(key).ok())?);
    tracing::info!("++ Starting clinic console on {}", cfg.data_dir().display());

    let mut console = Console::new(EditorTerminal::new()?, cfg, Local::now().date_naive());
    console.run();

    Ok(())
}
