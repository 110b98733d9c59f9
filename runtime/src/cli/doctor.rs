//! Environment readiness check.

use crate::config::ExplorerConfig;
use crate::keywords::KeywordMap;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Check Chromium availability, the keyword map, the diagnostics directory
/// and the recognition service settings.
pub async fn run(config: &ExplorerConfig) -> Result<()> {
    println!("Scout Doctor");
    println!("============");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let chromium = find_chromium(config.chromium_path.as_deref());
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!("[!!] Chromium NOT found. Set SCOUT_CHROMIUM_PATH or install Chrome."),
    }

    match KeywordMap::load(config.keywords_file.as_deref()) {
        Ok(map) => println!("[OK] Keyword map v{} loaded", map.version),
        Err(e) => println!("[!!] {e}"),
    }

    let dir = &config.diagnostics_dir;
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => println!("[OK] Diagnostics directory: {}", dir.display()),
        Err(e) => println!("[!!] Diagnostics directory {} unusable: {e}", dir.display()),
    }

    let rec = &config.recognition;
    if rec.is_configured() {
        println!("[OK] Recognition service: {} at {}", rec.model, rec.base_url);
    } else {
        println!("[--] Recognition service not configured; assisted login uses built-in tables");
    }

    println!();
    if chromium.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}
