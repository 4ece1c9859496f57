use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use crate::config::CmsConfig;
use crate::error::Result;
use crate::models::user::UserForm;
use crate::security::auth::hash_password;
use crate::store::Store;

/// Critical template files; the server cannot function without these
const CRITICAL_TEMPLATES: &[&str] = &[
    "website/templates/admin/shell.html.tera",
    "website/templates/admin/login.html.tera",
    "website/templates/site/base.html.tera",
    "website/templates/site/page.html.tera",
];

/// Critical static assets
const CRITICAL_STATIC: &[&str] = &["website/static/css/admin.css", "website/static/js/admin.js"];

/// Run all boot checks. Call this before Rocket launches.
/// Creates missing directories, warns about missing files, and
/// aborts if critical dependencies are absent.
pub fn run(config: &CmsConfig) {
    info!("flatcms boot check starting...");

    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Directories ─────────────────────────────────
    let required: Vec<PathBuf> = vec![
        config.data_dir.clone(),
        config.data_dir.join("drafts"),
        config.uploads_dir.clone(),
        config.blocks_dir.clone(),
        PathBuf::from("website/static/css"),
        PathBuf::from("website/static/js"),
        PathBuf::from("website/templates/admin/modules"),
        PathBuf::from("website/templates/site"),
    ];
    for dir in &required {
        if !dir.exists() {
            match fs::create_dir_all(dir) {
                Ok(_) => info!("  Created directory: {}", dir.display()),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir.display(), e);
                    errors += 1;
                }
            }
        }
    }

    // ── 2. Critical templates ──────────────────────────
    for file in CRITICAL_TEMPLATES {
        if !Path::new(file).exists() {
            error!("  MISSING critical template: {}", file);
            errors += 1;
        }
    }

    // ── 3. Critical static assets ──────────────────────
    for file in CRITICAL_STATIC {
        if !Path::new(file).exists() {
            warn!("  Missing static asset: {} (admin UI will not work)", file);
            warnings += 1;
        }
    }

    // ── 4. Data and uploads directories writable ───────
    for (dir, critical) in [(&config.data_dir, true), (&config.uploads_dir, false)] {
        if !dir.exists() {
            continue;
        }
        let test_file = dir.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) if critical => {
                error!("  Data directory {} not writable: {}", dir.display(), e);
                errors += 1;
            }
            Err(e) => {
                warn!("  Uploads directory {} not writable: {} (uploads will fail)", dir.display(), e);
                warnings += 1;
            }
        }
    }

    // ── 5. Builder blocks present ──────────────────────
    let has_blocks = fs::read_dir(&config.blocks_dir)
        .map(|entries| entries.flatten().any(|e| e.path().join("block.toml").exists()))
        .unwrap_or(false);
    if !has_blocks {
        warn!("  No blocks in {} (the page builder will be empty)", config.blocks_dir.display());
        warnings += 1;
    }

    // ── 6. Rocket.toml exists ──────────────────────────
    if !Path::new("Rocket.toml").exists() {
        warn!("  Rocket.toml not found, using default config");
        warnings += 1;
    }

    // ── Summary ─────────────────────────────────────────
    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some features may not work correctly.",
            warnings
        );
    } else {
        info!("Boot check passed. All systems go.");
    }
}

/// Create the first admin account when `users.json` is empty.
/// Returns whether an account was created.
pub fn ensure_admin(store: &dyn Store, config: &CmsConfig) -> Result<bool> {
    if store.user_count() > 0 {
        return Ok(false);
    }
    let form = UserForm {
        username: "admin".to_string(),
        email: "admin@localhost".to_string(),
        display_name: "Administrator".to_string(),
        role: "admin".to_string(),
        status: "active".to_string(),
        password: None,
    };
    let hash = hash_password(&config.initial_admin_password)?;
    store.user_create(&form, &hash)?;
    warn!(
        "Created initial admin account 'admin' from the configured initial password. Change it after first login."
    );
    Ok(true)
}
