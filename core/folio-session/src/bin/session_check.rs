//! Debug utility for inspecting session store health in local environments.

use folio_session::{SessionStore, StorePaths};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let paths = StorePaths::default();
    let store = SessionStore::new(paths.clone());

    println!("═══════════════════════════════════════════════════════════");
    println!("  Folio Session Check");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    println!("Store root: {}", paths.root().display());
    println!("Session file: {}", paths.session_file().display());
    println!("Expired flag: {}", paths.expired_flag_file().display());
    println!();

    println!("── Persisted Session ─────────────────────────────────────");
    match (store.read_credential(), store.read_principal()) {
        (Some(credential), Some(principal)) => {
            println!(
                "  ✓ LOGGED IN as {} (credential {}…)",
                principal,
                credential_preview(&credential)
            );
        }
        _ => println!("  ⚫ no session persisted"),
    }
    println!();

    println!("── Expired Flag ──────────────────────────────────────────");
    if store.read_flag() {
        println!("  ⚠ set (an expired notice is pending)");
    } else {
        println!("  (not set)");
    }
    println!();

    println!("═══════════════════════════════════════════════════════════");
}

/// First few characters of the credential, safe for tokens containing
/// multi-byte characters.
fn credential_preview(credential: &str) -> String {
    credential.chars().take(8).collect()
}
