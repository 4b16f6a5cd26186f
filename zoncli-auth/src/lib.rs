//! OAuth credential lifecycle for the Zon storefront.
//!
//! Interactive logins run the authorization-code flow against a short-lived
//! local callback listener; afterwards the token manager keeps the credential
//! alive with proactive refreshes, persisting it between runs.

mod credential;
mod error;
pub mod listener;
mod manager;
mod settings;
mod state;
mod storage;

pub use credential::{is_expired, Credential, REFRESH_BUFFER};
pub use error::AuthError;
pub use listener::{CallbackListener, CallbackOutcome, CALLBACK_PATH, DEFAULT_CALLBACK_PORT};
pub use manager::TokenManager;
pub use settings::{RateLimitSettings, Settings};
pub use state::generate_state;
pub use storage::CredentialStore;

use std::sync::Arc;
use std::time::Duration;

/// How long an interactive login waits for the browser callback.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

/// Ensure a usable credential before the CLI runs a command.
///
/// Loads the persisted credential and refreshes it silently when possible;
/// otherwise walks the user through the browser login. Returns the manager
/// so command handlers can keep calling [`TokenManager::refresh_if_needed`].
pub async fn authenticate(
    api: Arc<zon_api::Client>,
    settings: Settings,
) -> Result<TokenManager, AuthError> {
    let store = CredentialStore::new()?;
    let manager = TokenManager::new(api, settings, store)?;

    if manager.current().await.is_some() {
        match manager.refresh_if_needed().await {
            Ok(_) => return Ok(manager),
            Err(e) => {
                eprintln!("Stored credential could not be refreshed: {e}");
                // Fall through to the interactive flow; refresh_if_needed
                // already dropped the credential if it was revoked.
            }
        }
    }

    println!("\n=== Zon sign-in required ===\n");
    println!("Your browser will open to authorize zoncli.");
    println!("Press Enter to continue, or Ctrl+C to cancel...");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    manager.login(LOGIN_TIMEOUT).await?;
    println!("✓ Signed in\n");

    Ok(manager)
}
