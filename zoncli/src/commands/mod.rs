use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;

use zon_api::endpoints::cart::{AddToCart, GetCart, RemoveFromCart};
use zon_api::endpoints::orders::ListOrders;
use zon_api::endpoints::search::SearchProducts;
use zon_api::endpoints::subscriptions::ListSubscriptions;
use zon_api::Client;
use zoncli_auth::{Credential, CredentialStore, Settings, TokenManager};

use crate::cli::{CartAction, Cli, Command};
use crate::output;

const LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::new()?;
    settings
        .validate()
        .map_err(|e| anyhow!("invalid configuration: {e}"))?;

    let api = Arc::new(Client::new(settings.rate_limit.policy())?);

    match cli.command {
        Command::Login => {
            let manager = TokenManager::new(api, settings, CredentialStore::new()?)?;
            let credential = manager.login(LOGIN_TIMEOUT).await?;
            println!("✓ Signed in (access token expires {})", credential.expires_at);
            Ok(())
        }
        Command::Logout => {
            let manager = TokenManager::new(api, settings, CredentialStore::new()?)?;
            manager.logout().await?;
            println!("Signed out.");
            Ok(())
        }
        Command::Status => {
            let manager = TokenManager::new(api, settings, CredentialStore::new()?)?;
            match manager.current().await {
                Some(credential) if credential.should_refresh() => {
                    println!(
                        "Signed in; access token expired or expiring soon ({}), will refresh on next use",
                        credential.expires_at
                    );
                }
                Some(credential) => {
                    println!("Signed in; access token expires {}", credential.expires_at);
                }
                None => println!("Not signed in. Run `zoncli login`."),
            }
            Ok(())
        }
        Command::Orders { page } => {
            let manager = zoncli_auth::authenticate(api.clone(), settings).await?;
            let credential = fresh(&manager).await?;
            let response = api
                .send(ListOrders::new().page(page), Some(&credential.access_token))
                .await?;
            output::orders(&response, cli.json)
        }
        Command::Cart { action } => {
            let manager = zoncli_auth::authenticate(api.clone(), settings).await?;
            let credential = fresh(&manager).await?;
            let token = Some(credential.access_token.as_str());
            let response = match action {
                CartAction::Show => api.send(GetCart::new(), token).await?,
                CartAction::Add {
                    product_id,
                    quantity,
                } => {
                    api.send(
                        AddToCart::new(product_id.as_str()).quantity(quantity),
                        token,
                    )
                    .await?
                }
                CartAction::Remove { item_id } => {
                    api.send(RemoveFromCart::new(item_id), token).await?
                }
            };
            output::cart(&response, cli.json)
        }
        Command::Search { query, page } => {
            let manager = zoncli_auth::authenticate(api.clone(), settings).await?;
            let credential = fresh(&manager).await?;
            let response = api
                .send(
                    SearchProducts::new(query).page(page),
                    Some(&credential.access_token),
                )
                .await?;
            output::search(&response, cli.json)
        }
        Command::Subscriptions => {
            let manager = zoncli_auth::authenticate(api.clone(), settings).await?;
            let credential = fresh(&manager).await?;
            let response = api
                .send(ListSubscriptions::new(), Some(&credential.access_token))
                .await?;
            output::subscriptions(&response, cli.json)
        }
    }
}

/// Refresh the credential if it is near expiry, then apply the last-mile
/// validity check before any domain request goes out.
async fn fresh(manager: &TokenManager) -> Result<Credential> {
    manager.refresh_if_needed().await?;
    Ok(manager.validate().await?)
}
