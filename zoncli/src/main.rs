use clap::Parser;

use zoncli::cli::Cli;
use zoncli::{commands, logging};
use zon_api::ZonApiError;
use zoncli_auth::AuthError;

// Exit codes scripts can branch on.
const EXIT_FAILURE: i32 = 1;
const EXIT_AUTH: i32 = 2;
const EXIT_BLOCKED: i32 = 3;
const EXIT_RATE_LIMITED: i32 = 4;
const EXIT_NETWORK: i32 = 5;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging() {
        eprintln!("warning: file logging disabled: {e}");
    }

    if let Err(e) = commands::run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(api) = cause.downcast_ref::<ZonApiError>() {
            return match api {
                ZonApiError::Blocked { .. } => EXIT_BLOCKED,
                ZonApiError::RateLimited(_) => EXIT_RATE_LIMITED,
                ZonApiError::Network(_) => EXIT_NETWORK,
                _ => EXIT_FAILURE,
            };
        }
        if let Some(auth) = cause.downcast_ref::<AuthError>() {
            return match auth {
                // Let the wrapped transport error pick the code.
                AuthError::Api(_) => continue,
                AuthError::AuthRequired
                | AuthError::AuthExpired
                | AuthError::Timeout
                | AuthError::CsrfMismatch
                | AuthError::AuthorizationDenied(_)
                | AuthError::TokenExchangeFailed(_)
                | AuthError::RefreshFailed(_) => EXIT_AUTH,
                _ => EXIT_FAILURE,
            };
        }
    }
    EXIT_FAILURE
}
