//! Session commands.
//!
//! Form input is validated locally before anything is sent, so a typo in an
//! email address never costs a round trip.

use driphub_core::UserProfile;
use driphub_storefront::error::{AppError, Result};
use driphub_storefront::session::{AuthStatus, RegisterOutcome};
use driphub_storefront::state::AppState;
use driphub_storefront::validation::{
    LoginForm, PasswordRules, ResetPasswordForm, SignupForm, validate_email,
};
use secrecy::SecretString;

fn describe(user: Option<&UserProfile>) -> String {
    user.and_then(|u| u.name.clone().or_else(|| u.email.clone()))
        .unwrap_or_else(|| "(profile unavailable)".to_string())
}

pub async fn login(state: &AppState, email: String, password: String) -> Result<()> {
    let request = LoginForm {
        email,
        password: SecretString::from(password),
    }
    .validate()?;

    let user = state.session().login(&request).await?;
    println!("Signed in as {}", describe(user.as_ref()));
    Ok(())
}

pub async fn register(
    state: &AppState,
    name: String,
    email: String,
    password: String,
    confirm: String,
) -> Result<()> {
    let request = SignupForm {
        name,
        email,
        password: SecretString::from(password),
        confirm_password: SecretString::from(confirm),
    }
    .validate(&PasswordRules::default())?;

    match state.session().register(&request).await? {
        RegisterOutcome::SignedIn(user) => {
            println!("Account created, signed in as {}", describe(user.as_ref()));
        }
        RegisterOutcome::LoginRequired => {
            println!("Account created. Sign in with `driphub auth login`.");
        }
    }
    Ok(())
}

pub async fn logout(state: &AppState) {
    state.session().logout().await;
    println!("Signed out");
}

pub async fn whoami(state: &AppState) -> Result<()> {
    let session = state.start().await;
    match session.status {
        AuthStatus::Authenticated | AuthStatus::AuthenticatedNoProfile => {
            println!("Signed in as {}", describe(session.user.as_ref()));
            if let Some(user) = &session.user {
                let json = serde_json::to_string_pretty(user)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                println!("{json}");
            }
        }
        AuthStatus::Unauthenticated | AuthStatus::Authenticating => println!("Not signed in"),
    }
    Ok(())
}

pub async fn forgot(state: &AppState, email: &str) -> Result<()> {
    let email = validate_email(email)?;
    let message = state.session().forgot_password(email.as_str()).await?;
    println!("{message}");
    Ok(())
}

pub async fn reset(state: &AppState, token: String, password: String, confirm: String) -> Result<()> {
    let request = ResetPasswordForm {
        token: SecretString::from(token),
        password: SecretString::from(password),
        confirm_password: SecretString::from(confirm),
    }
    .validate(&PasswordRules::default())?;

    let message = state.session().reset_password(&request).await?;
    println!("{message}");
    Ok(())
}
