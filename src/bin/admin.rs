//! VoiceGate Admin CLI
//!
//! Operator tooling for seeding accounts and managing plans without going
//! through the HTTP API. Talks to the same SQLite store as the server, so run
//! it against the server's database path (or point --db elsewhere for tests).
//!
//! Usage:
//!   cargo run --bin voicegate-admin -- --db ./voicegate.db list-users
//!   cargo run --bin voicegate-admin -- grant-plan --email a@b.co --plan pro --days 30

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use voicegate_backend::auth::{
    models::NewUser, store::CredentialStore, PasswordHasher, SqliteCredentialStore,
};
use voicegate_backend::subscription::{resolve_tier, SubscriptionState};

#[derive(Parser, Debug)]
#[command(name = "voicegate-admin")]
#[command(about = "Operator tooling for VoiceGate user accounts and plans")]
struct Args {
    /// Path to the SQLite user database
    #[arg(long, env = "AUTH_DB_PATH", default_value = "voicegate.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account directly (e.g. for support or demos)
    CreateUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        display_name: Option<String>,
    },

    /// List all accounts with their effective tier
    ListUsers,

    /// Show one account in detail
    ShowUser {
        #[arg(long)]
        email: String,
    },

    /// Grant a plan for a number of days (0 = does not expire)
    GrantPlan {
        #[arg(long)]
        email: String,

        #[arg(long, default_value = "pro")]
        plan: String,

        #[arg(long, default_value = "30")]
        days: i64,
    },

    /// Cancel an account's plan
    RevokePlan {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("voicegate_admin=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let store: Arc<dyn CredentialStore> = Arc::new(
        SqliteCredentialStore::new(&args.db)
            .with_context(|| format!("Failed to open user database at {}", args.db))?,
    );

    match args.command {
        Commands::CreateUser {
            email,
            password,
            display_name,
        } => create_user(&*store, &email, &password, display_name).await,
        Commands::ListUsers => list_users(&*store).await,
        Commands::ShowUser { email } => show_user(&*store, &email).await,
        Commands::GrantPlan { email, plan, days } => {
            grant_plan(&*store, &email, &plan, days).await
        }
        Commands::RevokePlan { email } => revoke_plan(&*store, &email).await,
    }
}

async fn create_user(
    store: &dyn CredentialStore,
    email: &str,
    password: &str,
    display_name: Option<String>,
) -> Result<()> {
    if password.len() < 8 {
        bail!("Password must be at least 8 characters");
    }

    let hasher = PasswordHasher::default();
    let password_hash = hasher.hash(password)?;

    let user = store
        .create(NewUser {
            email: email.to_string(),
            password_hash,
            display_name,
        })
        .await
        .context("Account creation failed")?;

    println!("Created {} ({})", user.email, user.id);
    Ok(())
}

async fn list_users(store: &dyn CredentialStore) -> Result<()> {
    let users = store.list().await.context("Listing accounts failed")?;
    let now = Utc::now();

    println!("{:<38} {:<32} {:<10} plan", "id", "email", "tier");
    for user in &users {
        let tier = resolve_tier(user.subscription.as_ref(), now);
        let plan = user
            .subscription
            .as_ref()
            .map(|s| format!("{} ({})", s.plan_id, s.status.as_str()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<38} {:<32} {:<10} {}",
            user.id,
            user.email,
            tier.as_str(),
            plan
        );
    }
    println!("\n{} account(s)", users.len());
    Ok(())
}

async fn show_user(store: &dyn CredentialStore, email: &str) -> Result<()> {
    let user = store
        .find_by_email(email)
        .await
        .context("Lookup failed")?
        .with_context(|| format!("No account for {}", email))?;

    println!("id:           {}", user.id);
    println!("email:        {}", user.email);
    println!("display_name: {}", user.display_name.as_deref().unwrap_or("-"));
    println!("created_at:   {}", user.created_at);
    println!("updated_at:   {}", user.updated_at);
    println!(
        "tier:         {}",
        resolve_tier(user.subscription.as_ref(), Utc::now()).as_str()
    );
    match &user.subscription {
        Some(sub) => {
            println!("plan:         {} ({})", sub.plan_id, sub.status.as_str());
            match sub.expires_at {
                Some(at) => println!("expires_at:   {}", at),
                None => println!("expires_at:   never"),
            }
        }
        None => println!("plan:         none"),
    }
    Ok(())
}

async fn grant_plan(
    store: &dyn CredentialStore,
    email: &str,
    plan: &str,
    days: i64,
) -> Result<()> {
    let user = store
        .find_by_email(email)
        .await
        .context("Lookup failed")?
        .with_context(|| format!("No account for {}", email))?;

    let expires_at = (days > 0).then(|| Utc::now() + Duration::days(days));
    let updated = store
        .set_subscription(&user.id, SubscriptionState::active(plan, expires_at))
        .await
        .context("Plan grant failed")?;

    let tier = resolve_tier(updated.subscription.as_ref(), Utc::now());
    match expires_at {
        Some(at) => println!("Granted {} to {} until {}", plan, email, at),
        None => println!("Granted {} to {} (no expiry)", plan, email),
    }
    println!("Effective tier: {}", tier.as_str());
    Ok(())
}

async fn revoke_plan(store: &dyn CredentialStore, email: &str) -> Result<()> {
    let user = store
        .find_by_email(email)
        .await
        .context("Lookup failed")?
        .with_context(|| format!("No account for {}", email))?;

    let plan_id = user
        .subscription
        .as_ref()
        .map(|s| s.plan_id.clone())
        .unwrap_or_else(|| "free".to_string());

    store
        .set_subscription(&user.id, SubscriptionState::cancelled(plan_id))
        .await
        .context("Plan revocation failed")?;

    println!("Revoked plan for {}; effective tier is now free", email);
    Ok(())
}
