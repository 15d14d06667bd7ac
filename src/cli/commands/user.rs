//! User management command handlers

use crate::auth::roles::Role;
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, NewAccount, SeaOrmAuthService};

pub async fn cmd_user_create(
    config: &Config,
    username: &str,
    password: &str,
    email: Option<&str>,
    role: &str,
) -> anyhow::Result<()> {
    let Some(role) = Role::parse(role) else {
        println!("Invalid role: {}", role);
        println!("Use one of: admin, editor, author");
        return Ok(());
    };

    let store = Store::new(&config.general.database_path).await?;
    let auth = SeaOrmAuthService::new(store, config.security.clone());

    let user = auth
        .create_account(NewAccount {
            username: username.to_string(),
            password: password.to_string(),
            email: email.map(ToString::to_string),
            display_name: None,
            role,
        })
        .await?;

    println!("✓ Created user: {} (ID: {})", user.username, user.id);
    println!("  Email: {}", user.email);
    println!("  Role:  {}", user.role);

    Ok(())
}

pub async fn cmd_user_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No users found.");
        println!();
        println!("Create one with: vellum user create <username> <password>");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let status = if user.is_active { "✓" } else { "⏸" };
        println!("{} {} (ID: {})", status, user.username, user.id);
        println!("  Email: {} | Role: {}", user.email, user.role);
    }

    println!();
    println!("Legend: ✓ Active | ⏸ Deactivated");

    Ok(())
}

pub async fn cmd_user_deactivate(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    match store.get_user_by_username(username).await? {
        Some(user) if !user.is_active => {
            println!("User '{}' is already deactivated.", username);
        }
        Some(_) => {
            if store.deactivate_user(username).await? {
                println!("✓ Deactivated user: {}", username);
                println!("  Any live sessions will be rejected on their next request.");
            } else {
                println!("Failed to deactivate user.");
            }
        }
        None => {
            println!("User '{}' not found.", username);
        }
    }

    Ok(())
}
