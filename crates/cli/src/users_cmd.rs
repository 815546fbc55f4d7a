use crate::context::AppContext;
use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use leadflow_core::Credential;
use leadflow_core::credential::ADMIN_ROLE;

#[derive(Debug, Clone, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum UsersAction {
    /// Add or replace a login. The first user needs no login; later ones
    /// require an Admin.
    Add {
        username: String,
        /// Display name (used as lead owner)
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "Ventas")]
        role: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// List logins
    List,
}

pub fn run(args: UsersArgs, ctx: &AppContext, user: Option<&str>) -> Result<()> {
    match args.action {
        UsersAction::Add {
            username,
            name,
            role,
            password,
        } => run_add(ctx, user, &username, &name, &role, password),
        UsersAction::List => {
            ctx.login(user)?;
            run_list(ctx)
        }
    }
}

fn run_add(
    ctx: &AppContext,
    user: Option<&str>,
    username: &str,
    name: &str,
    role: &str,
    password: Option<String>,
) -> Result<()> {
    let credentials = &ctx.store.credentials;
    let bootstrap = credentials.is_empty().context("Failed to read credentials")?;
    if !bootstrap {
        let operator = ctx.login(user)?;
        if !operator.is_admin() {
            bail!("only {ADMIN_ROLE} users can manage logins");
        }
    }

    if username.trim().is_empty() {
        bail!("username must not be empty");
    }
    let password = match password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt(format!("Password for {}", username.trim()))
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()
            .context("Failed to read password")?,
    };
    if password.is_empty() {
        bail!("password must not be empty");
    }

    let credential = Credential::new(
        username,
        name,
        role,
        &password,
        &ctx.config.auth.password_salt,
    );
    let replaced = credentials
        .upsert(credential.clone())
        .context("Failed to save credentials")?;
    println!(
        "{} user {} ({}, {})",
        if replaced { "Updated" } else { "Added" },
        credential.username,
        credential.display_name,
        credential.role
    );
    Ok(())
}

fn run_list(ctx: &AppContext) -> Result<()> {
    let credentials = ctx
        .store
        .credentials
        .load()
        .context("Failed to read credentials")?;
    if credentials.is_empty() {
        println!("No users. Add one with `leadflow users add`.");
        return Ok(());
    }
    println!("{:<16} {:<24} {}", "USERNAME", "NAME", "ROLE");
    for credential in credentials {
        println!(
            "{:<16} {:<24} {}",
            credential.username, credential.display_name, credential.role
        );
    }
    Ok(())
}
