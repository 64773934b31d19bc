use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::auth::{validation, CredentialService, PasswordHasher, Registration, TokenService};
use crate::cli::utils::{connect_store, load_config, output_success};
use crate::cli::OutputFormat;
use crate::database::store::Store;
use crate::types::Role;

#[derive(Args)]
pub struct CreateAccountArgs {
    #[arg(long, help = "Primary account id")]
    pub id: String,

    #[arg(long, help = "Display name")]
    pub name: String,

    #[arg(long, help = "Role id: 1 Administrator, 2 Staff, 3 Student")]
    pub role: i32,

    #[arg(long, help = "Initial password")]
    pub password: String,

    #[arg(long, help = "Email address")]
    pub email: Option<String>,

    #[arg(long, help = "Student number (secondary login identifier)")]
    pub student_number: Option<String>,

    #[arg(long, help = "Employee number (secondary login identifier)")]
    pub employee_number: Option<String>,
}

pub async fn hash_password(password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    validation::validate_password(password).map_err(anyhow::Error::msg)?;

    let config = load_config()?;
    let hash = PasswordHasher::new(config.security.bcrypt_cost).hash(password).await?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Password hashed",
            Some(json!({ "hash": hash.as_str(), "cost": config.security.bcrypt_cost })),
        ),
        OutputFormat::Text => {
            println!("{}", hash.as_str());
            Ok(())
        }
    }
}

pub async fn create_account(args: CreateAccountArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let role = Role::from_id(args.role).with_context(|| format!("unknown role id {}", args.role))?;

    let config = load_config()?;
    let store: Arc<dyn Store> = connect_store(&config).await?;
    let tokens = TokenService::from_config(&config.security)?;
    let credentials =
        CredentialService::new(store, tokens, PasswordHasher::new(config.security.bcrypt_cost)).await?;

    let registration = Registration {
        id: args.id,
        student_number: args.student_number,
        employee_number: args.employee_number,
        name: args.name,
        email: args.email,
        password: args.password,
        role_id: Some(role.id()),
        department_id: None,
        program_id: None,
        year_level: None,
        status: None,
        batch: None,
        photo: None,
    };

    let account = credentials.register(registration, role).await?;
    output_success(
        &output_format,
        &format!("Account '{}' created as {}", account.id, role.label()),
        Some(serde_json::to_value(&account)?),
    )
}
