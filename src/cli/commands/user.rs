use anyhow::{anyhow, bail};
use clap::Subcommand;
use serde_json::json;

use crate::auth::password::{hash_password, validate_password};
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::models::user::normalize_email;
use crate::database::models::{is_valid_email, NewUser};
use crate::database::{DatabaseError, ShelterStore};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a staff account")]
    Create {
        #[arg(long, help = "Sign-in email")]
        email: String,

        #[arg(long, help = "Display name")]
        name: String,

        #[arg(long, env = "SHELTERCTL_PASSWORD", hide_env_values = true, help = "Initial password")]
        password: String,
    },

    #[command(about = "List staff accounts")]
    List,
}

pub async fn handle(cmd: UserCommands, store: &dyn ShelterStore, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create { email, name, password } => {
            let email = normalize_email(&email);
            if !is_valid_email(&email) {
                bail!("'{}' is not a valid email address", email);
            }
            let name = name.trim().to_string();
            if name.is_empty() {
                bail!("Name is required");
            }
            validate_password(&password).map_err(|e| anyhow!(e))?;
            let password_hash = hash_password(&password)?;

            let user = store
                .create_user(NewUser {
                    email,
                    name,
                    password_hash,
                })
                .await
                .map_err(|e| match e {
                    DatabaseError::Conflict(_) => anyhow!("A user with that email already exists"),
                    other => anyhow!(other),
                })?;

            output_success(
                &output_format,
                &format!("Created user {}", user.email),
                Some(json!({ "user": user })),
            )
        }
        UserCommands::List => {
            let users = store.list_users().await?;

            if users.is_empty() {
                return output_empty_collection(&output_format, "users", "No users");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    println!("{:<36} {:<30} {:<25} {}", "ID", "EMAIL", "NAME", "CREATED");
                    println!("{}", "-".repeat(110));

                    for user in &users {
                        println!(
                            "{:<36} {:<30} {:<25} {}",
                            user.id,
                            user.email,
                            user.name,
                            user.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }

            Ok(())
        }
    }
}
