use std::io::IsTerminal;
use std::io::Read;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use estate_backend_client::Role;
use estate_backend_client::types::RegisterRequest;
use estate_core::Connection;
use serde_json::json;

use crate::output::print_json;

#[derive(Debug, clap::Parser)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    /// Password. Read from stdin when omitted.
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, clap::Parser)]
pub struct RegisterArgs {
    #[arg(long)]
    pub full_name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: String,

    /// Password. Read from stdin when omitted.
    #[arg(long)]
    pub password: Option<String>,

    /// USER or REALTOR.
    #[arg(long, default_value = "USER")]
    pub role: Role,

    /// Agency name; realtors only.
    #[arg(long, default_value = "")]
    pub agency: String,

    /// Telegram handle; realtors only.
    #[arg(long, default_value = "")]
    pub telegram: String,
}

pub(crate) async fn run_login(conn: &Connection, args: LoginArgs) -> Result<()> {
    let LoginArgs { email, password } = args;
    let password = match password {
        Some(password) => password,
        None => read_password_from_stdin()?,
    };
    let login = conn.client().login(&email, &password).await?;
    print_json(&json!({
        "loggedIn": true,
        "role": login.role,
    }))
}

pub(crate) async fn run_register(conn: &Connection, args: RegisterArgs) -> Result<()> {
    let RegisterArgs {
        full_name,
        email,
        phone,
        password,
        role,
        agency,
        telegram,
    } = args;
    if role == Role::Admin {
        bail!("accounts can only register as USER or REALTOR");
    }
    let password = match password {
        Some(password) => password,
        None => read_password_from_stdin()?,
    };
    let (agency, telegram) = if role == Role::Realtor {
        (agency, telegram)
    } else {
        (String::new(), String::new())
    };
    let request = RegisterRequest {
        full_name,
        email,
        phone,
        password,
        role: Some(role),
        agency,
        telegram,
    };
    let created = conn.client().register(&request).await?;
    print_json(&created)
}

pub(crate) async fn run_logout(conn: &Connection) -> Result<()> {
    conn.client().logout().await?;
    print_json(&json!({ "loggedIn": false }))
}

pub(crate) fn run_whoami(conn: &Connection) -> Result<()> {
    let session = conn.client().session().session();
    print_json(&json!({
        "loggedIn": session.is_some(),
        "role": session.and_then(|s| s.role),
    }))
}

fn read_password_from_stdin() -> Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        bail!(
            "no --password given and stdin is a terminal. Pipe it instead, e.g. `printenv ESTATE_PASSWORD | estate login --email <email>`."
        );
    }

    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .context("failed to read password from stdin")?;
    let password = buffer.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("No password provided via stdin.");
    }
    Ok(password)
}
