use anyhow::Result;
use anyhow::bail;
use estate_backend_client::Role;
use estate_backend_client::types::PoiInput;
use estate_backend_client::types::UserInput;
use estate_core::Connection;
use serde_json::json;

use crate::output::parse_json_arg;
use crate::output::print_json;

#[derive(Debug, clap::Subcommand)]
pub enum AdminCommand {
    #[clap(subcommand)]
    Users(JsonCrud),

    #[clap(subcommand)]
    Roles(NamedCrud),

    /// Create, rename or delete listing categories.
    #[clap(subcommand)]
    Categories(NamedCrudWithoutList),

    /// Points of interest shown on the map.
    #[clap(subcommand)]
    Pois(JsonCrud),

    #[clap(subcommand)]
    Favorites(FavoritesAdmin),

    /// Totals across listings, users and favorites.
    Stats,
}

/// CRUD over records whose bodies are given as JSON (inline or `@file`).
#[derive(Debug, clap::Subcommand)]
pub enum JsonCrud {
    List,
    Create {
        #[arg(long)]
        json: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        json: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, clap::Subcommand)]
pub enum NamedCrud {
    List,
    Create { name: String },
    Update { id: i64, name: String },
    Delete { id: i64 },
}

#[derive(Debug, clap::Subcommand)]
pub enum NamedCrudWithoutList {
    Create { name: String },
    Update { id: i64, name: String },
    Delete { id: i64 },
}

#[derive(Debug, clap::Subcommand)]
pub enum FavoritesAdmin {
    List,
    Delete { id: i64 },
}

/// Refuse before any call is made unless the stored session is an admin's.
/// The backend enforces the same rule; this only saves the round trip.
fn require_admin(conn: &Connection) -> Result<()> {
    match conn.client().session().role() {
        Some(Role::Admin) => Ok(()),
        Some(role) => bail!("admin commands require an ADMIN session (current role: {role})"),
        None => bail!("admin commands require an ADMIN session; run 'estate login' first"),
    }
}

impl AdminCommand {
    pub(crate) async fn run(self, conn: &Connection) -> Result<()> {
        require_admin(conn)?;
        let client = conn.client();
        match self {
            AdminCommand::Users(cmd) => match cmd {
                JsonCrud::List => print_json(&client.admin_list_users().await?),
                JsonCrud::Create { json } => {
                    let input: UserInput = parse_json_arg(&json)?;
                    print_json(&client.admin_create_user(&input).await?)
                }
                JsonCrud::Update { id, json } => {
                    let input: UserInput = parse_json_arg(&json)?;
                    print_json(&client.admin_update_user(id, &input).await?)
                }
                JsonCrud::Delete { id } => {
                    client.admin_delete_user(id).await?;
                    print_json(&json!({ "deleted": id }))
                }
            },
            AdminCommand::Roles(cmd) => match cmd {
                NamedCrud::List => print_json(&client.admin_list_roles().await?),
                NamedCrud::Create { name } => {
                    print_json(&client.admin_create_role(&name).await?)
                }
                NamedCrud::Update { id, name } => {
                    print_json(&client.admin_update_role(id, &name).await?)
                }
                NamedCrud::Delete { id } => {
                    client.admin_delete_role(id).await?;
                    print_json(&json!({ "deleted": id }))
                }
            },
            AdminCommand::Categories(cmd) => match cmd {
                NamedCrudWithoutList::Create { name } => {
                    print_json(&client.create_category(&name).await?)
                }
                NamedCrudWithoutList::Update { id, name } => {
                    print_json(&client.update_category(id, &name).await?)
                }
                NamedCrudWithoutList::Delete { id } => {
                    client.delete_category(id).await?;
                    print_json(&json!({ "deleted": id }))
                }
            },
            AdminCommand::Pois(cmd) => match cmd {
                JsonCrud::List => print_json(&client.admin_list_pois().await?),
                JsonCrud::Create { json } => {
                    let input: PoiInput = parse_json_arg(&json)?;
                    print_json(&client.admin_create_poi(&input).await?)
                }
                JsonCrud::Update { id, json } => {
                    let input: PoiInput = parse_json_arg(&json)?;
                    print_json(&client.admin_update_poi(id, &input).await?)
                }
                JsonCrud::Delete { id } => {
                    client.admin_delete_poi(id).await?;
                    print_json(&json!({ "deleted": id }))
                }
            },
            AdminCommand::Favorites(cmd) => match cmd {
                FavoritesAdmin::List => print_json(&client.admin_list_favorites().await?),
                FavoritesAdmin::Delete { id } => {
                    client.admin_delete_favorite(id).await?;
                    print_json(&json!({ "deleted": id }))
                }
            },
            AdminCommand::Stats => print_json(&client.admin_stats().await?),
        }
    }
}
