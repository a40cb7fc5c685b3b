use anyhow::Result;
use anyhow::bail;
use estate_backend_client::AddressFilter;
use estate_backend_client::ChatItem;
use estate_backend_client::ListingFilter;
use estate_backend_client::SortField;
use estate_backend_client::SortOrder;
use estate_backend_client::types::Profile;
use estate_backend_client::types::PropertyInput;
use estate_backend_client::types::PropertyQuery;
use estate_backend_client::types::PropertyStatus;
use estate_backend_client::types::PropertyType;
use estate_backend_client::types::ReviewInput;
use estate_backend_client::upsert_review;
use estate_core::Connection;
use serde_json::json;

use crate::output::parse_json_arg;
use crate::output::print_json;

#[derive(Debug, clap::Subcommand)]
pub enum PropertiesCommand {
    /// List listings. Server-side filters are sent as query parameters;
    /// rating, address and sort options are applied locally.
    List(ListPropertiesArgs),

    /// Show one listing.
    Get { id: i64 },

    /// Create a listing from JSON (inline or `@file`).
    Create {
        #[arg(long)]
        json: String,
    },

    /// Replace a listing from JSON (inline or `@file`).
    Update {
        id: i64,
        #[arg(long)]
        json: String,
    },

    /// Delete a listing.
    Delete { id: i64 },
}

#[derive(Debug, Default, clap::Parser)]
pub struct ListPropertiesArgs {
    /// Free-text search.
    #[arg(long)]
    pub search: Option<String>,

    /// FOR_SALE, FOR_RENT or SOLD.
    #[arg(long)]
    pub status: Option<PropertyStatus>,

    /// APARTMENT or HOUSE.
    #[arg(long = "type")]
    pub property_type: Option<PropertyType>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub min_price: Option<f64>,

    #[arg(long)]
    pub max_price: Option<f64>,

    /// Street to match in the address, in Latin or Cyrillic.
    #[arg(long)]
    pub street: Option<String>,

    /// House number to match in the address.
    #[arg(long)]
    pub house: Option<String>,

    /// Minimum listing rating. Unrated listings count as 0.
    #[arg(long)]
    pub min_rating: Option<f64>,

    /// Minimum realtor rating. Unrated realtors count as 0.
    #[arg(long)]
    pub min_realtor_rating: Option<f64>,

    /// price, rating or realtor-rating.
    #[arg(long)]
    pub sort: Option<SortField>,

    /// Sort descending instead of ascending.
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

impl ListPropertiesArgs {
    fn split(self) -> (PropertyQuery, ListingFilter, AddressFilter) {
        let query = PropertyQuery {
            search: self.search,
            status: self.status,
            property_type: self.property_type,
            city: self.city.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
        };
        let order = if self.desc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };
        let listing = ListingFilter {
            min_realtor_rating: self.min_realtor_rating,
            min_property_rating: self.min_rating,
            sort: self.sort.map(|field| (field, order)),
        };
        // The city already narrows the server query; it only joins the local
        // address match when a street or house is given as well.
        let address = AddressFilter {
            city: if self.street.is_some() || self.house.is_some() {
                self.city
            } else {
                None
            },
            street: self.street,
            house: self.house,
        };
        (query, listing, address)
    }
}

impl PropertiesCommand {
    pub(crate) async fn run(self, conn: &Connection) -> Result<()> {
        let client = conn.client();
        match self {
            PropertiesCommand::List(args) => {
                let (query, listing, address) = args.split();
                let mut properties = client.list_properties(&query).await?;
                if !address.is_empty() {
                    properties = address.apply(properties);
                }
                print_json(&listing.apply(properties))
            }
            PropertiesCommand::Get { id } => print_json(&client.get_property(id).await?),
            PropertiesCommand::Create { json } => {
                let input: PropertyInput = parse_json_arg(&json)?;
                print_json(&client.create_property(&input).await?)
            }
            PropertiesCommand::Update { id, json } => {
                let input: PropertyInput = parse_json_arg(&json)?;
                print_json(&client.update_property(id, &input).await?)
            }
            PropertiesCommand::Delete { id } => {
                client.delete_property(id).await?;
                print_json(&json!({ "deleted": id }))
            }
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum FavoritesCommand {
    List,
    /// Add a listing to favorites.
    Add { property_id: i64 },
    /// Remove a favorite by its favorite id.
    Remove { id: i64 },
}

impl FavoritesCommand {
    pub(crate) async fn run(self, conn: &Connection) -> Result<()> {
        let client = conn.client();
        match self {
            FavoritesCommand::List => print_json(&client.list_favorites().await?),
            FavoritesCommand::Add { property_id } => {
                print_json(&client.add_favorite(property_id).await?)
            }
            FavoritesCommand::Remove { id } => {
                client.remove_favorite(id).await?;
                print_json(&json!({ "deleted": id }))
            }
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum CategoriesCommand {
    List,
}

impl CategoriesCommand {
    pub(crate) async fn run(self, conn: &Connection) -> Result<()> {
        match self {
            CategoriesCommand::List => print_json(&conn.client().list_categories().await?),
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum RealtorsCommand {
    List,
    /// Show a realtor and their listings.
    Get { id: i64 },
    /// List a realtor's reviews, newest first.
    Reviews { id: i64 },
    /// Review a realtor. Replaces your earlier review of them, if any.
    Review {
        id: i64,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        #[arg(long)]
        comment: String,
    },
}

impl RealtorsCommand {
    pub(crate) async fn run(self, conn: &Connection) -> Result<()> {
        let client = conn.client();
        match self {
            RealtorsCommand::List => print_json(&client.list_realtors().await?),
            RealtorsCommand::Get { id } => {
                let realtor = client.get_realtor(id).await?;
                let properties = client.realtor_properties(id).await?;
                print_json(&json!({
                    "realtor": realtor,
                    "properties": properties,
                }))
            }
            RealtorsCommand::Reviews { id } => print_json(&client.realtor_reviews(id).await?),
            RealtorsCommand::Review {
                id,
                rating,
                comment,
            } => {
                if comment.trim().is_empty() {
                    bail!("--comment must not be empty");
                }
                let mut reviews = client.realtor_reviews(id).await?;
                let review = client
                    .add_review(id, &ReviewInput { rating, comment })
                    .await?;
                upsert_review(&mut reviews, review);
                print_json(&reviews)
            }
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum ProfileCommand {
    Get,
    /// Update the profile from JSON (inline or `@file`).
    Update {
        #[arg(long)]
        json: String,
    },
}

impl ProfileCommand {
    pub(crate) async fn run(self, conn: &Connection) -> Result<()> {
        let client = conn.client();
        match self {
            ProfileCommand::Get => print_json(&client.get_profile().await?),
            ProfileCommand::Update { json } => {
                let profile: Profile = parse_json_arg(&json)?;
                print_json(&client.update_profile(&profile).await?)
            }
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct ChatArgs {
    pub message: String,
}

pub(crate) async fn run_chat(conn: &Connection, args: ChatArgs) -> Result<()> {
    let message = args.message.trim();
    if message.is_empty() {
        bail!("message must not be empty");
    }
    let reply = conn.client().assistant_chat(message).await?;
    let items: Vec<serde_json::Value> = reply
        .items
        .iter()
        .map(|item| match item {
            ChatItem::Text(text) => json!({ "text": text }),
            ChatItem::Property { id, title } => json!({ "propertyId": id, "title": title }),
        })
        .collect();
    print_json(&json!({
        "answer": reply.answer.as_deref().unwrap_or("Nothing found."),
        "items": items,
    }))
}

#[derive(Debug, clap::Parser)]
pub struct GeocodeArgs {
    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub street: Option<String>,

    #[arg(long)]
    pub house: Option<String>,
}

pub(crate) async fn run_geocode(conn: &Connection, args: GeocodeArgs) -> Result<()> {
    let filter = AddressFilter {
        city: args.city,
        street: args.street,
        house: args.house,
    };
    if filter.is_empty() {
        bail!("give at least one of --city, --street or --house");
    }
    let geocoder = conn.geocoder()?;
    match geocoder.locate(&filter).await? {
        Some(target) => print_json(&json!({
            "lat": target.lat,
            "lon": target.lon,
            "zoom": target.zoom,
        })),
        None => bail!("no match for {:?}", filter.geocode_query().unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn city_joins_address_match_only_with_street_or_house() {
        let (query, listing, address) = ListPropertiesArgs {
            city: Some("Lviv".to_string()),
            sort: Some(SortField::Price),
            desc: true,
            ..Default::default()
        }
        .split();
        assert_eq!(query.city.as_deref(), Some("Lviv"));
        assert!(address.is_empty());
        assert_eq!(listing.sort, Some((SortField::Price, SortOrder::Desc)));

        let (_, _, address) = ListPropertiesArgs {
            city: Some("Lviv".to_string()),
            street: Some("Horodotska".to_string()),
            ..Default::default()
        }
        .split();
        assert_eq!(address.city.as_deref(), Some("Lviv"));
        assert_eq!(address.zoom(), 16);
    }
}
