use reqwest::Method;
use serde_json::Value;
use serde_json::json;

use crate::client::Client;
use crate::client::RequestOptions;
use crate::error::Result;
use crate::types::Category;
use crate::types::Favorite;
use crate::types::NewFavorite;
use crate::types::Profile;
use crate::types::Property;
use crate::types::PropertyBrief;
use crate::types::PropertyInput;
use crate::types::PropertyQuery;
use crate::types::Realtor;
use crate::types::Review;
use crate::types::ReviewInput;

impl Client {
    pub async fn list_properties(&self, query: &PropertyQuery) -> Result<Vec<Property>> {
        let options = query
            .to_pairs()
            .into_iter()
            .fold(RequestOptions::new(), |opts, (k, v)| opts.query(k, v));
        self.get_json("/properties", options).await
    }

    pub async fn get_property(&self, id: i64) -> Result<Property> {
        self.get_json(&format!("/properties/{id}"), RequestOptions::new())
            .await
    }

    pub async fn create_property(&self, input: &PropertyInput) -> Result<Value> {
        self.post("/properties", input).await?.json_value()
    }

    pub async fn update_property(&self, id: i64, input: &PropertyInput) -> Result<Value> {
        self.put(&format!("/properties/{id}"), input)
            .await?
            .json_value()
    }

    pub async fn delete_property(&self, id: i64) -> Result<()> {
        self.delete(&format!("/properties/{id}")).await?;
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.get_json("/categories", RequestOptions::new()).await
    }

    pub async fn list_favorites(&self) -> Result<Vec<Favorite>> {
        self.get_json("/favorites", RequestOptions::new()).await
    }

    pub async fn add_favorite(&self, property_id: i64) -> Result<Value> {
        self.post("/favorites", &NewFavorite { property_id })
            .await?
            .json_value()
    }

    pub async fn remove_favorite(&self, favorite_id: i64) -> Result<()> {
        self.delete(&format!("/favorites/{favorite_id}")).await?;
        Ok(())
    }

    pub async fn get_profile(&self) -> Result<Profile> {
        self.get_json("/users/profile", RequestOptions::new()).await
    }

    pub async fn update_profile(&self, profile: &Profile) -> Result<Value> {
        self.put("/users/profile", profile).await?.json_value()
    }

    pub async fn list_realtors(&self) -> Result<Vec<Realtor>> {
        self.get_json("/realtors", RequestOptions::new()).await
    }

    pub async fn get_realtor(&self, id: i64) -> Result<Realtor> {
        self.get_json(&format!("/realtors/{id}"), RequestOptions::new())
            .await
    }

    pub async fn realtor_properties(&self, id: i64) -> Result<Vec<PropertyBrief>> {
        self.get_json(&format!("/realtors/{id}/properties"), RequestOptions::new())
            .await
    }

    pub async fn realtor_reviews(&self, id: i64) -> Result<Vec<Review>> {
        self.get_json(&format!("/realtors/{id}/reviews"), RequestOptions::new())
            .await
    }

    /// Post a review. The backend keeps one review per author, so the
    /// returned review replaces any earlier one by the same author.
    pub async fn add_review(&self, realtor_id: i64, input: &ReviewInput) -> Result<Review> {
        self.post(&format!("/realtors/{realtor_id}/reviews"), input)
            .await?
            .json()
    }

    pub async fn assistant_chat(&self, message: &str) -> Result<ChatReply> {
        let value = self
            .request(
                Method::POST,
                "/assistant/chat",
                Some(json!({ "message": message })),
                RequestOptions::new(),
            )
            .await?
            .json_value()?;
        Ok(ChatReply::from_value(value))
    }
}

/// Insert `review` at the front, dropping any earlier review by the same
/// author.
pub fn upsert_review(reviews: &mut Vec<Review>, review: Review) {
    reviews.retain(|r| r.author != review.author);
    reviews.insert(0, review);
}

/// Reply from the listing assistant: an answer line followed by suggestions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    /// `None` when the assistant found nothing.
    pub answer: Option<String>,
    pub items: Vec<ChatItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatItem {
    Text(String),
    Property { id: i64, title: String },
}

impl ChatReply {
    /// The backend answers with a JSON array whose first element is the
    /// answer text; the rest are plain lines or `{id, title}` listings.
    /// Anything else is skipped.
    pub fn from_value(value: Value) -> Self {
        let Value::Array(entries) = value else {
            return Self::default();
        };
        let mut entries = entries.into_iter();
        let answer = match entries.next() {
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
            None => return Self::default(),
        };
        let items = entries
            .filter_map(|entry| match entry {
                Value::String(s) => Some(ChatItem::Text(s)),
                Value::Object(map) => {
                    let id = map.get("id").and_then(Value::as_i64)?;
                    let title = map.get("title").and_then(Value::as_str)?;
                    Some(ChatItem::Property {
                        id,
                        title: title.to_string(),
                    })
                }
                _ => None,
            })
            .collect();
        Self { answer, items }
    }
}
