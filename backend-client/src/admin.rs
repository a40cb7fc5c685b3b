//! Administrator endpoints. The backend enforces the ADMIN role; callers get
//! a 403 passed through otherwise.

use serde_json::Value;

use crate::client::Client;
use crate::client::RequestOptions;
use crate::error::Result;
use crate::types::Category;
use crate::types::Favorite;
use crate::types::NamedInput;
use crate::types::Poi;
use crate::types::PoiInput;
use crate::types::RoleRecord;
use crate::types::Stats;
use crate::types::User;
use crate::types::UserInput;

impl Client {
    pub async fn admin_list_users(&self) -> Result<Vec<User>> {
        self.get_json("/admin/users", RequestOptions::new()).await
    }

    pub async fn admin_create_user(&self, input: &UserInput) -> Result<Value> {
        self.post("/admin/users", input).await?.json_value()
    }

    pub async fn admin_update_user(&self, id: i64, input: &UserInput) -> Result<Value> {
        self.put(&format!("/admin/users/{id}"), input)
            .await?
            .json_value()
    }

    pub async fn admin_delete_user(&self, id: i64) -> Result<()> {
        self.delete(&format!("/admin/users/{id}")).await?;
        Ok(())
    }

    pub async fn admin_list_roles(&self) -> Result<Vec<RoleRecord>> {
        self.get_json("/admin/roles", RequestOptions::new()).await
    }

    pub async fn admin_create_role(&self, name: &str) -> Result<Value> {
        self.post(
            "/admin/roles",
            &NamedInput {
                name: name.to_string(),
            },
        )
        .await?
        .json_value()
    }

    pub async fn admin_update_role(&self, id: i64, name: &str) -> Result<Value> {
        self.put(
            &format!("/admin/roles/{id}"),
            &NamedInput {
                name: name.to_string(),
            },
        )
        .await?
        .json_value()
    }

    pub async fn admin_delete_role(&self, id: i64) -> Result<()> {
        self.delete(&format!("/admin/roles/{id}")).await?;
        Ok(())
    }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        self.post(
            "/categories",
            &NamedInput {
                name: name.to_string(),
            },
        )
        .await?
        .json()
    }

    pub async fn update_category(&self, id: i64, name: &str) -> Result<Value> {
        self.put(
            &format!("/categories/{id}"),
            &NamedInput {
                name: name.to_string(),
            },
        )
        .await?
        .json_value()
    }

    pub async fn delete_category(&self, id: i64) -> Result<()> {
        self.delete(&format!("/categories/{id}")).await?;
        Ok(())
    }

    pub async fn admin_list_pois(&self) -> Result<Vec<Poi>> {
        self.get_json("/admin/pois", RequestOptions::new()).await
    }

    pub async fn admin_create_poi(&self, input: &PoiInput) -> Result<Value> {
        self.post("/admin/pois", input).await?.json_value()
    }

    pub async fn admin_update_poi(&self, id: i64, input: &PoiInput) -> Result<Value> {
        self.put(&format!("/admin/pois/{id}"), input)
            .await?
            .json_value()
    }

    pub async fn admin_delete_poi(&self, id: i64) -> Result<()> {
        self.delete(&format!("/admin/pois/{id}")).await?;
        Ok(())
    }

    pub async fn admin_list_favorites(&self) -> Result<Vec<Favorite>> {
        self.get_json("/admin/favorites", RequestOptions::new())
            .await
    }

    pub async fn admin_delete_favorite(&self, id: i64) -> Result<()> {
        self.delete(&format!("/admin/favorites/{id}")).await?;
        Ok(())
    }

    pub async fn admin_stats(&self) -> Result<Stats> {
        self.get_json("/admin/stats", RequestOptions::new()).await
    }
}
