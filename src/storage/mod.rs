// src/storage/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::error::AppError;
use crate::models::brewery::{Brewery, BreweryPatch, NewBrewery};
use crate::models::equipment::{Equipment, EquipmentPatch, NewEquipment};
use crate::models::inventory::{InventoryItem, InventoryItemPatch, NewInventoryItem};
use crate::models::price_history::{NewPriceHistoryEntry, PriceHistoryEntry, PriceHistoryPatch};
use crate::models::recipe::{NewRecipe, Recipe, RecipePatch};
use crate::models::schedule::{BrewingSchedule, BrewingSchedulePatch, NewBrewingSchedule};
use crate::models::session::SessionRecord;
use crate::models::source::{IngredientSource, IngredientSourcePatch, NewIngredientSource};
use crate::models::user::{NewUser, Role, User};

pub use memory::MemStorage;
pub use postgres::PgStorage;

/// What happens to a brewery's tenant-scoped rows when the brewery itself
/// is deleted. Deliberately a deployment decision, not a hardcoded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantDeletePolicy {
    /// Deletion fails with a conflict while any tenant-scoped rows exist.
    Restrict,
    /// Tenant-scoped rows are removed in the same transactional boundary.
    Cascade,
}

/// The capability contract every backend satisfies.
///
/// Conventions, uniform across implementations:
/// - `get`/`update` on an unknown id return `Ok(None)`, `delete` returns
///   `Ok(false)`; "missing" is never an error.
/// - `list_*` with `None` returns all rows across tenants (trusted callers
///   only); with `Some(brewery_id)` exactly that tenant's rows.
/// - Tenant ids on `create_*` come in as a separate argument so a request
///   payload can never smuggle one in.
/// - `add_user_to_brewery`/`remove_user_from_brewery` fail fatally when the
///   user or brewery is missing: route-level validation has already
///   confirmed existence, so a miss here is a programmer error.
/// - Connectivity failures are fatal and propagate; there is no retry.
#[async_trait]
pub trait Storage: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Enforces global (cross-tenant) username and email uniqueness with a
    /// case-preserving exact match; duplicates are a Conflict, not a crash.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    // --- Breweries (tenant roots) ---
    async fn create_brewery(&self, brewery: NewBrewery) -> Result<Brewery, AppError>;
    /// Signup path: creates the tenant and its first user, already linked
    /// with the given role, inside one transactional boundary. Either both
    /// records exist afterwards or neither does.
    async fn create_brewery_with_owner(
        &self,
        brewery: NewBrewery,
        owner: NewUser,
    ) -> Result<(Brewery, User), AppError>;
    async fn get_brewery(&self, id: &str) -> Result<Option<Brewery>, AppError>;
    async fn update_brewery(
        &self,
        id: &str,
        patch: BreweryPatch,
    ) -> Result<Option<Brewery>, AppError>;
    /// Honours the configured [`TenantDeletePolicy`]. Member users are
    /// unlinked (not deleted) under either policy.
    async fn delete_brewery(&self, id: &str) -> Result<bool, AppError>;
    async fn list_breweries(&self) -> Result<Vec<Brewery>, AppError>;
    async fn add_user_to_brewery(
        &self,
        user_id: &str,
        brewery_id: &str,
        role: Role,
    ) -> Result<User, AppError>;
    async fn remove_user_from_brewery(&self, user_id: &str) -> Result<User, AppError>;
    async fn list_brewery_users(&self, brewery_id: &str) -> Result<Vec<User>, AppError>;

    // --- Inventory ---
    async fn list_inventory_items(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<InventoryItem>, AppError>;
    async fn get_inventory_item(&self, id: i32) -> Result<Option<InventoryItem>, AppError>;
    async fn create_inventory_item(
        &self,
        brewery_id: Option<&str>,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, AppError>;
    async fn update_inventory_item(
        &self,
        id: i32,
        patch: InventoryItemPatch,
    ) -> Result<Option<InventoryItem>, AppError>;
    async fn delete_inventory_item(&self, id: i32) -> Result<bool, AppError>;

    // --- Equipment ---
    async fn list_equipment(&self, brewery_id: Option<&str>) -> Result<Vec<Equipment>, AppError>;
    async fn get_equipment(&self, id: i32) -> Result<Option<Equipment>, AppError>;
    async fn create_equipment(
        &self,
        brewery_id: Option<&str>,
        equipment: NewEquipment,
    ) -> Result<Equipment, AppError>;
    async fn update_equipment(
        &self,
        id: i32,
        patch: EquipmentPatch,
    ) -> Result<Option<Equipment>, AppError>;
    async fn delete_equipment(&self, id: i32) -> Result<bool, AppError>;

    // --- Recipes ---
    async fn list_recipes(&self, brewery_id: Option<&str>) -> Result<Vec<Recipe>, AppError>;
    async fn get_recipe(&self, id: i32) -> Result<Option<Recipe>, AppError>;
    async fn create_recipe(
        &self,
        brewery_id: Option<&str>,
        recipe: NewRecipe,
    ) -> Result<Recipe, AppError>;
    async fn update_recipe(&self, id: i32, patch: RecipePatch)
        -> Result<Option<Recipe>, AppError>;
    async fn delete_recipe(&self, id: i32) -> Result<bool, AppError>;

    // --- Brewing schedules ---
    async fn list_brewing_schedules(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<BrewingSchedule>, AppError>;
    async fn get_brewing_schedule(&self, id: i32) -> Result<Option<BrewingSchedule>, AppError>;
    /// Recipe/equipment references, when present, must resolve inside the
    /// same brewery; a miss is a Conflict, not a fatal error.
    async fn create_brewing_schedule(
        &self,
        brewery_id: Option<&str>,
        schedule: NewBrewingSchedule,
    ) -> Result<BrewingSchedule, AppError>;
    async fn update_brewing_schedule(
        &self,
        id: i32,
        patch: BrewingSchedulePatch,
    ) -> Result<Option<BrewingSchedule>, AppError>;
    async fn delete_brewing_schedule(&self, id: i32) -> Result<bool, AppError>;

    // --- Ingredient sources ---
    async fn list_ingredient_sources(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<IngredientSource>, AppError>;
    async fn get_ingredient_source(&self, id: i32)
        -> Result<Option<IngredientSource>, AppError>;
    async fn create_ingredient_source(
        &self,
        brewery_id: Option<&str>,
        source: NewIngredientSource,
    ) -> Result<IngredientSource, AppError>;
    async fn update_ingredient_source(
        &self,
        id: i32,
        patch: IngredientSourcePatch,
    ) -> Result<Option<IngredientSource>, AppError>;
    async fn delete_ingredient_source(&self, id: i32) -> Result<bool, AppError>;

    // --- Price history ---
    async fn list_price_history(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<PriceHistoryEntry>, AppError>;
    async fn list_price_history_for_ingredient(
        &self,
        ingredient_id: i32,
    ) -> Result<Vec<PriceHistoryEntry>, AppError>;
    /// The ingredient reference must resolve to an existing inventory item
    /// in the same brewery.
    async fn create_price_history_entry(
        &self,
        brewery_id: Option<&str>,
        entry: NewPriceHistoryEntry,
    ) -> Result<PriceHistoryEntry, AppError>;
    async fn update_price_history_entry(
        &self,
        id: i32,
        patch: PriceHistoryPatch,
    ) -> Result<Option<PriceHistoryEntry>, AppError>;
    async fn delete_price_history_entry(&self, id: i32) -> Result<bool, AppError>;

    // --- Sessions (owned by the auth collaborator) ---
    async fn get_session(&self, sid: &str) -> Result<Option<SessionRecord>, AppError>;
    async fn put_session(&self, record: SessionRecord) -> Result<(), AppError>;
    async fn delete_session(&self, sid: &str) -> Result<bool, AppError>;
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
