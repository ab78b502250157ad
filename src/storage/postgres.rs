// src/storage/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

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

use super::{Storage, TenantDeletePolicy};

/// Relational backend. One table per entity mirroring the model structs;
/// integer ids come from the store's own sequences, opaque string ids are
/// minted application-side. Connectivity failures propagate as fatal.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
    delete_policy: TenantDeletePolicy,
}

impl PgStorage {
    pub fn new(pool: PgPool, delete_policy: TenantDeletePolicy) -> Self {
        Self {
            pool,
            delete_policy,
        }
    }
}

/// Converts a unique-constraint violation on the users table into the
/// matching domain conflict; anything else stays a database error.
fn map_user_insert_err(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                if constraint.contains("username") {
                    return AppError::UsernameAlreadyExists;
                }
                if constraint.contains("email") {
                    return AppError::EmailAlreadyExists;
                }
            }
        }
    }
    e.into()
}

/// Inserts a user. Generic over the executor so the signup transaction and
/// the plain create path share one statement.
async fn insert_user<'e, E>(
    executor: E,
    user: NewUser,
    brewery_id: Option<&str>,
    role: Role,
) -> Result<User, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, password, first_name, last_name, brewery_id, role, profile_image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user.username)
    .bind(user.email)
    .bind(user.password)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(brewery_id)
    .bind(role)
    .bind(user.profile_image_url)
    .fetch_one(executor)
    .await
    .map_err(map_user_insert_err)
}

async fn insert_brewery<'e, E>(executor: E, brewery: NewBrewery) -> Result<Brewery, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let brewery_record = sqlx::query_as::<_, Brewery>(
        r#"
        INSERT INTO breweries (id, name, type, location, founded_year, website, phone, brewing_capacity, specialties)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(brewery.name)
    .bind(brewery.brewery_type)
    .bind(brewery.location)
    .bind(brewery.founded_year)
    .bind(brewery.website)
    .bind(brewery.phone)
    .bind(brewery.brewing_capacity)
    .bind(brewery.specialties)
    .fetch_one(executor)
    .await?;
    Ok(brewery_record)
}

/// Case-preserving exact-match uniqueness probe, run before user inserts so
/// a duplicate surfaces as a domain conflict even if the constraint name
/// ever changes.
async fn check_user_identity(
    conn: &mut PgConnection,
    username: &str,
    email: &str,
) -> Result<(), AppError> {
    let username_taken: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&mut *conn)
            .await?;
    if username_taken {
        return Err(AppError::UsernameAlreadyExists);
    }
    let email_taken: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&mut *conn)
            .await?;
    if email_taken {
        return Err(AppError::EmailAlreadyExists);
    }
    Ok(())
}

/// Schedule references must exist and belong to the schedule's brewery.
async fn check_schedule_refs(
    conn: &mut PgConnection,
    brewery_id: Option<&str>,
    recipe_id: Option<i32>,
    equipment_id: Option<i32>,
) -> Result<(), AppError> {
    if let Some(rid) = recipe_id {
        let owner: Option<Option<String>> =
            sqlx::query_scalar("SELECT brewery_id FROM recipes WHERE id = $1")
                .bind(rid)
                .fetch_optional(&mut *conn)
                .await?;
        match owner {
            None => return Err(AppError::BrokenReference("recipe")),
            Some(owner) if owner.as_deref() != brewery_id => {
                return Err(AppError::CrossTenantReference("recipe"));
            }
            Some(_) => {}
        }
    }
    if let Some(eid) = equipment_id {
        let owner: Option<Option<String>> =
            sqlx::query_scalar("SELECT brewery_id FROM equipment WHERE id = $1")
                .bind(eid)
                .fetch_optional(&mut *conn)
                .await?;
        match owner {
            None => return Err(AppError::BrokenReference("equipment")),
            Some(owner) if owner.as_deref() != brewery_id => {
                return Err(AppError::CrossTenantReference("equipment"));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

async fn check_ingredient_ref(
    conn: &mut PgConnection,
    brewery_id: Option<&str>,
    ingredient_id: i32,
) -> Result<(), AppError> {
    let owner: Option<Option<String>> =
        sqlx::query_scalar("SELECT brewery_id FROM inventory_items WHERE id = $1")
            .bind(ingredient_id)
            .fetch_optional(&mut *conn)
            .await?;
    match owner {
        None => Err(AppError::BrokenReference("inventory item")),
        Some(owner) if owner.as_deref() != brewery_id => {
            Err(AppError::CrossTenantReference("inventory item"))
        }
        Some(_) => Ok(()),
    }
}

#[async_trait]
impl Storage for PgStorage {
    // --- Users ---

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut conn = self.pool.acquire().await?;
        check_user_identity(&mut *conn, &user.username, &user.email).await?;
        let role = user.role;
        // A fresh user starts tenant-less; joining a brewery is explicit.
        insert_user(&mut *conn, user, None, role).await
    }

    // --- Breweries ---

    async fn create_brewery(&self, brewery: NewBrewery) -> Result<Brewery, AppError> {
        insert_brewery(&self.pool, brewery).await
    }

    async fn create_brewery_with_owner(
        &self,
        brewery: NewBrewery,
        owner: NewUser,
    ) -> Result<(Brewery, User), AppError> {
        // Tenant and first user are created together or not at all; any
        // failure past this point rolls the whole signup back.
        let mut tx = self.pool.begin().await?;
        check_user_identity(&mut *tx, &owner.username, &owner.email).await?;
        let brewery_record = insert_brewery(&mut *tx, brewery).await?;
        let role = owner.role;
        let user = insert_user(&mut *tx, owner, Some(&brewery_record.id), role).await?;
        tx.commit().await?;
        Ok((brewery_record, user))
    }

    async fn get_brewery(&self, id: &str) -> Result<Option<Brewery>, AppError> {
        let brewery = sqlx::query_as::<_, Brewery>("SELECT * FROM breweries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(brewery)
    }

    async fn update_brewery(
        &self,
        id: &str,
        patch: BreweryPatch,
    ) -> Result<Option<Brewery>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(mut brewery) =
            sqlx::query_as::<_, Brewery>("SELECT * FROM breweries WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };
        patch.apply(&mut brewery);
        brewery.updated_at = Utc::now();
        sqlx::query(
            r#"
            UPDATE breweries
            SET name = $2, type = $3, location = $4, founded_year = $5, website = $6,
                phone = $7, brewing_capacity = $8, specialties = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&brewery.name)
        .bind(&brewery.brewery_type)
        .bind(&brewery.location)
        .bind(brewery.founded_year)
        .bind(&brewery.website)
        .bind(&brewery.phone)
        .bind(&brewery.brewing_capacity)
        .bind(&brewery.specialties)
        .bind(brewery.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(brewery))
    }

    async fn delete_brewery(&self, id: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM breweries WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Ok(false);
        }

        let has_children: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM inventory_items WHERE brewery_id = $1)
                OR EXISTS (SELECT 1 FROM equipment WHERE brewery_id = $1)
                OR EXISTS (SELECT 1 FROM recipes WHERE brewery_id = $1)
                OR EXISTS (SELECT 1 FROM brewing_schedules WHERE brewery_id = $1)
                OR EXISTS (SELECT 1 FROM ingredient_sources WHERE brewery_id = $1)
                OR EXISTS (SELECT 1 FROM ingredient_price_history WHERE brewery_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if self.delete_policy == TenantDeletePolicy::Restrict && has_children {
            return Err(AppError::BreweryNotEmpty);
        }

        if self.delete_policy == TenantDeletePolicy::Cascade {
            // Children first, in foreign-key order.
            sqlx::query("DELETE FROM ingredient_price_history WHERE brewery_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM brewing_schedules WHERE brewery_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM inventory_items WHERE brewery_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM equipment WHERE brewery_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM recipes WHERE brewery_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM ingredient_sources WHERE brewery_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        // Members are unlinked, never deleted: accounts are global.
        sqlx::query(
            "UPDATE users SET brewery_id = NULL, role = $2, updated_at = NOW() WHERE brewery_id = $1",
        )
        .bind(id)
        .bind(Role::Member)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM breweries WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn list_breweries(&self) -> Result<Vec<Brewery>, AppError> {
        let breweries = sqlx::query_as::<_, Brewery>("SELECT * FROM breweries ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(breweries)
    }

    async fn add_user_to_brewery(
        &self,
        user_id: &str,
        brewery_id: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;
        let brewery_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM breweries WHERE id = $1)")
                .bind(brewery_id)
                .fetch_one(&mut *tx)
                .await?;
        if !brewery_exists {
            // Route-level validation has already confirmed existence, so a
            // miss here is a programmer error, not a user-facing NotFound.
            return Err(AppError::Internal(anyhow::anyhow!(
                "brewery {brewery_id} does not exist"
            )));
        }
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET brewery_id = $2, role = $3, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(brewery_id)
        .bind(role)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user {user_id} does not exist")))?;
        tx.commit().await?;
        Ok(user)
    }

    async fn remove_user_from_brewery(&self, user_id: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET brewery_id = NULL, role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(Role::Member)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user {user_id} does not exist")))?;
        Ok(user)
    }

    async fn list_brewery_users(&self, brewery_id: &str) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE brewery_id = $1 ORDER BY username ASC",
        )
        .bind(brewery_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // --- Inventory ---

    async fn list_inventory_items(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<InventoryItem>, AppError> {
        let items = match brewery_id {
            Some(bid) => {
                sqlx::query_as::<_, InventoryItem>(
                    "SELECT * FROM inventory_items WHERE brewery_id = $1 ORDER BY name ASC",
                )
                .bind(bid)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, InventoryItem>(
                    "SELECT * FROM inventory_items ORDER BY name ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(items)
    }

    async fn get_inventory_item(&self, id: i32) -> Result<Option<InventoryItem>, AppError> {
        let item =
            sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(item)
    }

    async fn create_inventory_item(
        &self,
        brewery_id: Option<&str>,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, AppError> {
        let record = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items
                (brewery_id, name, quantity, current_quantity, minimum_quantity, unit, location,
                 expiration_date, cost, supplier, barcode, category, notes, image_url, status, forecast)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(brewery_id)
        .bind(item.name)
        .bind(item.quantity)
        .bind(item.current_quantity)
        .bind(item.minimum_quantity)
        .bind(item.unit)
        .bind(item.location)
        .bind(item.expiration_date)
        .bind(item.cost)
        .bind(item.supplier)
        .bind(item.barcode)
        .bind(item.category)
        .bind(item.notes)
        .bind(item.image_url)
        .bind(item.status)
        .bind(item.forecast)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update_inventory_item(
        &self,
        id: i32,
        patch: InventoryItemPatch,
    ) -> Result<Option<InventoryItem>, AppError> {
        // Read-merge-write under a row lock so both backends share the
        // same merge semantics (Patch::apply) exactly.
        let mut tx = self.pool.begin().await?;
        let Some(mut item) = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };
        patch.apply(&mut item);
        item.updated_at = Utc::now();
        sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = $2, quantity = $3, current_quantity = $4, minimum_quantity = $5,
                unit = $6, location = $7, expiration_date = $8, cost = $9, supplier = $10,
                barcode = $11, category = $12, notes = $13, image_url = $14, status = $15,
                forecast = $16, updated_at = $17
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.current_quantity)
        .bind(item.minimum_quantity)
        .bind(&item.unit)
        .bind(&item.location)
        .bind(item.expiration_date)
        .bind(item.cost)
        .bind(&item.supplier)
        .bind(&item.barcode)
        .bind(&item.category)
        .bind(&item.notes)
        .bind(&item.image_url)
        .bind(&item.status)
        .bind(&item.forecast)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(item))
    }

    async fn delete_inventory_item(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Equipment ---

    async fn list_equipment(&self, brewery_id: Option<&str>) -> Result<Vec<Equipment>, AppError> {
        let equipment = match brewery_id {
            Some(bid) => {
                sqlx::query_as::<_, Equipment>(
                    "SELECT * FROM equipment WHERE brewery_id = $1 ORDER BY name ASC",
                )
                .bind(bid)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Equipment>("SELECT * FROM equipment ORDER BY name ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(equipment)
    }

    async fn get_equipment(&self, id: i32) -> Result<Option<Equipment>, AppError> {
        let equipment = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(equipment)
    }

    async fn create_equipment(
        &self,
        brewery_id: Option<&str>,
        equipment: NewEquipment,
    ) -> Result<Equipment, AppError> {
        let record = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment
                (brewery_id, name, type, capacity, status, location, purchase_date,
                 last_maintenance, next_maintenance, notes, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(brewery_id)
        .bind(equipment.name)
        .bind(equipment.equipment_type)
        .bind(equipment.capacity)
        .bind(equipment.status)
        .bind(equipment.location)
        .bind(equipment.purchase_date)
        .bind(equipment.last_maintenance)
        .bind(equipment.next_maintenance)
        .bind(equipment.notes)
        .bind(equipment.image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update_equipment(
        &self,
        id: i32,
        patch: EquipmentPatch,
    ) -> Result<Option<Equipment>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(mut equipment) =
            sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };
        patch.apply(&mut equipment);
        equipment.updated_at = Utc::now();
        sqlx::query(
            r#"
            UPDATE equipment
            SET name = $2, type = $3, capacity = $4, status = $5, location = $6,
                purchase_date = $7, last_maintenance = $8, next_maintenance = $9,
                notes = $10, image_url = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&equipment.name)
        .bind(&equipment.equipment_type)
        .bind(&equipment.capacity)
        .bind(equipment.status)
        .bind(&equipment.location)
        .bind(equipment.purchase_date)
        .bind(equipment.last_maintenance)
        .bind(equipment.next_maintenance)
        .bind(&equipment.notes)
        .bind(&equipment.image_url)
        .bind(equipment.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(equipment))
    }

    async fn delete_equipment(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Recipes ---

    async fn list_recipes(&self, brewery_id: Option<&str>) -> Result<Vec<Recipe>, AppError> {
        let recipes = match brewery_id {
            Some(bid) => {
                sqlx::query_as::<_, Recipe>(
                    "SELECT * FROM recipes WHERE brewery_id = $1 ORDER BY name ASC",
                )
                .bind(bid)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Recipe>("SELECT * FROM recipes ORDER BY name ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(recipes)
    }

    async fn get_recipe(&self, id: i32) -> Result<Option<Recipe>, AppError> {
        let recipe = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(recipe)
    }

    async fn create_recipe(
        &self,
        brewery_id: Option<&str>,
        recipe: NewRecipe,
    ) -> Result<Recipe, AppError> {
        let record = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes
                (brewery_id, name, style, batch_size, target_abv, target_ibu, srm,
                 ingredients, instructions, fermentation_temp, fermentation_time,
                 description, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(brewery_id)
        .bind(recipe.name)
        .bind(recipe.style)
        .bind(recipe.batch_size)
        .bind(recipe.target_abv)
        .bind(recipe.target_ibu)
        .bind(recipe.srm)
        .bind(recipe.ingredients)
        .bind(recipe.instructions)
        .bind(recipe.fermentation_temp)
        .bind(recipe.fermentation_time)
        .bind(recipe.description)
        .bind(recipe.image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update_recipe(
        &self,
        id: i32,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(mut recipe) =
            sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };
        patch.apply(&mut recipe);
        recipe.updated_at = Utc::now();
        sqlx::query(
            r#"
            UPDATE recipes
            SET name = $2, style = $3, batch_size = $4, target_abv = $5, target_ibu = $6,
                srm = $7, ingredients = $8, instructions = $9, fermentation_temp = $10,
                fermentation_time = $11, description = $12, image_url = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&recipe.name)
        .bind(&recipe.style)
        .bind(recipe.batch_size)
        .bind(recipe.target_abv)
        .bind(recipe.target_ibu)
        .bind(recipe.srm)
        .bind(&recipe.ingredients)
        .bind(&recipe.instructions)
        .bind(&recipe.fermentation_temp)
        .bind(&recipe.fermentation_time)
        .bind(&recipe.description)
        .bind(&recipe.image_url)
        .bind(recipe.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(recipe))
    }

    async fn delete_recipe(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Brewing schedules ---

    async fn list_brewing_schedules(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<BrewingSchedule>, AppError> {
        let schedules = match brewery_id {
            Some(bid) => {
                sqlx::query_as::<_, BrewingSchedule>(
                    "SELECT * FROM brewing_schedules WHERE brewery_id = $1 ORDER BY start_date ASC",
                )
                .bind(bid)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, BrewingSchedule>(
                    "SELECT * FROM brewing_schedules ORDER BY start_date ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(schedules)
    }

    async fn get_brewing_schedule(&self, id: i32) -> Result<Option<BrewingSchedule>, AppError> {
        let schedule =
            sqlx::query_as::<_, BrewingSchedule>("SELECT * FROM brewing_schedules WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(schedule)
    }

    async fn create_brewing_schedule(
        &self,
        brewery_id: Option<&str>,
        schedule: NewBrewingSchedule,
    ) -> Result<BrewingSchedule, AppError> {
        if schedule.end_date < schedule.start_date {
            return Err(AppError::InvalidDateRange);
        }
        let mut tx = self.pool.begin().await?;
        check_schedule_refs(&mut *tx, brewery_id, schedule.recipe_id, schedule.equipment_id)
            .await?;
        let record = sqlx::query_as::<_, BrewingSchedule>(
            r#"
            INSERT INTO brewing_schedules
                (brewery_id, title, description, recipe_id, equipment_id, start_date,
                 end_date, status, batch_size, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(brewery_id)
        .bind(schedule.title)
        .bind(schedule.description)
        .bind(schedule.recipe_id)
        .bind(schedule.equipment_id)
        .bind(schedule.start_date)
        .bind(schedule.end_date)
        .bind(schedule.status)
        .bind(schedule.batch_size)
        .bind(schedule.notes)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn update_brewing_schedule(
        &self,
        id: i32,
        patch: BrewingSchedulePatch,
    ) -> Result<Option<BrewingSchedule>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(mut schedule) = sqlx::query_as::<_, BrewingSchedule>(
            "SELECT * FROM brewing_schedules WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };
        patch.apply(&mut schedule);
        if !schedule.dates_ordered() {
            return Err(AppError::InvalidDateRange);
        }
        check_schedule_refs(
            &mut tx,
            schedule.brewery_id.as_deref(),
            schedule.recipe_id,
            schedule.equipment_id,
        )
        .await?;
        schedule.updated_at = Utc::now();
        sqlx::query(
            r#"
            UPDATE brewing_schedules
            SET title = $2, description = $3, recipe_id = $4, equipment_id = $5,
                start_date = $6, end_date = $7, status = $8, batch_size = $9,
                notes = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&schedule.title)
        .bind(&schedule.description)
        .bind(schedule.recipe_id)
        .bind(schedule.equipment_id)
        .bind(schedule.start_date)
        .bind(schedule.end_date)
        .bind(schedule.status)
        .bind(schedule.batch_size)
        .bind(&schedule.notes)
        .bind(schedule.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(schedule))
    }

    async fn delete_brewing_schedule(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM brewing_schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Ingredient sources ---

    async fn list_ingredient_sources(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<IngredientSource>, AppError> {
        let sources = match brewery_id {
            Some(bid) => {
                sqlx::query_as::<_, IngredientSource>(
                    "SELECT * FROM ingredient_sources WHERE brewery_id = $1 ORDER BY name ASC",
                )
                .bind(bid)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, IngredientSource>(
                    "SELECT * FROM ingredient_sources ORDER BY name ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(sources)
    }

    async fn get_ingredient_source(
        &self,
        id: i32,
    ) -> Result<Option<IngredientSource>, AppError> {
        let source =
            sqlx::query_as::<_, IngredientSource>("SELECT * FROM ingredient_sources WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(source)
    }

    async fn create_ingredient_source(
        &self,
        brewery_id: Option<&str>,
        source: NewIngredientSource,
    ) -> Result<IngredientSource, AppError> {
        let record = sqlx::query_as::<_, IngredientSource>(
            r#"
            INSERT INTO ingredient_sources
                (brewery_id, name, type, supplier, location, contact, rating, notes,
                 latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(brewery_id)
        .bind(source.name)
        .bind(source.source_type)
        .bind(source.supplier)
        .bind(source.location)
        .bind(source.contact)
        .bind(source.rating)
        .bind(source.notes)
        .bind(source.latitude)
        .bind(source.longitude)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update_ingredient_source(
        &self,
        id: i32,
        patch: IngredientSourcePatch,
    ) -> Result<Option<IngredientSource>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(mut source) = sqlx::query_as::<_, IngredientSource>(
            "SELECT * FROM ingredient_sources WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };
        patch.apply(&mut source);
        source.updated_at = Utc::now();
        sqlx::query(
            r#"
            UPDATE ingredient_sources
            SET name = $2, type = $3, supplier = $4, location = $5, contact = $6,
                rating = $7, notes = $8, latitude = $9, longitude = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&source.name)
        .bind(&source.source_type)
        .bind(&source.supplier)
        .bind(&source.location)
        .bind(&source.contact)
        .bind(source.rating)
        .bind(&source.notes)
        .bind(source.latitude)
        .bind(source.longitude)
        .bind(source.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(source))
    }

    async fn delete_ingredient_source(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM ingredient_sources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Price history ---

    async fn list_price_history(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<PriceHistoryEntry>, AppError> {
        let entries = match brewery_id {
            Some(bid) => {
                sqlx::query_as::<_, PriceHistoryEntry>(
                    "SELECT * FROM ingredient_price_history WHERE brewery_id = $1 ORDER BY date DESC",
                )
                .bind(bid)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PriceHistoryEntry>(
                    "SELECT * FROM ingredient_price_history ORDER BY date DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(entries)
    }

    async fn list_price_history_for_ingredient(
        &self,
        ingredient_id: i32,
    ) -> Result<Vec<PriceHistoryEntry>, AppError> {
        let entries = sqlx::query_as::<_, PriceHistoryEntry>(
            "SELECT * FROM ingredient_price_history WHERE ingredient_id = $1 ORDER BY date DESC",
        )
        .bind(ingredient_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn create_price_history_entry(
        &self,
        brewery_id: Option<&str>,
        entry: NewPriceHistoryEntry,
    ) -> Result<PriceHistoryEntry, AppError> {
        let mut tx = self.pool.begin().await?;
        check_ingredient_ref(&mut *tx, brewery_id, entry.ingredient_id).await?;
        let record = sqlx::query_as::<_, PriceHistoryEntry>(
            r#"
            INSERT INTO ingredient_price_history
                (brewery_id, ingredient_id, price, supplier, date, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(brewery_id)
        .bind(entry.ingredient_id)
        .bind(entry.price)
        .bind(entry.supplier)
        .bind(entry.date)
        .bind(entry.notes)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn update_price_history_entry(
        &self,
        id: i32,
        patch: PriceHistoryPatch,
    ) -> Result<Option<PriceHistoryEntry>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(mut entry) = sqlx::query_as::<_, PriceHistoryEntry>(
            "SELECT * FROM ingredient_price_history WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };
        patch.apply(&mut entry);
        check_ingredient_ref(&mut *tx, entry.brewery_id.as_deref(), entry.ingredient_id).await?;
        sqlx::query(
            r#"
            UPDATE ingredient_price_history
            SET ingredient_id = $2, price = $3, supplier = $4, date = $5, notes = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(entry.ingredient_id)
        .bind(entry.price)
        .bind(&entry.supplier)
        .bind(entry.date)
        .bind(&entry.notes)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(entry))
    }

    async fn delete_price_history_entry(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM ingredient_price_history WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Sessions ---

    async fn get_session(&self, sid: &str) -> Result<Option<SessionRecord>, AppError> {
        let record = sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE sid = $1")
            .bind(sid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn put_session(&self, record: SessionRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (sid, sess, expire)
            VALUES ($1, $2, $3)
            ON CONFLICT (sid) DO UPDATE SET sess = EXCLUDED.sess, expire = EXCLUDED.expire
            "#,
        )
        .bind(record.sid)
        .bind(record.sess)
        .bind(record.expire)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_session(&self, sid: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE sid = $1")
            .bind(sid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expire <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
