// src/storage/memory.rs

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::brewery::{Brewery, BreweryPatch, NewBrewery};
use crate::models::equipment::{Equipment, EquipmentPatch, EquipmentStatus, NewEquipment};
use crate::models::inventory::{InventoryItem, InventoryItemPatch, NewInventoryItem};
use crate::models::price_history::{NewPriceHistoryEntry, PriceHistoryEntry, PriceHistoryPatch};
use crate::models::recipe::{NewRecipe, Recipe, RecipePatch};
use crate::models::schedule::{
    BrewingSchedule, BrewingSchedulePatch, NewBrewingSchedule, ScheduleStatus,
};
use crate::models::session::SessionRecord;
use crate::models::source::{IngredientSource, IngredientSourcePatch, NewIngredientSource};
use crate::models::user::{NewUser, Role, User};

use super::{Storage, TenantDeletePolicy};

/// Map-backed backend for tests and demo deployments.
///
/// One ordered map per entity type, keyed by id, plus an independent
/// auto-increment counter per integer-id entity type (each starts at 1).
/// Brewery, user and session ids are random opaque strings.
pub struct MemStorage {
    state: RwLock<MemState>,
    delete_policy: TenantDeletePolicy,
}

#[derive(Default)]
struct MemState {
    breweries: BTreeMap<String, Brewery>,
    users: BTreeMap<String, User>,
    inventory: BTreeMap<i32, InventoryItem>,
    equipment: BTreeMap<i32, Equipment>,
    recipes: BTreeMap<i32, Recipe>,
    schedules: BTreeMap<i32, BrewingSchedule>,
    sources: BTreeMap<i32, IngredientSource>,
    price_history: BTreeMap<i32, PriceHistoryEntry>,
    sessions: BTreeMap<String, SessionRecord>,

    next_inventory_id: i32,
    next_equipment_id: i32,
    next_recipe_id: i32,
    next_schedule_id: i32,
    next_source_id: i32,
    next_price_id: i32,
}

impl MemStorage {
    /// Constructs the backend and seeds it with demo rows (one sample user
    /// plus example inventory/equipment/recipes/schedules, all tenant-less).
    /// Seeding is a demo convenience, not a correctness requirement.
    pub fn new(delete_policy: TenantDeletePolicy) -> Self {
        let mut state = MemState {
            next_inventory_id: 1,
            next_equipment_id: 1,
            next_recipe_id: 1,
            next_schedule_id: 1,
            next_source_id: 1,
            next_price_id: 1,
            ..MemState::default()
        };
        seed_demo_data(&mut state);
        Self {
            state: RwLock::new(state),
            delete_policy,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemState>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::Internal(anyhow!("storage lock poisoned")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemState>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::Internal(anyhow!("storage lock poisoned")))
    }
}

fn tenant_matches(owner: Option<&str>, filter: &str) -> bool {
    owner == Some(filter)
}

// Insert helpers shared by the trait methods and the seed routine. Each one
// fills every optional field explicitly, stamps both timestamps and assigns
// the next id from the entity's own counter.

fn insert_user(state: &mut MemState, user: NewUser) -> Result<User, AppError> {
    // Global uniqueness, case-preserving exact match.
    if state.users.values().any(|u| u.username == user.username) {
        return Err(AppError::UsernameAlreadyExists);
    }
    if state.users.values().any(|u| u.email == user.email) {
        return Err(AppError::EmailAlreadyExists);
    }
    let now = Utc::now();
    let record = User {
        id: Uuid::new_v4().to_string(),
        username: user.username,
        email: user.email,
        password: user.password,
        first_name: user.first_name,
        last_name: user.last_name,
        brewery_id: None,
        role: user.role,
        profile_image_url: user.profile_image_url,
        created_at: now,
        updated_at: now,
    };
    state.users.insert(record.id.clone(), record.clone());
    Ok(record)
}

fn insert_brewery(state: &mut MemState, brewery: NewBrewery) -> Brewery {
    let now = Utc::now();
    // Tenant roots get random unique ids, not sequential ones.
    let record = Brewery {
        id: Uuid::new_v4().to_string(),
        name: brewery.name,
        brewery_type: brewery.brewery_type,
        location: brewery.location,
        founded_year: brewery.founded_year,
        website: brewery.website,
        phone: brewery.phone,
        brewing_capacity: brewery.brewing_capacity,
        specialties: brewery.specialties,
        created_at: now,
        updated_at: now,
    };
    state.breweries.insert(record.id.clone(), record.clone());
    record
}

fn insert_inventory(
    state: &mut MemState,
    brewery_id: Option<&str>,
    item: NewInventoryItem,
) -> InventoryItem {
    let id = state.next_inventory_id;
    state.next_inventory_id += 1;
    let now = Utc::now();
    let record = InventoryItem {
        id,
        brewery_id: brewery_id.map(str::to_string),
        name: item.name,
        quantity: item.quantity,
        current_quantity: item.current_quantity,
        minimum_quantity: item.minimum_quantity,
        unit: item.unit,
        location: item.location,
        expiration_date: item.expiration_date,
        cost: item.cost,
        supplier: item.supplier,
        barcode: item.barcode,
        category: item.category,
        notes: item.notes,
        image_url: item.image_url,
        status: item.status,
        forecast: item.forecast,
        created_at: now,
        updated_at: now,
    };
    state.inventory.insert(id, record.clone());
    record
}

fn insert_equipment(
    state: &mut MemState,
    brewery_id: Option<&str>,
    equipment: NewEquipment,
) -> Equipment {
    let id = state.next_equipment_id;
    state.next_equipment_id += 1;
    let now = Utc::now();
    let record = Equipment {
        id,
        brewery_id: brewery_id.map(str::to_string),
        name: equipment.name,
        equipment_type: equipment.equipment_type,
        capacity: equipment.capacity,
        status: equipment.status,
        location: equipment.location,
        purchase_date: equipment.purchase_date,
        last_maintenance: equipment.last_maintenance,
        next_maintenance: equipment.next_maintenance,
        notes: equipment.notes,
        image_url: equipment.image_url,
        created_at: now,
        updated_at: now,
    };
    state.equipment.insert(id, record.clone());
    record
}

fn insert_recipe(state: &mut MemState, brewery_id: Option<&str>, recipe: NewRecipe) -> Recipe {
    let id = state.next_recipe_id;
    state.next_recipe_id += 1;
    let now = Utc::now();
    let record = Recipe {
        id,
        brewery_id: brewery_id.map(str::to_string),
        name: recipe.name,
        style: recipe.style,
        batch_size: recipe.batch_size,
        target_abv: recipe.target_abv,
        target_ibu: recipe.target_ibu,
        srm: recipe.srm,
        ingredients: recipe.ingredients,
        instructions: recipe.instructions,
        fermentation_temp: recipe.fermentation_temp,
        fermentation_time: recipe.fermentation_time,
        description: recipe.description,
        image_url: recipe.image_url,
        created_at: now,
        updated_at: now,
    };
    state.recipes.insert(id, record.clone());
    record
}

/// Recipe/equipment references on a schedule must exist and live in the
/// same brewery as the schedule itself.
fn check_schedule_refs(
    state: &MemState,
    brewery_id: Option<&str>,
    recipe_id: Option<i32>,
    equipment_id: Option<i32>,
) -> Result<(), AppError> {
    if let Some(rid) = recipe_id {
        match state.recipes.get(&rid) {
            None => return Err(AppError::BrokenReference("recipe")),
            Some(r) if r.brewery_id.as_deref() != brewery_id => {
                return Err(AppError::CrossTenantReference("recipe"));
            }
            Some(_) => {}
        }
    }
    if let Some(eid) = equipment_id {
        match state.equipment.get(&eid) {
            None => return Err(AppError::BrokenReference("equipment")),
            Some(e) if e.brewery_id.as_deref() != brewery_id => {
                return Err(AppError::CrossTenantReference("equipment"));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn check_ingredient_ref(
    state: &MemState,
    brewery_id: Option<&str>,
    ingredient_id: i32,
) -> Result<(), AppError> {
    match state.inventory.get(&ingredient_id) {
        None => Err(AppError::BrokenReference("inventory item")),
        Some(item) if item.brewery_id.as_deref() != brewery_id => {
            Err(AppError::CrossTenantReference("inventory item"))
        }
        Some(_) => Ok(()),
    }
}

fn insert_schedule(
    state: &mut MemState,
    brewery_id: Option<&str>,
    schedule: NewBrewingSchedule,
) -> Result<BrewingSchedule, AppError> {
    check_schedule_refs(state, brewery_id, schedule.recipe_id, schedule.equipment_id)?;
    if schedule.end_date < schedule.start_date {
        return Err(AppError::InvalidDateRange);
    }
    let id = state.next_schedule_id;
    state.next_schedule_id += 1;
    let now = Utc::now();
    let record = BrewingSchedule {
        id,
        brewery_id: brewery_id.map(str::to_string),
        title: schedule.title,
        description: schedule.description,
        recipe_id: schedule.recipe_id,
        equipment_id: schedule.equipment_id,
        start_date: schedule.start_date,
        end_date: schedule.end_date,
        status: schedule.status,
        batch_size: schedule.batch_size,
        notes: schedule.notes,
        created_at: now,
        updated_at: now,
    };
    state.schedules.insert(id, record.clone());
    Ok(record)
}

fn seed_demo_data(state: &mut MemState) {
    let demo_user = NewUser {
        username: "sam".to_string(),
        email: "sam@brewery.com".to_string(),
        password: bcrypt::hash("password", bcrypt::DEFAULT_COST)
            .expect("hashing static demo credentials"),
        first_name: "Sam".to_string(),
        last_name: "Brewer".to_string(),
        role: Role::Member,
        profile_image_url: None,
    };
    // A fresh state has no users, so this cannot conflict.
    let _ = insert_user(state, demo_user);

    insert_inventory(
        state,
        None,
        NewInventoryItem {
            name: "Cascade Hops".to_string(),
            quantity: 5,
            current_quantity: 5,
            minimum_quantity: 10,
            unit: "kg".to_string(),
            location: Some("Storage A".to_string()),
            expiration_date: None,
            cost: Some(Decimal::new(1599, 2)),
            supplier: Some("Hop Supplier Inc".to_string()),
            barcode: Some("123456789".to_string()),
            category: Some("Hops".to_string()),
            notes: Some("Critical level".to_string()),
            image_url: None,
            status: "good".to_string(),
            forecast: "Sufficient".to_string(),
        },
    );
    insert_inventory(
        state,
        None,
        NewInventoryItem {
            name: "Pilsner Malt".to_string(),
            quantity: 75,
            current_quantity: 75,
            minimum_quantity: 50,
            unit: "kg".to_string(),
            location: Some("Storage B".to_string()),
            expiration_date: None,
            cost: Some(Decimal::new(399, 2)),
            supplier: Some("Malt House".to_string()),
            barcode: Some("987654321".to_string()),
            category: Some("Malt".to_string()),
            notes: Some("Warning level".to_string()),
            image_url: None,
            status: "good".to_string(),
            forecast: "Sufficient".to_string(),
        },
    );

    let now = Utc::now();
    insert_equipment(
        state,
        None,
        NewEquipment {
            name: "Brew Kettle #1".to_string(),
            equipment_type: "kettle".to_string(),
            capacity: Some("500L".to_string()),
            status: EquipmentStatus::Active,
            location: Some("Brewhouse".to_string()),
            purchase_date: Some(now - Duration::days(400)),
            last_maintenance: Some(now - Duration::days(120)),
            next_maintenance: Some(now + Duration::days(60)),
            notes: Some("Regular maintenance required".to_string()),
            image_url: None,
        },
    );
    insert_equipment(
        state,
        None,
        NewEquipment {
            name: "Fermenter #2".to_string(),
            equipment_type: "fermenter".to_string(),
            capacity: Some("1000L".to_string()),
            status: EquipmentStatus::Active,
            location: Some("Fermentation Room".to_string()),
            purchase_date: Some(now - Duration::days(370)),
            last_maintenance: Some(now - Duration::days(105)),
            next_maintenance: Some(now + Duration::days(75)),
            notes: Some("Temperature control working properly".to_string()),
            image_url: None,
        },
    );

    let kolsch = insert_recipe(
        state,
        None,
        NewRecipe {
            name: "Summer Kolsch".to_string(),
            style: Some("Kolsch".to_string()),
            batch_size: Some(Decimal::new(500, 0)),
            target_abv: Some(Decimal::new(48, 1)),
            target_ibu: Some(22),
            srm: Some(4),
            ingredients: vec![
                "Pilsner Malt".to_string(),
                "Vienna Malt".to_string(),
                "Cascade Hops".to_string(),
                "Kolsch Yeast".to_string(),
            ],
            instructions: vec![
                "Mash at 152F for 60 minutes".to_string(),
                "Boil for 60 minutes".to_string(),
                "Ferment at 60F for 10 days".to_string(),
            ],
            fermentation_temp: Some("60F".to_string()),
            fermentation_time: Some("10 days".to_string()),
            description: Some(
                "Light, crisp and refreshing German-style ale perfect for summer".to_string(),
            ),
            image_url: None,
        },
    );
    let vienna = insert_recipe(
        state,
        None,
        NewRecipe {
            name: "Vienna Lager".to_string(),
            style: Some("Vienna Lager".to_string()),
            batch_size: Some(Decimal::new(500, 0)),
            target_abv: Some(Decimal::new(52, 1)),
            target_ibu: Some(25),
            srm: Some(11),
            ingredients: vec![
                "Vienna Malt".to_string(),
                "Munich Malt".to_string(),
                "Saaz Hops".to_string(),
                "Lager Yeast".to_string(),
            ],
            instructions: vec![
                "Mash at 154F for 60 minutes".to_string(),
                "Boil for 90 minutes".to_string(),
                "Ferment at 50F for 14 days".to_string(),
                "Lager for 4 weeks".to_string(),
            ],
            fermentation_temp: Some("50F".to_string()),
            fermentation_time: Some("14 days".to_string()),
            description: Some("Traditional amber lager with toasty malt character".to_string()),
            image_url: None,
        },
    );

    let _ = insert_schedule(
        state,
        None,
        NewBrewingSchedule {
            title: "Summer Kolsch Batch #1242".to_string(),
            description: Some("First batch of Summer Kolsch for the season".to_string()),
            recipe_id: Some(kolsch.id),
            equipment_id: Some(1),
            start_date: now - Duration::days(2),
            end_date: now + Duration::days(8),
            status: ScheduleStatus::InProgress,
            batch_size: Some(Decimal::new(500, 0)),
            notes: Some("Targeting lower fermentation temperature".to_string()),
        },
    );
    let _ = insert_schedule(
        state,
        None,
        NewBrewingSchedule {
            title: "Vienna Lager Batch #1243".to_string(),
            description: Some("Monthly Vienna Lager batch".to_string()),
            recipe_id: Some(vienna.id),
            equipment_id: Some(2),
            start_date: now + Duration::days(5),
            end_date: now + Duration::days(36),
            status: ScheduleStatus::Scheduled,
            batch_size: Some(Decimal::new(500, 0)),
            notes: Some("Extended lagering period".to_string()),
        },
    );
}

#[async_trait]
impl Storage for MemStorage {
    // --- Users ---

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.write()?;
        insert_user(&mut state, user)
    }

    // --- Breweries ---

    async fn create_brewery(&self, brewery: NewBrewery) -> Result<Brewery, AppError> {
        let mut state = self.write()?;
        Ok(insert_brewery(&mut state, brewery))
    }

    async fn create_brewery_with_owner(
        &self,
        brewery: NewBrewery,
        owner: NewUser,
    ) -> Result<(Brewery, User), AppError> {
        // One write lock spans the whole operation, so a uniqueness failure
        // on the user leaves no half-created tenant behind.
        let mut state = self.write()?;
        if state.users.values().any(|u| u.username == owner.username) {
            return Err(AppError::UsernameAlreadyExists);
        }
        if state.users.values().any(|u| u.email == owner.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let role = owner.role;
        let new_brewery = insert_brewery(&mut state, brewery);
        let mut user = insert_user(&mut state, owner)?;
        user.brewery_id = Some(new_brewery.id.clone());
        user.role = role;
        state.users.insert(user.id.clone(), user.clone());
        Ok((new_brewery, user))
    }

    async fn get_brewery(&self, id: &str) -> Result<Option<Brewery>, AppError> {
        Ok(self.read()?.breweries.get(id).cloned())
    }

    async fn update_brewery(
        &self,
        id: &str,
        patch: BreweryPatch,
    ) -> Result<Option<Brewery>, AppError> {
        let mut state = self.write()?;
        let Some(mut brewery) = state.breweries.get(id).cloned() else {
            return Ok(None);
        };
        patch.apply(&mut brewery);
        brewery.updated_at = Utc::now();
        state.breweries.insert(id.to_string(), brewery.clone());
        Ok(Some(brewery))
    }

    async fn delete_brewery(&self, id: &str) -> Result<bool, AppError> {
        let mut state = self.write()?;
        if !state.breweries.contains_key(id) {
            return Ok(false);
        }

        let has_children = state
            .inventory
            .values()
            .any(|r| r.brewery_id.as_deref() == Some(id))
            || state
                .equipment
                .values()
                .any(|r| r.brewery_id.as_deref() == Some(id))
            || state
                .recipes
                .values()
                .any(|r| r.brewery_id.as_deref() == Some(id))
            || state
                .schedules
                .values()
                .any(|r| r.brewery_id.as_deref() == Some(id))
            || state
                .sources
                .values()
                .any(|r| r.brewery_id.as_deref() == Some(id))
            || state
                .price_history
                .values()
                .any(|r| r.brewery_id.as_deref() == Some(id));

        match self.delete_policy {
            TenantDeletePolicy::Restrict if has_children => Err(AppError::BreweryNotEmpty),
            TenantDeletePolicy::Restrict | TenantDeletePolicy::Cascade => {
                if self.delete_policy == TenantDeletePolicy::Cascade {
                    state
                        .price_history
                        .retain(|_, r| r.brewery_id.as_deref() != Some(id));
                    state
                        .schedules
                        .retain(|_, r| r.brewery_id.as_deref() != Some(id));
                    state
                        .inventory
                        .retain(|_, r| r.brewery_id.as_deref() != Some(id));
                    state
                        .equipment
                        .retain(|_, r| r.brewery_id.as_deref() != Some(id));
                    state
                        .recipes
                        .retain(|_, r| r.brewery_id.as_deref() != Some(id));
                    state
                        .sources
                        .retain(|_, r| r.brewery_id.as_deref() != Some(id));
                }
                // Members are unlinked, never deleted: accounts are global.
                let now = Utc::now();
                for user in state.users.values_mut() {
                    if user.brewery_id.as_deref() == Some(id) {
                        user.brewery_id = None;
                        user.role = Role::Member;
                        user.updated_at = now;
                    }
                }
                state.breweries.remove(id);
                Ok(true)
            }
        }
    }

    async fn list_breweries(&self) -> Result<Vec<Brewery>, AppError> {
        Ok(self.read()?.breweries.values().cloned().collect())
    }

    async fn add_user_to_brewery(
        &self,
        user_id: &str,
        brewery_id: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let mut state = self.write()?;
        if !state.breweries.contains_key(brewery_id) {
            return Err(AppError::Internal(anyhow!(
                "brewery {brewery_id} does not exist"
            )));
        }
        let Some(user) = state.users.get_mut(user_id) else {
            return Err(AppError::Internal(anyhow!("user {user_id} does not exist")));
        };
        user.brewery_id = Some(brewery_id.to_string());
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn remove_user_from_brewery(&self, user_id: &str) -> Result<User, AppError> {
        let mut state = self.write()?;
        let Some(user) = state.users.get_mut(user_id) else {
            return Err(AppError::Internal(anyhow!("user {user_id} does not exist")));
        };
        user.brewery_id = None;
        user.role = Role::Member;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list_brewery_users(&self, brewery_id: &str) -> Result<Vec<User>, AppError> {
        Ok(self
            .read()?
            .users
            .values()
            .filter(|u| tenant_matches(u.brewery_id.as_deref(), brewery_id))
            .cloned()
            .collect())
    }

    // --- Inventory ---

    async fn list_inventory_items(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<InventoryItem>, AppError> {
        let state = self.read()?;
        Ok(match brewery_id {
            Some(bid) => state
                .inventory
                .values()
                .filter(|i| tenant_matches(i.brewery_id.as_deref(), bid))
                .cloned()
                .collect(),
            None => state.inventory.values().cloned().collect(),
        })
    }

    async fn get_inventory_item(&self, id: i32) -> Result<Option<InventoryItem>, AppError> {
        Ok(self.read()?.inventory.get(&id).cloned())
    }

    async fn create_inventory_item(
        &self,
        brewery_id: Option<&str>,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, AppError> {
        let mut state = self.write()?;
        Ok(insert_inventory(&mut state, brewery_id, item))
    }

    async fn update_inventory_item(
        &self,
        id: i32,
        patch: InventoryItemPatch,
    ) -> Result<Option<InventoryItem>, AppError> {
        let mut state = self.write()?;
        let Some(mut item) = state.inventory.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply(&mut item);
        item.updated_at = Utc::now();
        state.inventory.insert(id, item.clone());
        Ok(Some(item))
    }

    async fn delete_inventory_item(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.write()?.inventory.remove(&id).is_some())
    }

    // --- Equipment ---

    async fn list_equipment(&self, brewery_id: Option<&str>) -> Result<Vec<Equipment>, AppError> {
        let state = self.read()?;
        Ok(match brewery_id {
            Some(bid) => state
                .equipment
                .values()
                .filter(|e| tenant_matches(e.brewery_id.as_deref(), bid))
                .cloned()
                .collect(),
            None => state.equipment.values().cloned().collect(),
        })
    }

    async fn get_equipment(&self, id: i32) -> Result<Option<Equipment>, AppError> {
        Ok(self.read()?.equipment.get(&id).cloned())
    }

    async fn create_equipment(
        &self,
        brewery_id: Option<&str>,
        equipment: NewEquipment,
    ) -> Result<Equipment, AppError> {
        let mut state = self.write()?;
        Ok(insert_equipment(&mut state, brewery_id, equipment))
    }

    async fn update_equipment(
        &self,
        id: i32,
        patch: EquipmentPatch,
    ) -> Result<Option<Equipment>, AppError> {
        let mut state = self.write()?;
        let Some(mut equipment) = state.equipment.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply(&mut equipment);
        equipment.updated_at = Utc::now();
        state.equipment.insert(id, equipment.clone());
        Ok(Some(equipment))
    }

    async fn delete_equipment(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.write()?.equipment.remove(&id).is_some())
    }

    // --- Recipes ---

    async fn list_recipes(&self, brewery_id: Option<&str>) -> Result<Vec<Recipe>, AppError> {
        let state = self.read()?;
        Ok(match brewery_id {
            Some(bid) => state
                .recipes
                .values()
                .filter(|r| tenant_matches(r.brewery_id.as_deref(), bid))
                .cloned()
                .collect(),
            None => state.recipes.values().cloned().collect(),
        })
    }

    async fn get_recipe(&self, id: i32) -> Result<Option<Recipe>, AppError> {
        Ok(self.read()?.recipes.get(&id).cloned())
    }

    async fn create_recipe(
        &self,
        brewery_id: Option<&str>,
        recipe: NewRecipe,
    ) -> Result<Recipe, AppError> {
        let mut state = self.write()?;
        Ok(insert_recipe(&mut state, brewery_id, recipe))
    }

    async fn update_recipe(
        &self,
        id: i32,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>, AppError> {
        let mut state = self.write()?;
        let Some(mut recipe) = state.recipes.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply(&mut recipe);
        recipe.updated_at = Utc::now();
        state.recipes.insert(id, recipe.clone());
        Ok(Some(recipe))
    }

    async fn delete_recipe(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.write()?.recipes.remove(&id).is_some())
    }

    // --- Brewing schedules ---

    async fn list_brewing_schedules(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<BrewingSchedule>, AppError> {
        let state = self.read()?;
        Ok(match brewery_id {
            Some(bid) => state
                .schedules
                .values()
                .filter(|s| tenant_matches(s.brewery_id.as_deref(), bid))
                .cloned()
                .collect(),
            None => state.schedules.values().cloned().collect(),
        })
    }

    async fn get_brewing_schedule(&self, id: i32) -> Result<Option<BrewingSchedule>, AppError> {
        Ok(self.read()?.schedules.get(&id).cloned())
    }

    async fn create_brewing_schedule(
        &self,
        brewery_id: Option<&str>,
        schedule: NewBrewingSchedule,
    ) -> Result<BrewingSchedule, AppError> {
        let mut state = self.write()?;
        insert_schedule(&mut state, brewery_id, schedule)
    }

    async fn update_brewing_schedule(
        &self,
        id: i32,
        patch: BrewingSchedulePatch,
    ) -> Result<Option<BrewingSchedule>, AppError> {
        let mut state = self.write()?;
        let Some(mut schedule) = state.schedules.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply(&mut schedule);
        // A patch can move either endpoint or repoint a reference, so the
        // invariants are re-checked against the merged record.
        if !schedule.dates_ordered() {
            return Err(AppError::InvalidDateRange);
        }
        check_schedule_refs(
            &state,
            schedule.brewery_id.as_deref(),
            schedule.recipe_id,
            schedule.equipment_id,
        )?;
        schedule.updated_at = Utc::now();
        state.schedules.insert(id, schedule.clone());
        Ok(Some(schedule))
    }

    async fn delete_brewing_schedule(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.write()?.schedules.remove(&id).is_some())
    }

    // --- Ingredient sources ---

    async fn list_ingredient_sources(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<IngredientSource>, AppError> {
        let state = self.read()?;
        Ok(match brewery_id {
            Some(bid) => state
                .sources
                .values()
                .filter(|s| tenant_matches(s.brewery_id.as_deref(), bid))
                .cloned()
                .collect(),
            None => state.sources.values().cloned().collect(),
        })
    }

    async fn get_ingredient_source(
        &self,
        id: i32,
    ) -> Result<Option<IngredientSource>, AppError> {
        Ok(self.read()?.sources.get(&id).cloned())
    }

    async fn create_ingredient_source(
        &self,
        brewery_id: Option<&str>,
        source: NewIngredientSource,
    ) -> Result<IngredientSource, AppError> {
        let mut state = self.write()?;
        let id = state.next_source_id;
        state.next_source_id += 1;
        let now = Utc::now();
        let record = IngredientSource {
            id,
            brewery_id: brewery_id.map(str::to_string),
            name: source.name,
            source_type: source.source_type,
            supplier: source.supplier,
            location: source.location,
            contact: source.contact,
            rating: source.rating,
            notes: source.notes,
            latitude: source.latitude,
            longitude: source.longitude,
            created_at: now,
            updated_at: now,
        };
        state.sources.insert(id, record.clone());
        Ok(record)
    }

    async fn update_ingredient_source(
        &self,
        id: i32,
        patch: IngredientSourcePatch,
    ) -> Result<Option<IngredientSource>, AppError> {
        let mut state = self.write()?;
        let Some(mut source) = state.sources.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply(&mut source);
        source.updated_at = Utc::now();
        state.sources.insert(id, source.clone());
        Ok(Some(source))
    }

    async fn delete_ingredient_source(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.write()?.sources.remove(&id).is_some())
    }

    // --- Price history ---

    async fn list_price_history(
        &self,
        brewery_id: Option<&str>,
    ) -> Result<Vec<PriceHistoryEntry>, AppError> {
        let state = self.read()?;
        Ok(match brewery_id {
            Some(bid) => state
                .price_history
                .values()
                .filter(|p| tenant_matches(p.brewery_id.as_deref(), bid))
                .cloned()
                .collect(),
            None => state.price_history.values().cloned().collect(),
        })
    }

    async fn list_price_history_for_ingredient(
        &self,
        ingredient_id: i32,
    ) -> Result<Vec<PriceHistoryEntry>, AppError> {
        Ok(self
            .read()?
            .price_history
            .values()
            .filter(|p| p.ingredient_id == ingredient_id)
            .cloned()
            .collect())
    }

    async fn create_price_history_entry(
        &self,
        brewery_id: Option<&str>,
        entry: NewPriceHistoryEntry,
    ) -> Result<PriceHistoryEntry, AppError> {
        let mut state = self.write()?;
        check_ingredient_ref(&state, brewery_id, entry.ingredient_id)?;
        let id = state.next_price_id;
        state.next_price_id += 1;
        let record = PriceHistoryEntry {
            id,
            brewery_id: brewery_id.map(str::to_string),
            ingredient_id: entry.ingredient_id,
            price: entry.price,
            supplier: entry.supplier,
            date: entry.date,
            notes: entry.notes,
            created_at: Utc::now(),
        };
        state.price_history.insert(id, record.clone());
        Ok(record)
    }

    async fn update_price_history_entry(
        &self,
        id: i32,
        patch: PriceHistoryPatch,
    ) -> Result<Option<PriceHistoryEntry>, AppError> {
        let mut state = self.write()?;
        let Some(mut entry) = state.price_history.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply(&mut entry);
        check_ingredient_ref(&state, entry.brewery_id.as_deref(), entry.ingredient_id)?;
        state.price_history.insert(id, entry.clone());
        Ok(Some(entry))
    }

    async fn delete_price_history_entry(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.write()?.price_history.remove(&id).is_some())
    }

    // --- Sessions ---

    async fn get_session(&self, sid: &str) -> Result<Option<SessionRecord>, AppError> {
        Ok(self.read()?.sessions.get(sid).cloned())
    }

    async fn put_session(&self, record: SessionRecord) -> Result<(), AppError> {
        self.write()?.sessions.insert(record.sid.clone(), record);
        Ok(())
    }

    async fn delete_session(&self, sid: &str) -> Result<bool, AppError> {
        Ok(self.write()?.sessions.remove(sid).is_some())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut state = self.write()?;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.expire > now);
        Ok((before - state.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemStorage {
        MemStorage::new(TenantDeletePolicy::Restrict)
    }

    #[tokio::test]
    async fn counters_are_independent_per_entity_type() {
        let storage = store();
        // Seeds consume ids 1..=2 in inventory, equipment, recipes and
        // schedules; sources were never seeded, so their counter is fresh.
        let source = storage
            .create_ingredient_source(
                None,
                NewIngredientSource {
                    name: "Yakima Valley Hops".to_string(),
                    source_type: "hops".to_string(),
                    supplier: "Yakima Chief".to_string(),
                    location: "Washington, USA".to_string(),
                    contact: None,
                    rating: Some(5),
                    notes: None,
                    latitude: None,
                    longitude: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(source.id, 1);

        let item = storage
            .create_inventory_item(
                None,
                NewInventoryItem {
                    name: "Saaz Hops".to_string(),
                    quantity: 3,
                    current_quantity: 3,
                    minimum_quantity: 1,
                    unit: "kg".to_string(),
                    location: None,
                    expiration_date: None,
                    cost: None,
                    supplier: None,
                    barcode: None,
                    category: None,
                    notes: None,
                    image_url: None,
                    status: "good".to_string(),
                    forecast: "Sufficient".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(item.id, 3);
    }

    #[tokio::test]
    async fn seed_rows_are_tenant_less() {
        let storage = store();
        let items = storage.list_inventory_items(None).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.brewery_id.is_none()));

        // A tenant filter must therefore exclude every seed row.
        let scoped = storage
            .list_inventory_items(Some("no-such-tenant"))
            .await
            .unwrap();
        assert!(scoped.is_empty());
    }

    #[tokio::test]
    async fn seed_schedules_resolve_seed_recipes() {
        let storage = store();
        let schedules = storage.list_brewing_schedules(None).await.unwrap();
        assert_eq!(schedules.len(), 2);
        for schedule in schedules {
            let recipe_id = schedule.recipe_id.unwrap();
            assert!(storage.get_recipe(recipe_id).await.unwrap().is_some());
        }
    }
}
