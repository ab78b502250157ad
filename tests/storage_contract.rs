// tests/storage_contract.rs
//
// Exercises the storage contract through the in-memory backend: identity,
// merge semantics, tenant isolation, referential checks and the session
// store behave the same way the persistent backend is required to.

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use validator::Validate;

use taproom::common::error::AppError;
use taproom::models::brewery::NewBrewery;
use taproom::models::inventory::{InventoryItemPatch, NewInventoryItem};
use taproom::models::price_history::NewPriceHistoryEntry;
use taproom::models::recipe::NewRecipe;
use taproom::models::schedule::{BrewingSchedulePatch, NewBrewingSchedule, ScheduleStatus};
use taproom::models::session::SessionRecord;
use taproom::models::user::{NewUser, Role};
use taproom::storage::{MemStorage, Storage, TenantDeletePolicy};

fn store() -> MemStorage {
    MemStorage::new(TenantDeletePolicy::Restrict)
}

fn new_brewery(name: &str) -> NewBrewery {
    NewBrewery {
        name: name.to_string(),
        brewery_type: "microbrewery".to_string(),
        location: "Portland, OR".to_string(),
        founded_year: Some(2015),
        website: None,
        phone: None,
        brewing_capacity: None,
        specialties: None,
    }
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "not-a-real-hash".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        role: Role::Owner,
        profile_image_url: None,
    }
}

fn hops(name: &str, quantity: i32) -> NewInventoryItem {
    NewInventoryItem {
        name: name.to_string(),
        quantity,
        current_quantity: quantity,
        minimum_quantity: 2,
        unit: "kg".to_string(),
        location: Some("Storage A".to_string()),
        expiration_date: None,
        cost: Some(Decimal::new(1250, 2)),
        supplier: Some("Hop Supplier Inc".to_string()),
        barcode: None,
        category: Some("Hops".to_string()),
        notes: None,
        image_url: None,
        status: "good".to_string(),
        forecast: "Sufficient".to_string(),
    }
}

fn pale_ale() -> NewRecipe {
    NewRecipe {
        name: "House Pale Ale".to_string(),
        style: Some("American Pale Ale".to_string()),
        batch_size: Some(Decimal::new(200, 0)),
        target_abv: Some(Decimal::new(55, 1)),
        target_ibu: Some(35),
        srm: Some(7),
        ingredients: vec!["Pale Malt".to_string(), "Cascade Hops".to_string()],
        instructions: vec!["Mash at 152F".to_string(), "Boil 60 minutes".to_string()],
        fermentation_temp: Some("68F".to_string()),
        fermentation_time: Some("14 days".to_string()),
        description: None,
        image_url: None,
    }
}

#[tokio::test]
async fn create_then_get_returns_the_full_record() {
    let storage = store();
    let brewery = storage.create_brewery(new_brewery("Cascade Works")).await.unwrap();

    let created = storage
        .create_inventory_item(Some(&brewery.id), hops("Citra Hops", 8))
        .await
        .unwrap();
    assert!(created.id >= 1);
    assert_eq!(created.brewery_id.as_deref(), Some(brewery.id.as_str()));

    let fetched = storage
        .get_inventory_item(created.id)
        .await
        .unwrap()
        .expect("created item must be readable");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "Citra Hops");
    assert_eq!(fetched.quantity, 8);
    assert_eq!(fetched.created_at, created.created_at);
    assert_eq!(fetched.updated_at, created.updated_at);
}

#[tokio::test]
async fn missing_ids_are_not_errors() {
    let storage = store();
    assert!(storage.get_inventory_item(9999).await.unwrap().is_none());
    assert!(storage
        .update_inventory_item(9999, InventoryItemPatch::default())
        .await
        .unwrap()
        .is_none());
    assert!(!storage.delete_inventory_item(9999).await.unwrap());
    assert!(storage.get_user("no-such-user").await.unwrap().is_none());
    assert!(storage.get_brewery("no-such-brewery").await.unwrap().is_none());
}

#[tokio::test]
async fn update_changes_exactly_the_patched_fields() {
    let storage = store();
    let created = storage
        .create_inventory_item(None, hops("Saaz Hops", 4))
        .await
        .unwrap();

    let patch = InventoryItemPatch {
        current_quantity: Some(1),
        notes: Some("running low".to_string()),
        ..InventoryItemPatch::default()
    };
    let updated = storage
        .update_inventory_item(created.id, patch)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.current_quantity, 1);
    assert_eq!(updated.notes.as_deref(), Some("running low"));
    // Everything else is untouched.
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.quantity, created.quantity);
    assert_eq!(updated.minimum_quantity, created.minimum_quantity);
    assert_eq!(updated.unit, created.unit);
    assert_eq!(updated.cost, created.cost);
    assert_eq!(updated.created_at, created.created_at);

    // An empty patch is a data no-op.
    let unchanged = storage
        .update_inventory_item(created.id, InventoryItemPatch::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.name, updated.name);
    assert_eq!(unchanged.current_quantity, updated.current_quantity);
    assert_eq!(unchanged.notes, updated.notes);
    assert_eq!(unchanged.created_at, updated.created_at);
}

#[tokio::test]
async fn delete_is_idempotently_false_the_second_time() {
    let storage = store();
    let created = storage
        .create_inventory_item(None, hops("Fuggle Hops", 2))
        .await
        .unwrap();

    assert!(storage.delete_inventory_item(created.id).await.unwrap());
    assert!(storage.get_inventory_item(created.id).await.unwrap().is_none());
    assert!(!storage.delete_inventory_item(created.id).await.unwrap());
}

#[tokio::test]
async fn duplicate_username_and_email_are_conflicts() {
    let storage = store();
    storage.create_user(new_user("alice")).await.unwrap();

    let err = storage.create_user(new_user("alice")).await.unwrap_err();
    assert!(matches!(err, AppError::UsernameAlreadyExists));

    let mut same_email = new_user("alice2");
    same_email.email = "alice@example.com".to_string();
    let err = storage.create_user(same_email).await.unwrap_err();
    assert!(matches!(err, AppError::EmailAlreadyExists));

    // Exactly one row for the name survived.
    let found = storage.get_user_by_username("alice").await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn tenant_isolation_on_lists() {
    let storage = store();
    let b1 = storage.create_brewery(new_brewery("Brewery One")).await.unwrap();
    let b2 = storage.create_brewery(new_brewery("Brewery Two")).await.unwrap();

    storage
        .create_inventory_item(Some(&b1.id), hops("Cascade Hops", 5))
        .await
        .unwrap();
    storage
        .create_inventory_item(Some(&b2.id), hops("Citra Hops", 9))
        .await
        .unwrap();

    let b1_items = storage.list_inventory_items(Some(&b1.id)).await.unwrap();
    assert_eq!(b1_items.len(), 1);
    assert_eq!(b1_items[0].name, "Cascade Hops");

    let b2_items = storage.list_inventory_items(Some(&b2.id)).await.unwrap();
    assert_eq!(b2_items.len(), 1);
    assert_eq!(b2_items[0].name, "Citra Hops");

    // A tenant that was never created sees nothing.
    let ghost = storage
        .list_inventory_items(Some("b2-does-not-exist"))
        .await
        .unwrap();
    assert!(ghost.is_empty());

    // The unfiltered view spans tenants (plus the tenant-less seed rows).
    let all = storage.list_inventory_items(None).await.unwrap();
    assert!(all.len() >= 2);
}

#[tokio::test]
async fn signup_scenario_single_item_listing() {
    let storage = store();
    let (brewery, user) = storage
        .create_brewery_with_owner(new_brewery("Cascade Hollow"), new_user("founder"))
        .await
        .unwrap();
    assert_eq!(user.brewery_id.as_deref(), Some(brewery.id.as_str()));
    assert_eq!(user.role, Role::Owner);

    storage
        .create_inventory_item(Some(&brewery.id), hops("Cascade Hops", 5))
        .await
        .unwrap();

    let items = storage.list_inventory_items(Some(&brewery.id)).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Cascade Hops");
    assert_eq!(items[0].quantity, 5);
}

#[tokio::test]
async fn failed_signup_leaves_no_orphan_brewery() {
    let storage = store();
    storage.create_user(new_user("taken")).await.unwrap();
    let before = storage.list_breweries().await.unwrap().len();

    let err = storage
        .create_brewery_with_owner(new_brewery("Orphanage"), new_user("taken"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UsernameAlreadyExists));

    // Tenant and first user are created together or not at all.
    assert_eq!(storage.list_breweries().await.unwrap().len(), before);
}

#[tokio::test]
async fn schedule_resolves_recipe_in_same_tenant() {
    let storage = store();
    let brewery = storage.create_brewery(new_brewery("Scheduler")).await.unwrap();
    let mut recipe = pale_ale();
    recipe.ingredients = vec!["Pilsner Malt".to_string()];
    recipe.instructions = vec!["Mash at 152F".to_string()];
    let recipe = storage.create_recipe(Some(&brewery.id), recipe).await.unwrap();

    let schedule = storage
        .create_brewing_schedule(
            Some(&brewery.id),
            NewBrewingSchedule {
                title: "Pale Ale Batch #1".to_string(),
                description: None,
                recipe_id: Some(recipe.id),
                equipment_id: None,
                start_date: Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap(),
                end_date: Utc.with_ymd_and_hms(2024, 3, 25, 0, 0, 0).unwrap(),
                status: ScheduleStatus::Scheduled,
                batch_size: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let fetched = storage
        .get_brewing_schedule(schedule.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.status, ScheduleStatus::Scheduled);
    assert_eq!(fetched.recipe_id, Some(recipe.id));
}

#[tokio::test]
async fn schedule_references_are_checked() {
    let storage = store();
    let b1 = storage.create_brewery(new_brewery("Owner")).await.unwrap();
    let b2 = storage.create_brewery(new_brewery("Neighbour")).await.unwrap();
    let foreign_recipe = storage.create_recipe(Some(&b2.id), pale_ale()).await.unwrap();

    let start = Utc::now();
    let schedule = |recipe_id| NewBrewingSchedule {
        title: "Batch".to_string(),
        description: None,
        recipe_id,
        equipment_id: None,
        start_date: start,
        end_date: start + Duration::days(10),
        status: ScheduleStatus::Scheduled,
        batch_size: None,
        notes: None,
    };

    let err = storage
        .create_brewing_schedule(Some(&b1.id), schedule(Some(9999)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BrokenReference("recipe")));

    let err = storage
        .create_brewing_schedule(Some(&b1.id), schedule(Some(foreign_recipe.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CrossTenantReference("recipe")));
}

#[tokio::test]
async fn schedule_dates_stay_ordered_through_updates() {
    let storage = store();
    let brewery = storage.create_brewery(new_brewery("Dates")).await.unwrap();
    let start = Utc::now();

    let err = storage
        .create_brewing_schedule(
            Some(&brewery.id),
            NewBrewingSchedule {
                title: "Backwards".to_string(),
                description: None,
                recipe_id: None,
                equipment_id: None,
                start_date: start,
                end_date: start - Duration::days(1),
                status: ScheduleStatus::Scheduled,
                batch_size: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidDateRange));

    let schedule = storage
        .create_brewing_schedule(
            Some(&brewery.id),
            NewBrewingSchedule {
                title: "Forwards".to_string(),
                description: None,
                recipe_id: None,
                equipment_id: None,
                start_date: start,
                end_date: start + Duration::days(10),
                status: ScheduleStatus::Scheduled,
                batch_size: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = storage
        .update_brewing_schedule(
            schedule.id,
            BrewingSchedulePatch {
                end_date: Some(start - Duration::days(5)),
                ..BrewingSchedulePatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidDateRange));
}

#[tokio::test]
async fn empty_ingredient_lists_fail_validation_before_storage() {
    let mut recipe = pale_ale();
    recipe.ingredients = vec![];
    assert!(recipe.validate().is_err());

    let mut recipe = pale_ale();
    recipe.instructions = vec![];
    assert!(recipe.validate().is_err());
}

#[tokio::test]
async fn price_history_requires_a_resolvable_ingredient() {
    let storage = store();
    let brewery = storage.create_brewery(new_brewery("Prices")).await.unwrap();
    let item = storage
        .create_inventory_item(Some(&brewery.id), hops("Galaxy Hops", 6))
        .await
        .unwrap();

    let entry = |ingredient_id| NewPriceHistoryEntry {
        ingredient_id,
        price: Decimal::new(1899, 2),
        supplier: Some("Hop Supplier Inc".to_string()),
        date: Utc::now(),
        notes: None,
    };

    let err = storage
        .create_price_history_entry(Some(&brewery.id), entry(9999))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BrokenReference("inventory item")));

    let created = storage
        .create_price_history_entry(Some(&brewery.id), entry(item.id))
        .await
        .unwrap();
    assert_eq!(created.ingredient_id, item.id);

    let history = storage
        .list_price_history_for_ingredient(item.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].price, Decimal::new(1899, 2));
}

#[tokio::test]
async fn membership_round_trip() {
    let storage = store();
    let brewery = storage.create_brewery(new_brewery("Members")).await.unwrap();
    let user = storage.create_user(new_user("worker")).await.unwrap();
    assert!(user.brewery_id.is_none());

    let joined = storage
        .add_user_to_brewery(&user.id, &brewery.id, Role::Admin)
        .await
        .unwrap();
    assert_eq!(joined.brewery_id.as_deref(), Some(brewery.id.as_str()));
    assert_eq!(joined.role, Role::Admin);

    let members = storage.list_brewery_users(&brewery.id).await.unwrap();
    assert_eq!(members.len(), 1);

    let left = storage.remove_user_from_brewery(&user.id).await.unwrap();
    assert!(left.brewery_id.is_none());
    assert_eq!(left.role, Role::Member);
    assert!(storage.list_brewery_users(&brewery.id).await.unwrap().is_empty());

    // Linking a user to a brewery that does not exist is a programmer
    // error, not a NotFound.
    let err = storage
        .add_user_to_brewery(&user.id, "no-such-brewery", Role::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
}

#[tokio::test]
async fn restrict_policy_blocks_tenant_delete_while_data_exists() {
    let storage = store();
    let (brewery, _) = storage
        .create_brewery_with_owner(new_brewery("Sticky"), new_user("sticky-owner"))
        .await
        .unwrap();
    storage
        .create_inventory_item(Some(&brewery.id), hops("Amarillo Hops", 3))
        .await
        .unwrap();

    let err = storage.delete_brewery(&brewery.id).await.unwrap_err();
    assert!(matches!(err, AppError::BreweryNotEmpty));
    assert!(storage.get_brewery(&brewery.id).await.unwrap().is_some());
}

#[tokio::test]
async fn cascade_policy_removes_children_and_unlinks_members() {
    let storage = MemStorage::new(TenantDeletePolicy::Cascade);
    let (brewery, owner) = storage
        .create_brewery_with_owner(new_brewery("Doomed"), new_user("doomed-owner"))
        .await
        .unwrap();
    let item = storage
        .create_inventory_item(Some(&brewery.id), hops("Mosaic Hops", 7))
        .await
        .unwrap();
    let recipe = storage.create_recipe(Some(&brewery.id), pale_ale()).await.unwrap();

    assert!(storage.delete_brewery(&brewery.id).await.unwrap());
    assert!(storage.get_brewery(&brewery.id).await.unwrap().is_none());
    assert!(storage.get_inventory_item(item.id).await.unwrap().is_none());
    assert!(storage.get_recipe(recipe.id).await.unwrap().is_none());

    // The account survives, unlinked and demoted.
    let survivor = storage.get_user(&owner.id).await.unwrap().unwrap();
    assert!(survivor.brewery_id.is_none());
    assert_eq!(survivor.role, Role::Member);

    // Deleting again reports missing.
    assert!(!storage.delete_brewery(&brewery.id).await.unwrap());
}

#[tokio::test]
async fn session_store_round_trip_and_sweep() {
    let storage = store();
    let now = Utc::now();

    let live = SessionRecord {
        sid: "live".to_string(),
        sess: serde_json::json!({"userId": "u1"}),
        expire: now + Duration::hours(1),
    };
    let stale = SessionRecord {
        sid: "stale".to_string(),
        sess: serde_json::json!({"userId": "u2"}),
        expire: now - Duration::hours(1),
    };
    storage.put_session(live.clone()).await.unwrap();
    storage.put_session(stale).await.unwrap();

    let fetched = storage.get_session("live").await.unwrap().unwrap();
    assert_eq!(fetched.sess, live.sess);

    let swept = storage.delete_expired_sessions(now).await.unwrap();
    assert_eq!(swept, 1);
    assert!(storage.get_session("stale").await.unwrap().is_none());
    assert!(storage.get_session("live").await.unwrap().is_some());

    assert!(storage.delete_session("live").await.unwrap());
    assert!(!storage.delete_session("live").await.unwrap());
}
