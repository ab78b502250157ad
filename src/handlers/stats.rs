// src/handlers/stats.rs

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::TenantContext,
    models::{equipment::EquipmentStatus, schedule::ScheduleStatus},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub batches_in_process: usize,
    pub total_inventory_items: usize,
    pub low_stock_items: usize,
    pub equipment_utilization: i32,
    pub maintenance_needed: usize,
    pub scheduled_brews: usize,
    pub this_week_brews: usize,
}

/// Dashboard aggregates, computed from the caller's tenant-scoped rows.
pub async fn get_stats(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let inventory = app_state
        .storage
        .list_inventory_items(Some(&tenant.0))
        .await?;
    let equipment = app_state.storage.list_equipment(Some(&tenant.0)).await?;
    let schedules = app_state
        .storage
        .list_brewing_schedules(Some(&tenant.0))
        .await?;

    let now = Utc::now();
    let end_of_week = now + Duration::days(7);

    let batches_in_process = schedules
        .iter()
        .filter(|s| s.status == ScheduleStatus::InProgress)
        .count();
    let total_inventory_items = inventory.len();
    let low_stock_items = inventory
        .iter()
        .filter(|i| i.current_quantity <= i.minimum_quantity)
        .count();

    let total_equipment = equipment.len();
    let active_equipment = equipment
        .iter()
        .filter(|e| e.status == EquipmentStatus::Active)
        .count();
    let equipment_utilization = if total_equipment > 0 {
        ((active_equipment * 100) / total_equipment) as i32
    } else {
        0
    };
    let maintenance_needed = equipment
        .iter()
        .filter(|e| e.next_maintenance.is_some_and(|due| due <= now))
        .count();

    let scheduled_brews = schedules
        .iter()
        .filter(|s| s.status == ScheduleStatus::Scheduled)
        .count();
    let this_week_brews = schedules
        .iter()
        .filter(|s| s.start_date >= now && s.start_date <= end_of_week)
        .count();

    Ok(Json(DashboardStats {
        batches_in_process,
        total_inventory_items,
        low_stock_items,
        equipment_utilization,
        maintenance_needed,
        scheduled_brews,
        this_week_brews,
    }))
}
