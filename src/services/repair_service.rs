use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::ledger;
use crate::lifecycle::{repair_order_transition, vehicle_cascade, RepairOrderEvent};
use crate::models::{RepairLine, RepairOrder};
use crate::repositories::{
    CatalogRepository, ReceptionRepository, RepairOrderRepository, VehicleRepository,
};

/// One requested line of a repair quote.
#[derive(Debug, Clone)]
pub struct QuoteLineRequest {
    pub task: Option<String>,
    pub service_id: Option<Uuid>,
    pub spare_part_id: Option<Uuid>,
    pub quantity: i32,
}

/// Request to write a repair quote for a reception form.
#[derive(Debug, Clone)]
pub struct CreateQuoteRequest {
    pub reception_form_id: Uuid,
    pub employee_id: Uuid,
    pub lines: Vec<QuoteLineRequest>,
}

/// Repair order totals derived from snapshot prices.
#[derive(Debug, Clone)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub total_with_vat: Decimal,
}

/// Writes repair quotes and drives repair order transitions. Every
/// order status change runs the vehicle cascade in the same database
/// transaction.
pub struct RepairService {
    pool: PgPool,
    repair_order_repo: RepairOrderRepository,
    reception_repo: ReceptionRepository,
    vehicle_repo: VehicleRepository,
    catalog_repo: CatalogRepository,
}

impl RepairService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repair_order_repo: RepairOrderRepository::new(pool.clone()),
            reception_repo: ReceptionRepository::new(pool.clone()),
            vehicle_repo: VehicleRepository::new(pool.clone()),
            catalog_repo: CatalogRepository::new(pool.clone()),
            pool,
        }
    }

    /// Creates a QUOTED repair order. Prices are snapshotted from the
    /// catalog here; the catalog is never consulted again for these
    /// lines.
    pub async fn create_quote(
        &self,
        request: CreateQuoteRequest,
    ) -> Result<(RepairOrder, Vec<RepairLine>)> {
        if request.lines.is_empty() {
            return Err(AppError::Validation(
                "a quote needs at least one line".to_string(),
            ));
        }

        let form = self
            .reception_repo
            .find_by_id(request.reception_form_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Reception form '{}' not found",
                    request.reception_form_id
                ))
            })?;

        if !form.active {
            return Err(AppError::Validation(format!(
                "reception form '{}' is deactivated",
                form.id
            )));
        }

        if let Some(existing) = self
            .repair_order_repo
            .find_by_reception_form(form.id)
            .await?
        {
            return Err(AppError::Validation(format!(
                "reception form '{}' already has repair order '{}'",
                form.id, existing.id
            )));
        }

        let order = RepairOrder::new(form.id, form.vehicle_id, request.employee_id);

        let mut lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            lines.push(self.snapshot_line(order.id, line).await?);
        }

        let vehicle = self
            .vehicle_repo
            .find_by_id(form.vehicle_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Vehicle '{}' not found", form.vehicle_id))
            })?;
        let cascade = vehicle_cascade(vehicle.status, order.status);

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let order = insert_order(&mut tx, &order).await?;
        for line in &lines {
            insert_line(&mut tx, line).await?;
        }
        if let Some(target) = cascade {
            sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
                .bind(vehicle.id)
                .bind(target)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            order_id = %order.id,
            lines = lines.len(),
            "repair quote created"
        );
        Ok((order, lines))
    }

    pub async fn approve(&self, id: Uuid) -> Result<RepairOrder> {
        self.apply(id, RepairOrderEvent::Approve).await
    }

    pub async fn start(&self, id: Uuid) -> Result<RepairOrder> {
        self.apply(id, RepairOrderEvent::Start).await
    }

    pub async fn complete(&self, id: Uuid) -> Result<RepairOrder> {
        self.apply(id, RepairOrderEvent::Complete).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<RepairOrder> {
        self.repair_order_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Repair order '{id}' not found")))
    }

    pub async fn find_lines(&self, id: Uuid) -> Result<Vec<RepairLine>> {
        self.repair_order_repo.find_lines(id).await
    }

    /// Totals from the order's snapshot lines at the given VAT rate.
    pub async fn order_totals(&self, id: Uuid, vat_rate: Decimal) -> Result<OrderTotals> {
        let lines = self.find_lines(id).await?;
        let subtotal = ledger::order_subtotal(&lines);
        Ok(OrderTotals {
            subtotal,
            total_with_vat: ledger::apply_vat(subtotal, vat_rate),
        })
    }

    /// Applies one lifecycle event to the order and cascades the
    /// vehicle status inside the same transaction.
    async fn apply(&self, id: Uuid, event: RepairOrderEvent) -> Result<RepairOrder> {
        let order = self.find_by_id(id).await?;
        let next = repair_order_transition(order.status, event)?;

        let vehicle = self
            .vehicle_repo
            .find_by_id(order.vehicle_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Vehicle '{}' not found", order.vehicle_id))
            })?;
        let cascade = vehicle_cascade(vehicle.status, next);

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let order = sqlx::query_as::<_, RepairOrder>(
            r#"
            UPDATE repair_orders
            SET status = $2
            WHERE id = $1
            RETURNING id, reception_form_id, vehicle_id, employee_id, status, created_at
            "#,
        )
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        if let Some(target) = cascade {
            sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
                .bind(vehicle.id)
                .bind(target)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(order_id = %order.id, status = ?order.status, "repair order transitioned");
        Ok(order)
    }

    async fn snapshot_line(
        &self,
        repair_order_id: Uuid,
        request: &QuoteLineRequest,
    ) -> Result<RepairLine> {
        if request.quantity < 1 {
            return Err(AppError::Validation("line quantity must be >= 1".to_string()));
        }
        if request.service_id.is_none() && request.spare_part_id.is_none() {
            return Err(AppError::Validation(
                "a line needs a service or a spare part".to_string(),
            ));
        }

        let service_price = match request.service_id {
            Some(service_id) => {
                let service = self
                    .catalog_repo
                    .find_service(service_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Service '{service_id}' not found"))
                    })?;
                Some(service.price)
            }
            None => None,
        };

        let spare_part_price = match request.spare_part_id {
            Some(part_id) => {
                let part = self
                    .catalog_repo
                    .find_spare_part(part_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Spare part '{part_id}' not found"))
                    })?;
                Some(part.unit_price)
            }
            None => None,
        };

        Ok(RepairLine::new(
            repair_order_id,
            request.task.clone(),
            request.service_id,
            request.spare_part_id,
            request.quantity,
            service_price,
            spare_part_price,
        ))
    }
}

async fn insert_order(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &RepairOrder,
) -> Result<RepairOrder> {
    let row = sqlx::query_as::<_, RepairOrder>(
        r#"
        INSERT INTO repair_orders (id, reception_form_id, vehicle_id, employee_id, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, reception_form_id, vehicle_id, employee_id, status, created_at
        "#,
    )
    .bind(order.id)
    .bind(order.reception_form_id)
    .bind(order.vehicle_id)
    .bind(order.employee_id)
    .bind(order.status)
    .bind(order.created_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(row)
}

async fn insert_line(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    line: &RepairLine,
) -> Result<RepairLine> {
    let row = sqlx::query_as::<_, RepairLine>(
        r#"
        INSERT INTO repair_lines (id, repair_order_id, task, service_id, spare_part_id, quantity, service_price, spare_part_price, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, repair_order_id, task, service_id, spare_part_id, quantity, service_price, spare_part_price, created_at
        "#,
    )
    .bind(line.id)
    .bind(line.repair_order_id)
    .bind(&line.task)
    .bind(line.service_id)
    .bind(line.spare_part_id)
    .bind(line.quantity)
    .bind(line.service_price)
    .bind(line.spare_part_price)
    .bind(line.created_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(row)
}
