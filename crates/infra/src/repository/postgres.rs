//! Postgres-backed repositories.
//!
//! Tables are created by [`crate::db::Database::apply_schema`]. Insertion
//! order is the `seq` BIGSERIAL column of each table.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `Conflict` |
//! | Database (check constraint violation) | `23514` | `Invalid` |
//! | RowNotFound | N/A | `NotFound` |
//! | Other | N/A | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use stockyard_cash::{CashChain, CashLedgerEntry, PostedEntry, ProjectScope, Register};
use stockyard_core::{CashEntryId, ClassId, MovementId, ProjectId, PurchaseItemId, UnitId};
use stockyard_stock::{Direction, ItemClass, PurchaseItem, StockMovement, Unit};

use super::{
    CashLedgerRepository, PurchaseItemRepository, ReferenceRepository, StockMovementRepository,
    StoreError, StoreResult,
};

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23503") => StoreError::Conflict(msg),
                Some("23514") => StoreError::Invalid(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn sequence_of(row: &PgRow) -> Result<u64, sqlx::Error> {
    let seq: i64 = row.try_get("seq")?;
    u64::try_from(seq).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn purchase_from_row(row: &PgRow) -> Result<PurchaseItem, sqlx::Error> {
    Ok(PurchaseItem {
        id: PurchaseItemId::from_uuid(row.try_get("id")?),
        acquired_on: row.try_get("acquired_on")?,
        designation: row.try_get("designation")?,
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
        total_cost: row.try_get("total_cost")?,
        unit_id: UnitId::from_uuid(row.try_get("unit_id")?),
        class_id: ClassId::from_uuid(row.try_get("class_id")?),
    })
}

fn movement_from_row(row: &PgRow) -> Result<StockMovement, sqlx::Error> {
    let direction: String = row.try_get("direction")?;
    let direction: Direction = direction
        .parse()
        .map_err(|e: stockyard_core::DomainError| sqlx::Error::Decode(Box::new(e)))?;

    Ok(StockMovement {
        id: MovementId::from_uuid(row.try_get("id")?),
        direction,
        purchase_item_id: PurchaseItemId::from_uuid(row.try_get("purchase_item_id")?),
        date: row.try_get("movement_date")?,
        quantity: row.try_get("quantity")?,
        source: row.try_get("source")?,
        destination: row.try_get("destination")?,
        observation: row.try_get("observation")?,
        sequence: sequence_of(row)?,
    })
}

fn cash_entry_from_row(row: &PgRow) -> Result<CashLedgerEntry, sqlx::Error> {
    let project_id: Option<Uuid> = row.try_get("project_id")?;
    let register: String = row.try_get("register")?;
    let register: Register = register
        .parse()
        .map_err(|e: stockyard_core::DomainError| sqlx::Error::Decode(Box::new(e)))?;

    Ok(CashLedgerEntry {
        id: CashEntryId::from_uuid(row.try_get("id")?),
        register,
        date: row.try_get("entry_date")?,
        label: row.try_get("label")?,
        debit: row.try_get("debit")?,
        credit: row.try_get("credit")?,
        balance: row.try_get("balance")?,
        project_id: project_id.map(ProjectId::from_uuid),
        payment_method: row.try_get("payment_method")?,
        sequence: sequence_of(row)?,
    })
}

fn decode_all<T>(
    operation: &str,
    rows: &[PgRow],
    decode: impl Fn(&PgRow) -> Result<T, sqlx::Error>,
) -> StoreResult<Vec<T>> {
    rows.iter()
        .map(|r| decode(r).map_err(|e| map_sqlx_error(operation, e)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct PostgresPurchaseItemRepository {
    pool: Arc<PgPool>,
}

impl PostgresPurchaseItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

const PURCHASE_COLUMNS: &str =
    "id, acquired_on, designation, quantity, unit_price, total_cost, unit_id, class_id";

#[async_trait]
impl PurchaseItemRepository for PostgresPurchaseItemRepository {
    #[instrument(skip(self), err)]
    async fn find_all(&self) -> StoreResult<Vec<PurchaseItem>> {
        let rows = sqlx::query(&format!("SELECT {PURCHASE_COLUMNS} FROM purchase_items ORDER BY seq"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("purchase_items.find_all", e))?;
        decode_all("purchase_items.find_all", &rows, purchase_from_row)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn find_by_id(&self, id: PurchaseItemId) -> StoreResult<Option<PurchaseItem>> {
        let row = sqlx::query(&format!("SELECT {PURCHASE_COLUMNS} FROM purchase_items WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("purchase_items.find_by_id", e))?;
        row.as_ref()
            .map(purchase_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("purchase_items.find_by_id", e))
    }

    #[instrument(skip(self, item), fields(id = %item.id), err)]
    async fn create(&self, item: PurchaseItem) -> StoreResult<PurchaseItem> {
        sqlx::query(
            r#"
            INSERT INTO purchase_items
                (id, acquired_on, designation, quantity, unit_price, total_cost, unit_id, class_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*item.id.as_uuid())
        .bind(item.acquired_on)
        .bind(&item.designation)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_cost)
        .bind(*item.unit_id.as_uuid())
        .bind(*item.class_id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("purchase_items.create", e))?;
        Ok(item)
    }

    #[instrument(skip(self, item), fields(id = %item.id), err)]
    async fn update(&self, item: PurchaseItem) -> StoreResult<PurchaseItem> {
        let result = sqlx::query(
            r#"
            UPDATE purchase_items
            SET acquired_on = $2, designation = $3, quantity = $4, unit_price = $5,
                total_cost = $6, unit_id = $7, class_id = $8
            WHERE id = $1
            "#,
        )
        .bind(*item.id.as_uuid())
        .bind(item.acquired_on)
        .bind(&item.designation)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_cost)
        .bind(*item.unit_id.as_uuid())
        .bind(*item.class_id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("purchase_items.update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(item)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: PurchaseItemId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM purchase_items WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("purchase_items.delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Movement table for one direction. Both directions share `stock_movements`
/// and are told apart by its `direction` column.
#[derive(Debug, Clone)]
pub struct PostgresStockMovementRepository {
    pool: Arc<PgPool>,
    direction: Direction,
}

impl PostgresStockMovementRepository {
    pub fn new(pool: PgPool, direction: Direction) -> Self {
        Self {
            pool: Arc::new(pool),
            direction,
        }
    }
}

const MOVEMENT_COLUMNS: &str = "id, direction, purchase_item_id, movement_date, quantity, source, destination, observation, seq";

#[async_trait]
impl StockMovementRepository for PostgresStockMovementRepository {
    fn direction(&self) -> Direction {
        self.direction
    }

    #[instrument(skip(self), fields(direction = %self.direction), err)]
    async fn find_all(&self) -> StoreResult<Vec<StockMovement>> {
        let rows = sqlx::query(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE direction = $1 ORDER BY movement_date, seq"
        ))
        .bind(self.direction.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_movements.find_all", e))?;
        decode_all("stock_movements.find_all", &rows, movement_from_row)
    }

    #[instrument(skip(self), fields(direction = %self.direction, id = %id), err)]
    async fn find_by_id(&self, id: MovementId) -> StoreResult<Option<StockMovement>> {
        let row = sqlx::query(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE direction = $1 AND id = $2"
        ))
        .bind(self.direction.as_str())
        .bind(*id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_movements.find_by_id", e))?;
        row.as_ref()
            .map(movement_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("stock_movements.find_by_id", e))
    }

    #[instrument(skip(self), fields(direction = %self.direction, purchase_item_id = %purchase_item_id), err)]
    async fn find_by_purchase(&self, purchase_item_id: PurchaseItemId) -> StoreResult<Vec<StockMovement>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM stock_movements
            WHERE direction = $1 AND purchase_item_id = $2
            ORDER BY movement_date, seq
            "#
        ))
        .bind(self.direction.as_str())
        .bind(*purchase_item_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_movements.find_by_purchase", e))?;
        decode_all("stock_movements.find_by_purchase", &rows, movement_from_row)
    }

    #[instrument(skip(self, movement), fields(direction = %self.direction, id = %movement.id), err)]
    async fn create(&self, movement: StockMovement) -> StoreResult<StockMovement> {
        if movement.direction != self.direction {
            return Err(StoreError::Invalid(format!(
                "cannot store a `{}` movement in the `{}` table",
                movement.direction, self.direction
            )));
        }
        let row = sqlx::query(
            r#"
            INSERT INTO stock_movements
                (id, direction, purchase_item_id, movement_date, quantity, source, destination, observation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING seq
            "#,
        )
        .bind(*movement.id.as_uuid())
        .bind(movement.direction.as_str())
        .bind(*movement.purchase_item_id.as_uuid())
        .bind(movement.date)
        .bind(movement.quantity)
        .bind(movement.source.as_deref())
        .bind(movement.destination.as_deref())
        .bind(movement.observation.as_deref())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_movements.create", e))?;

        let sequence = sequence_of(&row).map_err(|e| map_sqlx_error("stock_movements.create", e))?;
        Ok(StockMovement { sequence, ..movement })
    }

    #[instrument(skip(self, movement), fields(direction = %self.direction, id = %movement.id), err)]
    async fn update(&self, movement: StockMovement) -> StoreResult<StockMovement> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE stock_movements
            SET movement_date = $3, quantity = $4, source = $5, destination = $6, observation = $7
            WHERE direction = $1 AND id = $2
            RETURNING {MOVEMENT_COLUMNS}
            "#
        ))
        .bind(self.direction.as_str())
        .bind(*movement.id.as_uuid())
        .bind(movement.date)
        .bind(movement.quantity)
        .bind(movement.source.as_deref())
        .bind(movement.destination.as_deref())
        .bind(movement.observation.as_deref())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_movements.update", e))?
        .ok_or(StoreError::NotFound)?;

        movement_from_row(&row).map_err(|e| map_sqlx_error("stock_movements.update", e))
    }

    #[instrument(skip(self), fields(direction = %self.direction, id = %id), err)]
    async fn delete(&self, id: MovementId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM stock_movements WHERE direction = $1 AND id = $2")
            .bind(self.direction.as_str())
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("stock_movements.delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(direction = %self.direction), err)]
    async fn delete_all(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM stock_movements WHERE direction = $1")
            .bind(self.direction.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("stock_movements.delete_all", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(direction = %self.direction, purchase_item_id = %purchase_item_id), err)]
    async fn delete_by_purchase(&self, purchase_item_id: PurchaseItemId) -> StoreResult<u64> {
        let result =
            sqlx::query("DELETE FROM stock_movements WHERE direction = $1 AND purchase_item_id = $2")
                .bind(self.direction.as_str())
                .bind(*purchase_item_id.as_uuid())
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("stock_movements.delete_by_purchase", e))?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresCashLedgerRepository {
    pool: Arc<PgPool>,
}

impl PostgresCashLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

const CASH_COLUMNS: &str =
    "id, register, entry_date, label, debit, credit, balance, project_id, payment_method, seq";

#[async_trait]
impl CashLedgerRepository for PostgresCashLedgerRepository {
    #[instrument(skip(self), fields(register = %register), err)]
    async fn find_all(
        &self,
        register: Register,
        scope: Option<ProjectScope>,
    ) -> StoreResult<Vec<CashLedgerEntry>> {
        let rows = match scope {
            None => {
                sqlx::query(&format!(
                    r#"
                    SELECT {CASH_COLUMNS} FROM cash_entries
                    WHERE register = $1
                    ORDER BY entry_date, seq
                    "#
                ))
                .bind(register.as_str())
                .fetch_all(&*self.pool)
                .await
            }
            Some(scope) => {
                // IS NOT DISTINCT FROM matches NULL for the unassigned scope.
                sqlx::query(&format!(
                    r#"
                    SELECT {CASH_COLUMNS} FROM cash_entries
                    WHERE register = $1 AND project_id IS NOT DISTINCT FROM $2
                    ORDER BY entry_date, seq
                    "#
                ))
                .bind(register.as_str())
                .bind(scope.project_id().map(|p| *p.as_uuid()))
                .fetch_all(&*self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("cash_entries.find_all", e))?;
        decode_all("cash_entries.find_all", &rows, cash_entry_from_row)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn find_by_id(&self, id: CashEntryId) -> StoreResult<Option<CashLedgerEntry>> {
        let row = sqlx::query(&format!("SELECT {CASH_COLUMNS} FROM cash_entries WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("cash_entries.find_by_id", e))?;
        row.as_ref()
            .map(cash_entry_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("cash_entries.find_by_id", e))
    }

    #[instrument(skip(self, entry), err)]
    async fn create(&self, entry: PostedEntry) -> StoreResult<CashLedgerEntry> {
        let id = CashEntryId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO cash_entries
                (id, register, entry_date, label, debit, credit, balance, project_id, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING seq
            "#,
        )
        .bind(*id.as_uuid())
        .bind(entry.register.as_str())
        .bind(entry.date)
        .bind(&entry.label)
        .bind(entry.debit)
        .bind(entry.credit)
        .bind(entry.balance)
        .bind(entry.project_id.map(|p| *p.as_uuid()))
        .bind(entry.payment_method.as_deref())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("cash_entries.create", e))?;

        let sequence = sequence_of(&row).map_err(|e| map_sqlx_error("cash_entries.create", e))?;
        Ok(entry.into_entry(id, sequence))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: CashEntryId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM cash_entries WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("cash_entries.delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(register = %register), err)]
    async fn delete_all(&self, register: Register) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM cash_entries WHERE register = $1")
            .bind(register.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("cash_entries.delete_all", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(chain = %chain), err)]
    async fn last_balance(&self, chain: CashChain) -> StoreResult<i64> {
        let row = sqlx::query(
            r#"
            SELECT balance FROM cash_entries
            WHERE register = $1 AND project_id IS NOT DISTINCT FROM $2
            ORDER BY entry_date DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(chain.register.as_str())
        .bind(chain.scope.project_id().map(|p| *p.as_uuid()))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("cash_entries.last_balance", e))?;

        match row {
            Some(row) => row
                .try_get("balance")
                .map_err(|e| map_sqlx_error("cash_entries.last_balance", e)),
            None => Ok(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresReferenceRepository {
    pool: Arc<PgPool>,
}

impl PostgresReferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait]
impl ReferenceRepository for PostgresReferenceRepository {
    async fn list_units(&self) -> StoreResult<Vec<Unit>> {
        let rows = sqlx::query("SELECT id, name, symbol FROM units ORDER BY seq")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("units.list", e))?;
        decode_all("units.list", &rows, |r| {
            Ok(Unit {
                id: UnitId::from_uuid(r.try_get("id")?),
                name: r.try_get("name")?,
                symbol: r.try_get("symbol")?,
            })
        })
    }

    async fn list_classes(&self) -> StoreResult<Vec<ItemClass>> {
        let rows = sqlx::query("SELECT id, name FROM item_classes ORDER BY seq")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("item_classes.list", e))?;
        decode_all("item_classes.list", &rows, |r| {
            Ok(ItemClass {
                id: ClassId::from_uuid(r.try_get("id")?),
                name: r.try_get("name")?,
            })
        })
    }

    #[instrument(skip(self, unit), fields(symbol = %unit.symbol), err)]
    async fn create_unit(&self, unit: Unit) -> StoreResult<Unit> {
        sqlx::query("INSERT INTO units (id, name, symbol) VALUES ($1, $2, $3)")
            .bind(*unit.id.as_uuid())
            .bind(&unit.name)
            .bind(&unit.symbol)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("units.create", e))?;
        Ok(unit)
    }

    #[instrument(skip(self, class), fields(name = %class.name), err)]
    async fn create_class(&self, class: ItemClass) -> StoreResult<ItemClass> {
        sqlx::query("INSERT INTO item_classes (id, name) VALUES ($1, $2)")
            .bind(*class.id.as_uuid())
            .bind(&class.name)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("item_classes.create", e))?;
        Ok(class)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete_unit(&self, id: UnitId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM units WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("units.delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete_class(&self, id: ClassId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM item_classes WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("item_classes.delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}
