//! PostgREST-style client for the hosted store.
//!
//! Tables: `deudas`, `gastos`, `pagos_deuda`, each carrying a `user_id`
//! column with the owning household. Column names are Spanish on the wire
//! and mapped to domain records by the `*Row` types below.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use finanzas_budget::{Debt, DebtPayment, Expense, Owner};
use finanzas_core::{CardId, DebtId, DomainError, ExpenseId, HouseholdId, Money, PaymentId};

use crate::error::StoreError;
use crate::observer::{LiveCollections, LiveRegistry};
use crate::remote::FinanceStore;

const DEBTS: &str = "deudas";
const EXPENSES: &str = "gastos";
const PAYMENTS: &str = "pagos_deuda";

#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Anonymous/public API key.
    pub api_key: String,
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub struct RestFinanceStore {
    client: Client,
    config: RestConfig,
    live: LiveRegistry,
}

impl RestFinanceStore {
    pub fn new(config: RestConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            config,
            live: LiveRegistry::new(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url.trim_end_matches('/'), table)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn select<R: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<R>, StoreError> {
        let req = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&[("select", "*")])
            .query(filters);
        let resp = check(req.send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn insert<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<R, StoreError> {
        let req = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(body);
        let resp = check(req.send().await?).await?;
        single(resp.json().await?)
    }

    async fn update<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> Result<R, StoreError> {
        let req = self
            .authorized(self.client.patch(self.table_url(table)))
            .header("Prefer", "return=representation")
            .query(filters)
            .json(body);
        let resp = check(req.send().await?).await?;
        single(resp.json().await?)
    }

    async fn delete(&self, table: &str, filters: &[(&str, String)]) -> Result<(), StoreError> {
        let req = self
            .authorized(self.client.delete(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .query(filters);
        check(req.send().await?).await?;
        Ok(())
    }
}

async fn check(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "store request failed");
    if status.is_server_error() {
        Err(StoreError::Unavailable(format!("HTTP {}", status.as_u16())))
    } else {
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// `return=representation` answers with an array holding the written row.
fn single<R>(mut rows: Vec<R>) -> Result<R, StoreError> {
    match rows.len() {
        1 => Ok(rows.remove(0)),
        n => Err(StoreError::Decode(format!("expected one row, got {n}"))),
    }
}

fn household_filter(household: HouseholdId) -> (&'static str, String) {
    ("user_id", format!("eq.{household}"))
}

#[async_trait]
impl FinanceStore for RestFinanceStore {
    async fn debts(&self, household: HouseholdId) -> Result<Vec<Debt>, StoreError> {
        let rows: Vec<DebtRow> = self.select(DEBTS, &[household_filter(household)]).await?;
        debug!(%household, count = rows.len(), "fetched debts");
        Ok(rows.into_iter().map(Debt::from).collect())
    }

    async fn expenses(&self, household: HouseholdId) -> Result<Vec<Expense>, StoreError> {
        let rows: Vec<ExpenseRow> = self.select(EXPENSES, &[household_filter(household)]).await?;
        debug!(%household, count = rows.len(), "fetched expenses");
        Ok(rows.into_iter().map(Expense::from).collect())
    }

    async fn payments(&self, household: HouseholdId) -> Result<Vec<DebtPayment>, StoreError> {
        let rows: Vec<PaymentRow> = self.select(PAYMENTS, &[household_filter(household)]).await?;
        debug!(%household, count = rows.len(), "fetched payments");
        Ok(rows.into_iter().map(DebtPayment::from).collect())
    }

    async fn insert_expense(&self, household: HouseholdId, expense: Expense) -> Result<Expense, StoreError> {
        expense.validate()?;
        let row = ExpenseRow::new(household, &expense);
        let stored: ExpenseRow = self.insert(EXPENSES, &row).await?;
        Ok(stored.into())
    }

    /// Append to `pagos_deuda`, then rewrite the debt's balance from the
    /// full ledger. PostgREST has no multi-table transaction, so a failed
    /// balance update deletes the ledger row again before returning.
    async fn record_payment(&self, household: HouseholdId, payment: DebtPayment) -> Result<Debt, StoreError> {
        let debt_filter = ("id", format!("eq.{}", payment.debt_id));
        let rows: Vec<DebtRow> = self
            .select(DEBTS, &[household_filter(household), debt_filter.clone()])
            .await?;
        let debt: Debt = rows
            .into_iter()
            .next()
            .map(Debt::from)
            .ok_or_else(|| DomainError::not_found(format!("debt {}", payment.debt_id)))?;
        debt.apply_payment(&payment)?;

        let ledger: Vec<PaymentRow> = self
            .select(
                PAYMENTS,
                &[household_filter(household), ("deuda_id", format!("eq.{}", payment.debt_id))],
            )
            .await?;
        let mut ledger: Vec<DebtPayment> = ledger.into_iter().map(DebtPayment::from).collect();
        ledger.push(payment.clone());
        let updated = debt.reconcile(&ledger);

        let _: PaymentRow = self.insert(PAYMENTS, &PaymentRow::new(household, &payment)).await?;
        let patch = DebtBalancePatch {
            saldo_actual: updated.current_balance,
            liquidada: updated.is_settled,
            fecha_liquidacion: updated.settled_date,
        };
        match self
            .update::<_, DebtRow>(DEBTS, &[household_filter(household), debt_filter], &patch)
            .await
        {
            Ok(stored) => Ok(stored.into()),
            Err(err) => {
                let undo = [household_filter(household), ("id", format!("eq.{}", payment.id))];
                if let Err(undo_err) = self.delete(PAYMENTS, &undo).await {
                    error!(
                        %household,
                        payment = %payment.id,
                        error = %undo_err,
                        "failed to roll back payment after balance update failed"
                    );
                }
                Err(err)
            }
        }
    }

    fn live(&self, household: HouseholdId) -> LiveCollections {
        self.live.get(household)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DebtRow {
    id: DebtId,
    user_id: HouseholdId,
    nombre: String,
    saldo_original: Money,
    saldo_actual: Money,
    #[serde(default)]
    tasa_interes: f64,
    #[serde(default)]
    pago_minimo: Money,
    #[serde(default)]
    prioridad: i32,
    #[serde(default)]
    liquidada: bool,
    #[serde(default)]
    fecha_liquidacion: Option<NaiveDate>,
}

impl From<DebtRow> for Debt {
    fn from(row: DebtRow) -> Self {
        Debt {
            id: row.id,
            name: row.nombre,
            owner_id: row.user_id,
            original_balance: row.saldo_original,
            current_balance: row.saldo_actual,
            annual_rate_percent: row.tasa_interes,
            minimum_payment: row.pago_minimo,
            priority: row.prioridad,
            is_settled: row.liquidada,
            settled_date: row.fecha_liquidacion,
        }
    }
}

#[derive(Debug, Serialize)]
struct DebtBalancePatch {
    saldo_actual: Money,
    liquidada: bool,
    fecha_liquidacion: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExpenseRow {
    id: ExpenseId,
    user_id: HouseholdId,
    fecha: NaiveDate,
    categoria: String,
    #[serde(default)]
    descripcion: Option<String>,
    monto: Money,
    propietario: Owner,
    #[serde(default)]
    es_fijo: bool,
    #[serde(default)]
    tiene_comprobante: bool,
    #[serde(default)]
    tarjeta_id: Option<CardId>,
}

impl ExpenseRow {
    fn new(household: HouseholdId, expense: &Expense) -> Self {
        Self {
            id: expense.id,
            user_id: household,
            fecha: expense.date,
            categoria: expense.category.clone(),
            descripcion: Some(expense.description.clone()),
            monto: expense.amount,
            propietario: expense.owner,
            es_fijo: expense.is_fixed,
            tiene_comprobante: expense.has_voucher,
            tarjeta_id: expense.card_id,
        }
    }
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: row.id,
            date: row.fecha,
            category: row.categoria,
            description: row.descripcion.unwrap_or_default(),
            amount: row.monto,
            owner: row.propietario,
            is_fixed: row.es_fijo,
            has_voucher: row.tiene_comprobante,
            card_id: row.tarjeta_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PaymentRow {
    id: PaymentId,
    user_id: HouseholdId,
    deuda_id: DebtId,
    fecha: NaiveDate,
    monto: Money,
}

impl PaymentRow {
    fn new(household: HouseholdId, payment: &DebtPayment) -> Self {
        Self {
            id: payment.id,
            user_id: household,
            deuda_id: payment.debt_id,
            fecha: payment.date,
            monto: payment.amount,
        }
    }
}

impl From<PaymentRow> for DebtPayment {
    fn from(row: PaymentRow) -> Self {
        DebtPayment {
            id: row.id,
            debt_id: row.deuda_id,
            date: row.fecha,
            amount: row.monto,
        }
    }
}
