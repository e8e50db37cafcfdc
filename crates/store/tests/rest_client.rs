use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{Value, json};

use finanzas_budget::{DebtPayment, Expense, Owner};
use finanzas_core::{DebtId, DomainError, ExpenseId, HouseholdId, Money};
use finanzas_store::{FinanceStore, RestConfig, RestFinanceStore, StoreError, refresh_live};

const API_KEY: &str = "anon-test-key";
/// Debts with this name make the fake answer 500 to balance updates.
const LOCKED_DEBT: &str = "bloqueada";

type Tables = Arc<Mutex<HashMap<String, Vec<Value>>>>;

/// Minimal PostgREST stand-in: `eq.` filters only.
struct FakeRest {
    base_url: String,
    tables: Tables,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeRest {
    async fn spawn() -> Self {
        let tables: Tables = Arc::default();
        let app = Router::new()
            .route("/rest/v1/:table", get(select).post(insert).patch(update).delete(remove))
            .with_state(tables.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            tables,
            handle,
        }
    }

    fn seed(&self, table: &str, row: Value) {
        self.tables.lock().unwrap().entry(table.to_string()).or_default().push(row);
    }

    fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
    }

    fn client(&self) -> RestFinanceStore {
        let mut config = RestConfig::new(&self.base_url, API_KEY);
        config.timeout = Duration::from_secs(5);
        RestFinanceStore::new(config).unwrap()
    }
}

impl Drop for FakeRest {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    let key = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
    key == Some(API_KEY) && bearer == Some(format!("Bearer {API_KEY}").as_str())
}

fn matches(row: &Value, filters: &HashMap<String, String>) -> bool {
    filters.iter().filter(|(k, _)| k.as_str() != "select").all(|(column, filter)| {
        let expected = filter.strip_prefix("eq.").unwrap_or(filter);
        row.get(column).and_then(Value::as_str) == Some(expected)
    })
}

async fn select(
    State(tables): State<Tables>,
    Path(table): Path<String>,
    Query(filters): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "no api key"})));
    }
    let tables = tables.lock().unwrap();
    let rows: Vec<Value> = tables
        .get(&table)
        .map(|rows| rows.iter().filter(|r| matches(r, &filters)).cloned().collect())
        .unwrap_or_default();
    (StatusCode::OK, Json(Value::Array(rows)))
}

async fn insert(
    State(tables): State<Tables>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(row): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "no api key"})));
    }
    if table == "gastos" && row["categoria"] == "explota" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "boom"})));
    }
    tables.lock().unwrap().entry(table).or_default().push(row.clone());
    (StatusCode::CREATED, Json(json!([row])))
}

async fn update(
    State(tables): State<Tables>,
    Path(table): Path<String>,
    Query(filters): Query<HashMap<String, String>>,
    Json(patch): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut tables = tables.lock().unwrap();
    let rows = tables.entry(table).or_default();
    if rows.iter().any(|r| matches(r, &filters) && r["nombre"] == LOCKED_DEBT) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "row locked"})));
    }
    let mut updated = Vec::new();
    for row in rows.iter_mut() {
        if !matches(row, &filters) {
            continue;
        }
        if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
        }
        updated.push(row.clone());
    }
    (StatusCode::OK, Json(Value::Array(updated)))
}

async fn remove(
    State(tables): State<Tables>,
    Path(table): Path<String>,
    Query(filters): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    if let Some(rows) = tables.lock().unwrap().get_mut(&table) {
        rows.retain(|r| !matches(r, &filters));
    }
    StatusCode::NO_CONTENT
}

fn debt_row(household: HouseholdId, id: DebtId, balance: f64) -> Value {
    named_debt_row("Tarjeta", household, id, balance, balance)
}

fn named_debt_row(name: &str, household: HouseholdId, id: DebtId, original: f64, balance: f64) -> Value {
    json!({
        "id": id.to_string(),
        "user_id": household.to_string(),
        "nombre": name,
        "saldo_original": original,
        "saldo_actual": balance,
        "tasa_interes": 42.0,
        "pago_minimo": 150.0,
        "prioridad": 1,
        "liquidada": false,
        "fecha_liquidacion": null
    })
}

fn expense(category: &str) -> Expense {
    Expense {
        id: ExpenseId::new(),
        date: NaiveDate::from_ymd_opt(2026, 6, 3).unwrap(),
        category: category.to_string(),
        description: "mercado".to_string(),
        amount: Money::from_units(820),
        owner: Owner::OwnerA,
        is_fixed: false,
        has_voucher: false,
        card_id: None,
    }
}

#[tokio::test]
async fn reads_are_scoped_to_household() {
    let srv = FakeRest::spawn().await;
    let mine = HouseholdId::new();
    let theirs = HouseholdId::new();
    srv.seed("deudas", debt_row(mine, DebtId::new(), 2_500.0));
    srv.seed("deudas", debt_row(theirs, DebtId::new(), 900.0));

    let store = srv.client();
    let debts = store.debts(mine).await.unwrap();
    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0].owner_id, mine);
    assert_eq!(debts[0].current_balance, Money::from_units(2_500));
    assert!(store.payments(mine).await.unwrap().is_empty());
}

#[tokio::test]
async fn insert_expense_round_trips_through_representation() {
    let srv = FakeRest::spawn().await;
    let hh = HouseholdId::new();
    let store = srv.client();

    let stored = store.insert_expense(hh, expense("comida")).await.unwrap();
    assert_eq!(stored.category, "comida");
    assert_eq!(stored.amount, Money::from_units(820));

    let rows = srv.rows("gastos");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user_id"], hh.to_string());
    assert_eq!(rows[0]["propietario"], "ownerA");
}

#[tokio::test]
async fn record_payment_appends_ledger_and_patches_debt() {
    let srv = FakeRest::spawn().await;
    let hh = HouseholdId::new();
    let debt_id = DebtId::new();
    srv.seed("deudas", debt_row(hh, debt_id, 1_000.0));
    let store = srv.client();

    let payment = DebtPayment::new(debt_id, NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(), Money::from_units(1_000));
    let updated = store.record_payment(hh, payment).await.unwrap();

    assert!(updated.is_settled);
    assert_eq!(updated.current_balance, Money::ZERO);
    assert_eq!(srv.rows("pagos_deuda").len(), 1);
    assert_eq!(srv.rows("deudas")[0]["liquidada"], true);
    assert_eq!(srv.rows("deudas")[0]["fecha_liquidacion"], "2026-06-15");
}

#[tokio::test]
async fn record_payment_rebuilds_balance_from_ledger() {
    let srv = FakeRest::spawn().await;
    let hh = HouseholdId::new();
    let debt_id = DebtId::new();
    srv.seed("deudas", named_debt_row("Auto", hh, debt_id, 3_000.0, 2_500.0));
    srv.seed(
        "pagos_deuda",
        json!({
            "id": finanzas_core::PaymentId::new().to_string(),
            "user_id": hh.to_string(),
            "deuda_id": debt_id.to_string(),
            "fecha": "2026-05-15",
            "monto": 500.0
        }),
    );
    let store = srv.client();

    let payment = DebtPayment::new(debt_id, NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(), Money::from_units(1_000));
    let updated = store.record_payment(hh, payment).await.unwrap();

    assert_eq!(updated.current_balance, Money::from_units(1_500));
    assert!(!updated.is_settled);
    assert_eq!(srv.rows("pagos_deuda").len(), 2);
    assert_eq!(srv.rows("deudas")[0]["saldo_actual"], 1_500.0);
}

#[tokio::test]
async fn failed_balance_update_removes_ledger_row() {
    let srv = FakeRest::spawn().await;
    let hh = HouseholdId::new();
    let debt_id = DebtId::new();
    srv.seed("deudas", named_debt_row(LOCKED_DEBT, hh, debt_id, 1_000.0, 1_000.0));
    let store = srv.client();

    // A retry after the failure must not stack ledger rows either.
    for _ in 0..2 {
        let payment = DebtPayment::new(debt_id, NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(), Money::from_units(200));
        let err = store.record_payment(hh, payment).await.unwrap_err();
        assert!(err.is_unavailable(), "got {err:?}");
    }

    assert!(srv.rows("pagos_deuda").is_empty());
    assert_eq!(srv.rows("deudas")[0]["saldo_actual"], 1_000.0);
    assert!(store.payments(hh).await.unwrap().is_empty());
}

#[tokio::test]
async fn payment_for_unknown_debt_is_not_found() {
    let srv = FakeRest::spawn().await;
    let store = srv.client();

    let payment = DebtPayment::new(DebtId::new(), NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(), Money::from_units(10));
    let err = store.record_payment(HouseholdId::new(), payment).await.unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::NotFound(_))));
    assert!(srv.rows("pagos_deuda").is_empty());
}

#[tokio::test]
async fn server_errors_map_to_unavailable() {
    let srv = FakeRest::spawn().await;
    let store = srv.client();

    let err = store.insert_expense(HouseholdId::new(), expense("explota")).await.unwrap_err();
    assert!(err.is_unavailable(), "got {err:?}");
}

#[tokio::test]
async fn wrong_key_is_rejected() {
    let srv = FakeRest::spawn().await;
    let store = RestFinanceStore::new(RestConfig::new(&srv.base_url, "wrong")).unwrap();

    let err = store.debts(HouseholdId::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::Rejected { status: 401, .. }), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_is_unavailable() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = RestFinanceStore::new(RestConfig::new(format!("http://{addr}"), API_KEY)).unwrap();
    let err = store.expenses(HouseholdId::new()).await.unwrap_err();
    assert!(err.is_unavailable(), "got {err:?}");
}

#[tokio::test]
async fn refresh_publishes_remote_rows_to_observers() {
    let srv = FakeRest::spawn().await;
    let hh = HouseholdId::new();
    srv.seed("deudas", debt_row(hh, DebtId::new(), 700.0));
    let store = srv.client();

    assert_eq!(refresh_live(&store, hh).await.unwrap(), 3);
    assert_eq!(store.live(hh).debts.latest().len(), 1);

    srv.seed("deudas", debt_row(hh, DebtId::new(), 300.0));
    assert_eq!(refresh_live(&store, hh).await.unwrap(), 1);
    assert_eq!(store.live(hh).debts.latest().len(), 2);
}
