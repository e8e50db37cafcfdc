//! `POST /api/finanzas`: action-dispatched finance computations.
//!
//! Body `{action, params}`; answers `{success: true, data}` or
//! `{success: false, error}`.

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse, response::Response};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use finanzas_budget::{
    Expense, SimulationOptions, classify_pacing_on, compute_health_score, monthly_summary,
    simulate_extra_payment, standard_factors, variable_spent_in_month,
};
use finanzas_core::{DomainError, Money};

use crate::app::dto;
use crate::app::errors::{domain_error_to_response, finanzas_error, store_error_to_response};
use crate::app::services::AppServices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SimularPagoExtra,
    ObtenerHealthScore,
    ObtenerRitmo,
    ResumenMensual,
    RegistrarGasto,
    RegistrarPago,
}

impl Action {
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "simular_pago_extra" => Action::SimularPagoExtra,
            "obtener_health_score" => Action::ObtenerHealthScore,
            "obtener_ritmo" => Action::ObtenerRitmo,
            "resumen_mensual" => Action::ResumenMensual,
            "registrar_gasto" => Action::RegistrarGasto,
            "registrar_pago" => Action::RegistrarPago,
            _ => return None,
        })
    }
}

type ActionResult = Result<Response, Response>;

pub async fn dispatch(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::FinanzasRequest>,
) -> Response {
    let Some(action) = Action::parse(&body.action) else {
        warn!(action = %body.action, "unknown finanzas action");
        return finanzas_error(
            StatusCode::BAD_REQUEST,
            format!("Acción desconocida: {}", body.action),
        );
    };
    debug!(?action, household = %services.household, "finanzas action");

    let params = if body.params.is_null() { json!({}) } else { body.params };
    let result = match action {
        Action::SimularPagoExtra => simular_pago_extra(&services, params).await,
        Action::ObtenerHealthScore => obtener_health_score(&services).await,
        Action::ObtenerRitmo => obtener_ritmo(&services, params).await,
        Action::ResumenMensual => resumen_mensual(&services, params).await,
        Action::RegistrarGasto => registrar_gasto(&services, params).await,
        Action::RegistrarPago => registrar_pago(&services, params).await,
    };
    result.unwrap_or_else(|err| err)
}

fn success<T: Serialize>(data: T) -> ActionResult {
    Ok((StatusCode::OK, Json(dto::FinanzasResponse::ok(data))).into_response())
}

fn parse_params<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, Response> {
    serde_json::from_value(params).map_err(|e| {
        finanzas_error(StatusCode::BAD_REQUEST, format!("Parámetros inválidos: {e}"))
    })
}

async fn simular_pago_extra(services: &AppServices, params: serde_json::Value) -> ActionResult {
    let params: dto::SimularPagoExtraParams = parse_params(params)?;
    let extra = Money::from_major(params.monto_extra).map_err(domain_error_to_response)?;
    if extra.is_negative() {
        return Err(domain_error_to_response(DomainError::validation(
            "InvalidInput: extra monthly payment must not be negative",
        )));
    }

    let debts = services
        .store
        .debts(services.household)
        .await
        .map_err(store_error_to_response)?;
    let options = SimulationOptions {
        strategy: params.estrategia,
        ..SimulationOptions::default()
    };
    let result = simulate_extra_payment(&debts, extra, services.today(), &options)
        .map_err(domain_error_to_response)?;
    success(result)
}

async fn obtener_health_score(services: &AppServices) -> ActionResult {
    let store = &services.store;
    let household = services.household;
    let (debts, expenses, payments) = tokio::try_join!(
        store.debts(household),
        store.expenses(household),
        store.payments(household),
    )
    .map_err(store_error_to_response)?;

    let summary = monthly_summary(services.today(), services.monthly_income, &expenses, &payments, &debts);
    let open = debts.iter().filter(|d| d.is_active());
    let total_debt: Money = open.clone().map(|d| d.current_balance).sum();
    let minimums: Money = open.map(|d| d.minimum_payment).sum();
    let spending = summary.fixed_expenses + summary.variable_expenses;

    let factors = standard_factors(total_debt, services.monthly_income, spending, minimums)
        .map_err(domain_error_to_response)?;
    let score = compute_health_score(total_debt, services.monthly_income, spending, &factors)
        .map_err(domain_error_to_response)?;
    success(score)
}

async fn obtener_ritmo(services: &AppServices, params: serde_json::Value) -> ActionResult {
    let params: dto::ObtenerRitmoParams = parse_params(params)?;
    let on = params.fecha.unwrap_or_else(|| services.today());

    let expenses = services
        .store
        .expenses(services.household)
        .await
        .map_err(store_error_to_response)?;
    let to_date: Vec<Expense> = expenses.into_iter().filter(|e| e.date <= on).collect();
    let spent = variable_spent_in_month(&to_date, on);

    let report = classify_pacing_on(spent, services.monthly_variable_budget, on)
        .map_err(domain_error_to_response)?;
    success(report)
}

async fn resumen_mensual(services: &AppServices, params: serde_json::Value) -> ActionResult {
    let params: dto::ResumenMensualParams = parse_params(params)?;
    let month = match params.mes {
        Some(mes) => parse_month(&mes).ok_or_else(|| {
            finanzas_error(StatusCode::BAD_REQUEST, format!("Mes inválido '{mes}', se espera AAAA-MM"))
        })?,
        None => services.today(),
    };

    let store = &services.store;
    let household = services.household;
    let (debts, expenses, payments) = tokio::try_join!(
        store.debts(household),
        store.expenses(household),
        store.payments(household),
    )
    .map_err(store_error_to_response)?;

    success(monthly_summary(month, services.monthly_income, &expenses, &payments, &debts))
}

async fn registrar_gasto(services: &AppServices, params: serde_json::Value) -> ActionResult {
    let params: dto::RegistrarGastoParams = parse_params(params)?;
    let expense = params.expense.into_expense(services.today());
    expense.validate().map_err(domain_error_to_response)?;

    let stored = services
        .store
        .insert_expense(services.household, expense)
        .await
        .map_err(store_error_to_response)?;
    success(stored)
}

async fn registrar_pago(services: &AppServices, params: serde_json::Value) -> ActionResult {
    let params: dto::RegistrarPagoParams = parse_params(params)?;
    let payment = params.payment.into_payment(services.today());
    payment.validate().map_err(domain_error_to_response)?;

    let debt = services
        .store
        .record_payment(services.household, payment)
        .await
        .map_err(store_error_to_response)?;
    success(debt)
}

/// `YYYY-MM` to the first day of that month.
fn parse_month(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").ok()
}
