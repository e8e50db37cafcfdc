use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use finanzas_budget::{DebtPayment, Expense, Owner, PayoffStrategy};
use finanzas_chat::ChatMessage;
use finanzas_core::{CardId, DebtId, ExpenseId, Money};

// -------------------------
// Chat
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub system_context: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

// -------------------------
// /api/finanzas
// -------------------------

#[derive(Debug, Deserialize)]
pub struct FinanzasRequest {
    pub action: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimularPagoExtraParams {
    pub monto_extra: f64,
    #[serde(default)]
    pub estrategia: PayoffStrategy,
}

#[derive(Debug, Default, Deserialize)]
pub struct ObtenerRitmoParams {
    #[serde(default)]
    pub fecha: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResumenMensualParams {
    /// `YYYY-MM`; defaults to the current month.
    #[serde(default)]
    pub mes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrarGastoParams {
    pub expense: NewExpense,
}

#[derive(Debug, Deserialize)]
pub struct RegistrarPagoParams {
    pub payment: NewPayment,
}

/// Expense as submitted by the dashboard; the id is assigned here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub amount: Money,
    pub owner: Owner,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default)]
    pub has_voucher: bool,
    #[serde(default)]
    pub card_id: Option<CardId>,
}

impl NewExpense {
    pub fn into_expense(self, today: NaiveDate) -> Expense {
        Expense {
            id: ExpenseId::new(),
            date: self.date.unwrap_or(today),
            category: self.category,
            description: self.description,
            amount: self.amount,
            owner: self.owner,
            is_fixed: self.is_fixed,
            has_voucher: self.has_voucher,
            card_id: self.card_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub debt_id: DebtId,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub amount: Money,
}

impl NewPayment {
    pub fn into_payment(self, today: NaiveDate) -> DebtPayment {
        DebtPayment::new(self.debt_id, self.date.unwrap_or(today), self.amount)
    }
}

#[derive(Debug, Serialize)]
pub struct FinanzasResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> FinanzasResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

// -------------------------
// Preferences
// -------------------------

#[derive(Debug, Serialize)]
pub struct PreferenceResponse {
    pub key: String,
    pub value: serde_json::Value,
}
