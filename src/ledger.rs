//! Derived ledger figures
//!
//! This module evaluates the allowance ledger's cascading sums. Each figure
//! consumes only raw inputs or figures computed before it, in this order:
//!
//! 1. total allowance, 2. total debt, 3. total receivables,
//! 4. net allowance, 5. bank balance, 6. expected cash,
//! 7. cash on hand, 8. cash discrepancy, 9. official cash figure.
//!
//! A positive cash discrepancy is a shortfall, a negative one a surplus.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Discrepancies smaller than this are treated as balanced
pub const BALANCE_EPSILON: f64 = 1e-9;

/// A tracked sub-account (e.g. one child's allowance)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAccount {
    #[serde(default)]
    pub name: String,
    pub allowance: f64,
    #[serde(default)]
    pub debt: f64,
}

impl SubAccount {
    pub fn new(name: impl Into<String>, allowance: f64, debt: f64) -> Self {
        Self {
            name: name.into(),
            allowance,
            debt,
        }
    }
}

/// A general receivable/payable line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub label: String,
    pub amount: f64,
}

impl LineItem {
    pub fn new(label: impl Into<String>, amount: f64) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Raw ledger figures supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerInputs {
    #[serde(default)]
    pub accounts: Vec<SubAccount>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Bank balance
    #[serde(default)]
    pub bank: f64,
    /// Cash counted on hand
    #[serde(default)]
    pub cash: f64,
}

/// Figures derived from [`LedgerInputs`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerOutputs {
    pub total_allowance: f64,
    pub total_debt: f64,
    pub total_receivables: f64,
    pub net_allowance: f64,
    pub bank_balance: f64,
    pub expected_cash: f64,
    pub cash_on_hand: f64,
    /// `expected_cash - cash_on_hand`: positive = shortfall, negative = surplus
    pub cash_discrepancy: f64,
    pub official_cash_figure: f64,
}

/// Direction of the cash discrepancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashPosition {
    /// Less cash on hand than expected
    Shortfall,
    /// More cash on hand than expected
    Surplus,
    Balanced,
}

impl LedgerOutputs {
    pub fn position(&self) -> CashPosition {
        if self.cash_discrepancy > BALANCE_EPSILON {
            CashPosition::Shortfall
        } else if self.cash_discrepancy < -BALANCE_EPSILON {
            CashPosition::Surplus
        } else {
            CashPosition::Balanced
        }
    }
}

/// Calculator for the ledger's dependent figures
pub struct DerivedLedgerCalculator;

impl DerivedLedgerCalculator {
    /// Evaluate every derived figure in dependency order
    pub fn compute(inputs: &LedgerInputs) -> LedgerOutputs {
        let total_allowance: f64 = inputs.accounts.iter().map(|a| a.allowance).sum();
        let total_debt: f64 = inputs.accounts.iter().map(|a| a.debt).sum();
        let total_receivables: f64 = inputs.line_items.iter().map(|i| i.amount).sum();
        let net_allowance = total_allowance - total_debt;
        let bank_balance = inputs.bank;
        let expected_cash = (net_allowance - total_receivables) - bank_balance;
        let cash_on_hand = inputs.cash;
        let cash_discrepancy = expected_cash - cash_on_hand;
        let official_cash_figure = total_allowance - bank_balance;

        let outputs = LedgerOutputs {
            total_allowance,
            total_debt,
            total_receivables,
            net_allowance,
            bank_balance,
            expected_cash,
            cash_on_hand,
            cash_discrepancy,
            official_cash_figure,
        };
        debug!(
            accounts = inputs.accounts.len(),
            line_items = inputs.line_items.len(),
            cash_discrepancy,
            "computed ledger"
        );
        outputs
    }
}
