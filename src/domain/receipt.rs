use chrono::{DateTime, Local};
use rust_decimal::Decimal;

use super::Ledger;

/// One row of the counting receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    pub label: String,
    pub quantity: u64,
    pub subtotal: Decimal,
}

/// Everything a receipt printout needs: per-denomination breakdown, the
/// grand total and when the count was taken.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub lines: Vec<ReceiptLine>,
    pub total: Decimal,
    pub counted_at: DateTime<Local>,
}

impl Receipt {
    pub fn from_ledger(ledger: &Ledger, counted_at: DateTime<Local>) -> Self {
        let lines = ledger
            .entries()
            .map(|(d, quantity)| ReceiptLine {
                label: d.label.clone(),
                quantity,
                subtotal: ledger.subtotal(d.face_value),
            })
            .collect();

        Self {
            lines,
            total: ledger.total(),
            counted_at,
        }
    }

    /// Lines with a non-zero quantity.
    pub fn counted_lines(&self) -> impl Iterator<Item = &ReceiptLine> {
        self.lines.iter().filter(|line| line.quantity > 0)
    }

    /// Total rendered like the till display, e.g. "400,00".
    pub fn total_label(&self) -> String {
        format_decimal_comma(self.total)
    }

    /// Timestamp as printed on the receipt.
    pub fn timestamp_label(&self) -> String {
        self.counted_at.format("%Y-%m-%d, %H:%M Uhr").to_string()
    }
}

/// Render a 2-place decimal with a comma separator.
pub fn format_decimal_comma(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2)).replace('.', ",")
}
