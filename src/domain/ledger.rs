use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::{Catalog, Cents, Denomination};

/// Parse operator input into a quantity.
/// Empty, non-numeric, negative or out-of-range input counts as 0.
pub fn parse_count(raw: &str) -> u64 {
    raw.trim().parse::<u64>().unwrap_or(0)
}

/// Whether the UI should accept `raw` without flagging it.
/// Empty input is "not entered yet" and is fine.
pub fn is_valid_count(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw.parse::<u64>().is_ok()
}

/// Handle returned by [`Ledger::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Notification sent to subscribers after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerChange {
    pub face_value: Cents,
    pub quantity: u64,
    pub total: Decimal,
}

type Listener = Box<dyn FnMut(&LedgerChange) + Send + Sync>;

/// Per-denomination quantities for one counting session.
/// Quantities are stored in catalog order.
pub struct Ledger {
    catalog: Catalog,
    quantities: Vec<u64>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Ledger {
    pub fn new(catalog: Catalog) -> Self {
        let quantities = vec![0; catalog.len()];
        Self {
            catalog,
            quantities,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Set a quantity from raw operator input. Never fails: bad input is
    /// stored as 0 and unknown denominations are ignored.
    pub fn set_count(&mut self, face_value: Cents, raw: &str) {
        if !is_valid_count(raw) {
            debug!(face_value, raw, "coercing invalid count to 0");
        }
        self.set_quantity(face_value, parse_count(raw));
    }

    pub fn set_quantity(&mut self, face_value: Cents, quantity: u64) {
        let Some(index) = self.catalog.position(face_value) else {
            warn!(face_value, "ignoring count for denomination not in catalog");
            return;
        };
        self.quantities[index] = quantity;
        self.notify(face_value, quantity);
    }

    /// Add one to a quantity.
    pub fn increment(&mut self, face_value: Cents) {
        let next = self.quantity(face_value).saturating_add(1);
        self.set_quantity(face_value, next);
    }

    /// Remove one from a quantity, stopping at 0.
    pub fn decrement(&mut self, face_value: Cents) {
        let next = self.quantity(face_value).saturating_sub(1);
        self.set_quantity(face_value, next);
    }

    /// Quantity counted for a denomination (0 if unset or unknown).
    pub fn quantity(&self, face_value: Cents) -> u64 {
        self.catalog
            .position(face_value)
            .map(|i| self.quantities[i])
            .unwrap_or(0)
    }

    /// Denominations paired with their quantities, largest first.
    pub fn entries(&self) -> impl Iterator<Item = (&Denomination, u64)> {
        self.catalog
            .denominations()
            .iter()
            .zip(self.quantities.iter().copied())
    }

    /// Grand total in cents.
    pub fn total_cents(&self) -> i128 {
        self.entries().map(|(d, qty)| value_cents(d, qty)).sum()
    }

    /// Grand total as an exact decimal, e.g. 8.00.
    pub fn total(&self) -> Decimal {
        // At most MAX_DENOMINATIONS face values of at most MAX_FACE_VALUE cents,
        // times u64::MAX, stays below 2^88: inside Decimal's 96-bit mantissa.
        Decimal::from_i128_with_scale(self.total_cents(), 2)
    }

    /// Exact value counted for one denomination, e.g. 30.00 for 15 × 2,00.
    pub fn subtotal(&self, face_value: Cents) -> Decimal {
        let cents = self
            .catalog
            .get(face_value)
            .map(|d| value_cents(d, self.quantity(face_value)))
            .unwrap_or(0);
        Decimal::from_i128_with_scale(cents, 2)
    }

    /// One `number_of_XXXXX` entry per catalog denomination.
    pub fn to_payload(&self) -> BTreeMap<String, u64> {
        self.entries()
            .map(|(d, qty)| (d.payload_key(), qty))
            .collect()
    }

    /// Clear every quantity back to 0.
    pub fn reset(&mut self) {
        let counted: Vec<Cents> = self
            .entries()
            .filter(|(_, qty)| *qty > 0)
            .map(|(d, _)| d.face_value)
            .collect();
        for face_value in counted {
            self.set_quantity(face_value, 0);
        }
    }

    /// Register a listener called after every quantity change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&LedgerChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, face_value: Cents, quantity: u64) {
        if self.listeners.is_empty() {
            return;
        }
        let change = LedgerChange {
            face_value,
            quantity,
            total: self.total(),
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}

fn value_cents(denomination: &Denomination, quantity: u64) -> i128 {
    i128::from(quantity) * i128::from(denomination.face_value)
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("catalog", &self.catalog)
            .field("quantities", &self.quantities)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(Catalog::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12"), 12);
        assert_eq!(parse_count(" 7 "), 7);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count("-3"), 0);
        assert_eq!(parse_count("1.5"), 0);
        assert_eq!(parse_count("99999999999999999999999"), 0);
    }

    #[test]
    fn test_is_valid_count() {
        assert!(is_valid_count(""));
        assert!(is_valid_count("0"));
        assert!(is_valid_count("42"));
        assert!(!is_valid_count("-1"));
        assert!(!is_valid_count("x"));
    }

    #[test]
    fn test_total_has_no_float_drift() {
        let mut ledger = Ledger::default();
        ledger.set_count(10, "10");
        ledger.set_count(20, "10");
        ledger.set_count(50, "10");

        assert_eq!(ledger.total(), Decimal::new(800, 2));
        assert_eq!(ledger.total().to_string(), "8.00");
    }

    #[test]
    fn test_invalid_input_is_stored_as_zero() {
        let mut ledger = Ledger::default();
        ledger.set_count(200, "5");
        ledger.set_count(200, "five");
        assert_eq!(ledger.quantity(200), 0);

        ledger.set_count(100, "-4");
        assert_eq!(ledger.quantity(100), 0);
        assert_eq!(ledger.to_payload()["number_of_00100"], 0);
    }

    #[test]
    fn test_unknown_denomination_is_ignored() {
        let mut ledger = Ledger::default();
        ledger.set_count(5, "3");

        assert_eq!(ledger.quantity(5), 0);
        assert!(!ledger.to_payload().contains_key("number_of_00005"));
        assert_eq!(ledger.total_cents(), 0);
    }

    #[test]
    fn test_payload_has_one_key_per_denomination() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.to_payload().len(), 11);
        assert!(ledger.to_payload().values().all(|&v| v == 0));

        ledger.set_count(20000, "1");
        ledger.set_count(7, "1");
        let payload = ledger.to_payload();
        assert_eq!(payload.len(), 11);
        assert_eq!(payload["number_of_20000"], 1);
    }

    #[test]
    fn test_increment_and_decrement() {
        let mut ledger = Ledger::default();
        ledger.increment(50);
        ledger.increment(50);
        assert_eq!(ledger.quantity(50), 2);

        ledger.decrement(50);
        ledger.decrement(50);
        ledger.decrement(50);
        assert_eq!(ledger.quantity(50), 0);
    }

    #[test]
    fn test_total_is_exact_past_i64_cents() {
        let mut ledger = Ledger::default();
        ledger.set_count(20000, "1000000000000000");
        assert_eq!(ledger.total(), Decimal::from(200_000_000_000_000_000_u64));
        assert_eq!(ledger.total().to_string(), "200000000000000000.00");
        assert_eq!(ledger.subtotal(20000), ledger.total());

        let mut ledger = Ledger::new(Catalog::euro());
        for denomination in Catalog::euro().denominations() {
            ledger.set_quantity(denomination.face_value, u64::MAX);
        }
        // 500,00 + 200,00 + ... + 0,01 = 888,88
        assert_eq!(ledger.total_cents(), i128::from(u64::MAX) * 88_888);
        assert_eq!(ledger.total(), Decimal::from(u64::MAX) * Decimal::new(88_888, 2));
    }

    #[test]
    fn test_total_of_largest_catalog_at_max_counts() {
        let face_values: Vec<Cents> = (99_900..=99_999).collect();
        let mut ledger = Ledger::new(Catalog::from_face_values(&face_values).unwrap());
        for &face_value in &face_values {
            ledger.set_quantity(face_value, u64::MAX);
        }

        let face_value_sum: i128 = face_values.iter().map(|&v| i128::from(v)).sum();
        let expected = i128::from(u64::MAX) * face_value_sum;
        assert_eq!(ledger.total_cents(), expected);
        assert_eq!(ledger.total().mantissa(), expected);
        assert_eq!(ledger.total().scale(), 2);
    }

    #[test]
    fn test_subtotal() {
        let mut ledger = Ledger::default();
        ledger.set_count(200, "15");
        assert_eq!(ledger.subtotal(200), Decimal::new(3000, 2));
        assert_eq!(ledger.subtotal(100), Decimal::ZERO);
        assert_eq!(ledger.subtotal(5), Decimal::ZERO);
    }

    #[test]
    fn test_subscribers_see_changes() {
        let mut ledger = Ledger::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = ledger.subscribe(move |change| sink.lock().unwrap().push(change.clone()));

        ledger.set_count(200, "3");
        ledger.set_count(5000, "1");

        {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert_eq!(seen[0].face_value, 200);
            assert_eq!(seen[0].total, Decimal::new(600, 2));
            assert_eq!(seen[1].quantity, 1);
            assert_eq!(seen[1].total, Decimal::new(5600, 2));
        }

        assert!(ledger.unsubscribe(id));
        assert!(!ledger.unsubscribe(id));
        ledger.set_count(200, "4");
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_reset_notifies_counted_denominations() {
        let mut ledger = Ledger::default();
        ledger.set_count(200, "3");
        ledger.set_count(10, "9");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        ledger.subscribe(move |change| sink.lock().unwrap().push(change.face_value));

        ledger.reset();
        assert_eq!(ledger.total_cents(), 0);
        assert_eq!(*seen.lock().unwrap(), vec![200, 10]);
    }
}
