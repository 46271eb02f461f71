use super::{Cents, format_cents_comma, parse_cents};

/// Largest face value that still fits the 5-digit payload key.
pub const MAX_FACE_VALUE: Cents = 99_999;

/// Most denominations a catalog may hold. Together with `MAX_FACE_VALUE` this
/// bounds any ledger total below 2^88 cents.
pub const MAX_DENOMINATIONS: usize = 100;

/// A note or coin the till accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Denomination {
    /// Display label, e.g. "2,00"
    pub label: String,
    /// Face value in cents, e.g. 200
    pub face_value: Cents,
}

impl Denomination {
    pub fn new(face_value: Cents) -> Result<Self, CatalogError> {
        if face_value <= 0 || face_value > MAX_FACE_VALUE {
            return Err(CatalogError::FaceValueOutOfRange(face_value));
        }
        Ok(Self {
            label: format_cents_comma(face_value),
            face_value,
        })
    }

    /// Key used for this denomination in the counting payload.
    /// Example: 200 -> "number_of_00200"
    pub fn payload_key(&self) -> String {
        format!("number_of_{:05}", self.face_value)
    }
}

/// Ordered set of denominations, largest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    denominations: Vec<Denomination>,
}

/// The till catalog: 200,00 down to 0,10.
const DEFAULT_FACE_VALUES: [Cents; 11] = [
    20000, 10000, 5000, 2000, 1000, 500, 200, 100, 50, 20, 10,
];

/// Every euro note and coin: 500,00 down to 0,01.
const EURO_FACE_VALUES: [Cents; 15] = [
    50000, 20000, 10000, 5000, 2000, 1000, 500, 200, 100, 50, 20, 10, 5, 2, 1,
];

impl Catalog {
    /// Build a catalog from face values in any order.
    pub fn from_face_values(values: &[Cents]) -> Result<Self, CatalogError> {
        if values.is_empty() {
            return Err(CatalogError::Empty);
        }
        if values.len() > MAX_DENOMINATIONS {
            return Err(CatalogError::TooMany(values.len()));
        }

        let mut denominations = values
            .iter()
            .map(|&v| Denomination::new(v))
            .collect::<Result<Vec<_>, _>>()?;
        denominations.sort_by(|a, b| b.face_value.cmp(&a.face_value));

        if let Some(pair) = denominations
            .windows(2)
            .find(|pair| pair[0].face_value == pair[1].face_value)
        {
            return Err(CatalogError::Duplicate(pair[0].face_value));
        }

        Ok(Self { denominations })
    }

    /// Parse a comma-separated list of amounts, e.g. "200,100,0.50".
    pub fn parse(list: &str) -> Result<Self, CatalogError> {
        let values = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                parse_cents(s).map_err(|_| CatalogError::InvalidAmount(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_face_values(&values)
    }

    pub fn euro() -> Self {
        Self::from_known(&EURO_FACE_VALUES)
    }

    pub fn denominations(&self) -> &[Denomination] {
        &self.denominations
    }

    pub fn len(&self) -> usize {
        self.denominations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.denominations.is_empty()
    }

    /// Position of a face value in the catalog, if it is part of it.
    pub fn position(&self, face_value: Cents) -> Option<usize> {
        self.denominations
            .iter()
            .position(|d| d.face_value == face_value)
    }

    pub fn get(&self, face_value: Cents) -> Option<&Denomination> {
        self.position(face_value).map(|i| &self.denominations[i])
    }

    fn from_known(values: &[Cents]) -> Self {
        Self {
            denominations: values
                .iter()
                .map(|&face_value| Denomination {
                    label: format_cents_comma(face_value),
                    face_value,
                })
                .collect(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::from_known(&DEFAULT_FACE_VALUES)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("denomination catalog must not be empty")]
    Empty,

    #[error("catalog lists {0} denominations, at most 100 are allowed")]
    TooMany(usize),

    #[error("face value {0} cents is out of range (1..=99999)")]
    FaceValueOutOfRange(Cents),

    #[error("denomination {0} cents is listed twice")]
    Duplicate(Cents),

    #[error("invalid denomination amount: '{0}'")]
    InvalidAmount(String),
}
