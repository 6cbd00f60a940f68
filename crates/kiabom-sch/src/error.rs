use thiserror::Error;

/// Maximum number of grouping fields, including the mandatory ones.
pub const MAX_GROUP_FIELDS: usize = 7;

/// A reference designator without a numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed reference designator '{reference}': no numeric suffix, ordering it lexically")]
pub struct MalformedReference {
    pub reference: String,
}

impl MalformedReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// Configuration errors that abort BOM generation before anything is written.
#[derive(Debug, Error)]
pub enum BomError {
    #[error("Column '{0}' is neither a supported column nor a field on any component")]
    UnsupportedColumn(String),

    #[error("Currency '{0}' is not supported. Supported currencies are GBP, EUR and USD")]
    UnsupportedCurrency(String),

    #[error("Grouping by '{0}' is mandatory")]
    MissingMandatoryGroupField(&'static str),

    #[error("More than {max} group fields are not supported (got {got})")]
    TooManyGroupFields { max: usize, got: usize },

    #[error("Board quantity must be at least 1")]
    InvalidBoardQuantity,

    #[error("Order quantity of {reference} overflows at {board_quantity} boards")]
    QuantityOverflow {
        reference: String,
        board_quantity: u64,
    },

    #[error("No columns selected")]
    NoColumns,
}

/// Recoverable problems encountered while building a BOM.
///
/// These never abort the run; they are collected on the [`crate::Bom`] and
/// reported once the table has been produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BomWarning {
    #[error(transparent)]
    MalformedReference(#[from] MalformedReference),

    #[error("{supplier} lookup failed, treating its parts as not found: {reason}")]
    SupplierUnavailable { supplier: String, reason: String },

    #[error("{reference}: quantity field '{value}' is not a positive integer, counting 1")]
    InvalidQuantity { reference: String, value: String },
}
