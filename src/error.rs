use thiserror::Error;

/// Доменные ошибки движка бронирования. Каждый вариант возвращается вызывающему
/// как есть, ничего не схлопывается в общий текст.
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("duplicate {field}: {value} already exists")]
    DuplicateKey { field: &'static str, value: String },

    #[error("{entity} {key} does not exist")]
    NotFound { entity: &'static str, key: String },

    #[error("seat {ssid} is already held by another booking")]
    SeatUnavailable { ssid: i64 },

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    /// Сбой хранилища или соединения. Операции транзакционны, поэтому вызов
    /// можно безопасно повторить целиком.
    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

impl ReservationError {
    pub fn duplicate(field: &'static str, value: impl ToString) -> Self {
        Self::DuplicateKey {
            field,
            value: value.to_string(),
        }
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Транзиентная ошибка хранилища, в отличие от доменной — кандидат на retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, ReservationError>;
