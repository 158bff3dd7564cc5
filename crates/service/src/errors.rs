use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("access denied: {0}")]
    Forbidden(String),
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no stop has a complete address")]
    NoValidAddresses,
    #[error("no origin address is configured")]
    MissingOrigin,
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{} not found", entity))
    }

    pub fn db(err: sea_orm::DbErr) -> Self {
        Self::Db(err.to_string())
    }
}

impl From<common::money::InvalidAmount> for ServiceError {
    fn from(err: common::money::InvalidAmount) -> Self {
        Self::Validation(err.to_string())
    }
}
