use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid filter range: {0}")]
    RangeInversion(String),

    #[error("Invalid filter bound: {0}")]
    NegativeBound(String),
}
