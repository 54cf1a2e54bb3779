pub(crate) mod crypto;
pub(crate) mod health;
