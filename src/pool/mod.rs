pub mod callback;
pub mod flash;
pub mod oracle;
pub mod position;
pub mod swap;
pub mod tick;
pub mod v3_pool;

#[cfg(test)]
pub(crate) mod fixtures;
