mod billing;
#[cfg(test)]
pub(crate) mod memory;

pub use billing::BillingServiceImpl;
