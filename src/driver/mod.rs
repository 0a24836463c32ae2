pub mod ads;
pub mod cdp;
pub mod login;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod fake;
