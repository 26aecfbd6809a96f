pub mod account_handlers;
pub mod booking_handlers;
pub mod context;
pub mod health_handlers;
pub mod image_handlers;
pub mod profile_handlers;

#[cfg(test)]
pub mod test_support;
