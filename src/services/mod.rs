pub mod dispatcher;
pub mod store;
pub mod token_cleanup;
