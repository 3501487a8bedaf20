pub mod routes;
pub mod status;
pub mod validate;
