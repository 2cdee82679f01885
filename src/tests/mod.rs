pub mod router_tests;
pub mod store_tests;
pub mod utils;
