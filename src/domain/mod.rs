// Domain layer - Dashboard values and the pure logic that derives them
pub mod bus;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod weather;
