pub mod election;
pub mod identity;
