pub mod cars;
pub mod friendships;
pub mod invites;
pub mod trips;
pub mod users;
