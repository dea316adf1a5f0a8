pub mod cars;
pub mod friendships;
pub mod invitations;
pub mod trips;
pub mod users;
