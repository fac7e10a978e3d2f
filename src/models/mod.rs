pub mod credential;
pub mod owner;
pub mod password_reset_token;
pub mod venue;

pub use credential::Credential;
pub use owner::{NewOwner, Owner, OwnerChanges, OwnerStatus};
pub use password_reset_token::PasswordResetToken;
pub use venue::{Address, NewVenue, Venue, VenueFilter, VenueStatus};
