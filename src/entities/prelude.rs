pub use super::files::Entity as Files;
pub use super::questions::Entity as Questions;
pub use super::users::Entity as Users;
