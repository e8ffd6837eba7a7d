pub use super::deadline::Entity as Deadline;
pub use super::gift_card::Entity as GiftCard;
pub use super::meal::Entity as Meal;
pub use super::password::Entity as Password;
pub use super::recipe::Entity as Recipe;
pub use super::teacher::Entity as Teacher;
pub use super::teacher_code::Entity as TeacherCode;
pub use super::volunteer::Entity as Volunteer;
pub use super::volunteer_code::Entity as VolunteerCode;
