pub mod prelude;

pub mod deadline;
pub mod gift_card;
pub mod meal;
pub mod password;
pub mod recipe;
pub mod teacher;
pub mod teacher_code;
pub mod volunteer;
pub mod volunteer_code;
