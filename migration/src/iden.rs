use sea_orm_migration::prelude::*;

// Define table names
#[derive(DeriveIden)]
pub enum Volunteers {
    Table,
    Id,
    Name,
    Email,
    Phone,
    DateAdded,
}

#[derive(DeriveIden)]
pub enum Teachers {
    Table,
    Id,
    Name,
    Email,
}

#[derive(DeriveIden)]
pub enum Recipes {
    Table,
    Id,
    Name,
    Ingredients,
    Instructions,
    CreatorId,
    ImageUrl,
}

#[derive(DeriveIden)]
pub enum Meals {
    Table,
    Id,
    Date,
    VolunteerId,
    RecipeId,
    TeacherId,
}

#[derive(DeriveIden)]
pub enum GiftCards {
    Table,
    Id,
    Name,
    Date,
    VolunteerId,
    TeacherId,
}

#[derive(DeriveIden)]
pub enum Deadlines {
    Table,
    Id,
    MonthYear,
    VolunteerStart,
    VolunteerEnd,
    DropoffStart,
    DropoffEnd,
    TeacherStart,
    TeacherEnd,
}

#[derive(DeriveIden)]
pub enum VolunteerCodes {
    Table,
    Id,
    Code,
}

#[derive(DeriveIden)]
pub enum TeacherCodes {
    Table,
    Id,
    Code,
}

#[derive(DeriveIden)]
pub enum Passwords {
    Table,
    Id,
    Username,
    Hash,
}
