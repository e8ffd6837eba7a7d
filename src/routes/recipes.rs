use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Multipart;
use minijinja::context;
use tracing::warn;

use super::bounce;
use crate::error::AppError;
use crate::router::AppState;
use crate::workflow::roster::{self, RecipeFields};

/// Largest accepted recipe form, image included.
pub const UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Bytes,
}

/// A recipe form posted as `multipart/form-data`.
#[derive(Default)]
pub struct RecipeSubmission {
    text: HashMap<String, String>,
    pub image: Option<UploadedImage>,
}

impl RecipeSubmission {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submission = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers post an empty part when no file was chosen
                if !file_name.is_empty() && !bytes.is_empty() {
                    submission.image = Some(UploadedImage { file_name, bytes });
                }
            } else {
                let value = field.text().await?;
                submission.text.insert(name, value);
            }
        }
        Ok(submission)
    }

    pub fn field(&self, name: &str) -> String {
        self.text.get(name).cloned().unwrap_or_default()
    }

    pub fn recipe_fields(&self) -> RecipeFields {
        RecipeFields {
            name: self.field("recipe_name"),
            ingredients: self.field("ingredients"),
            instructions: self.field("instructions"),
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Response, AppError> {
    let recipes = roster::list_recipes(&state.db).await?;
    Ok(state
        .render("recipes.html", context! { recipes => recipes })?
        .into_response())
}

pub async fn view(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let recipe = match roster::get_recipe(&state.db, id).await {
        Ok(recipe) => recipe,
        Err(e) => return bounce(e, "/recipes"),
    };
    Ok(state
        .render("recipe.html", context! { recipe => recipe })?
        .into_response())
}

pub async fn upload_page(State(state): State<AppState>) -> Result<Response, AppError> {
    let volunteers = roster::list_volunteers(&state.db).await?;
    Ok(state
        .render("recipe_upload.html", context! { volunteers => volunteers })?
        .into_response())
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = RecipeSubmission::read(multipart).await?;

    let image_url = match &submission.image {
        Some(image) => Some(state.images.save(&image.file_name, &image.bytes).await?),
        None => None,
    };
    let created = roster::create_recipe(
        &state.db,
        submission.recipe_fields(),
        submission.field("creator_name").trim(),
        image_url.clone(),
    )
    .await;

    match created {
        Ok(recipe) => Ok(Redirect::to(&format!("/recipes/{}", recipe.id)).into_response()),
        Err(e) => {
            if let Some(reference) = image_url {
                if let Err(io) = state.images.remove(&reference).await {
                    warn!(%reference, "Failed to clean up image: {io}");
                }
            }
            bounce(e, "/recipes/upload")
        }
    }
}
