use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::contact::{ContactDraft, EmergencyContact},
    models::location::ValidationError,
    models::vehicle::{Vehicle, VehicleDraft},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(profile))
        .route("/contacts/new", get(contact_new_form).post(contact_new_submit))
        .route(
            "/contacts/:contact_id/edit",
            get(contact_edit_form).post(contact_edit_submit),
        )
        .route("/contacts/:contact_id/delete", post(contact_delete))
        .route("/vehicles/new", get(vehicle_new_form).post(vehicle_new_submit))
        .route(
            "/vehicles/:vehicle_id/edit",
            get(vehicle_edit_form).post(vehicle_edit_submit),
        )
        .route("/vehicles/:vehicle_id/delete", post(vehicle_delete))
}

#[derive(Clone)]
struct ContactRow {
    id: i64,
    full_name: String,
    relationship: String,
    primary_phone: String,
}

#[derive(Clone)]
struct VehicleRow {
    id: i64,
    description: String,
    plate: String,
}

#[derive(Template)]
#[template(path = "account/profile.html")]
struct ProfileTemplate {
    username: String,
    email: String,
    contacts: Vec<ContactRow>,
    vehicles: Vec<VehicleRow>,
}

async fn profile(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let contacts = state.accounts.contacts_for(user.id).await?;
    let vehicles = state.accounts.vehicles_for(user.id).await?;
    Ok(AskamaTemplateResponse::into_response(ProfileTemplate {
        username: user.username.clone(),
        email: user.email.clone(),
        contacts: contacts
            .iter()
            .map(|contact| ContactRow {
                id: contact.id,
                full_name: contact.full_name.clone(),
                relationship: contact.relationship.clone(),
                primary_phone: contact.primary_phone.clone(),
            })
            .collect(),
        vehicles: vehicles
            .iter()
            .map(|vehicle| VehicleRow {
                id: vehicle.id,
                description: vehicle.describe(),
                plate: format!("{} {}", vehicle.lic_plate_st, vehicle.lic_plate_num),
            })
            .collect(),
    }))
}

// ---- emergency contacts ----

#[derive(Template)]
#[template(path = "account/contact_form.html")]
struct ContactFormTemplate {
    page_title: String,
    show_error: bool,
    error_message: String,
    full_name: String,
    preferred_name: String,
    relationship: String,
    email: String,
    primary_phone: String,
    secondary_phone: String,
    street_address_line1: String,
    street_address_line2: String,
    city: String,
    state: String,
    zip_code: String,
}

#[derive(Deserialize)]
struct ContactForm {
    full_name: String,
    preferred_name: Option<String>,
    relationship: Option<String>,
    email: Option<String>,
    primary_phone: String,
    secondary_phone: Option<String>,
    street_address_line1: Option<String>,
    street_address_line2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
}

impl ContactForm {
    fn draft(&self) -> ContactDraft {
        ContactDraft {
            full_name: self.full_name.trim().to_owned(),
            preferred_name: optional(&self.preferred_name),
            relationship: optional(&self.relationship),
            email: optional(&self.email),
            primary_phone: self.primary_phone.trim().to_owned(),
            secondary_phone: optional(&self.secondary_phone),
            street_address_line1: optional(&self.street_address_line1),
            street_address_line2: optional(&self.street_address_line2),
            city: optional(&self.city),
            state: optional(&self.state),
            zip_code: optional(&self.zip_code),
        }
    }
}

fn optional(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_owned()
}

fn contact_form_template(
    page_title: String,
    draft: &ContactDraft,
    error: Option<ValidationError>,
) -> ContactFormTemplate {
    ContactFormTemplate {
        page_title,
        show_error: error.is_some(),
        error_message: error.map(|e| e.message).unwrap_or_default(),
        full_name: draft.full_name.clone(),
        preferred_name: draft.preferred_name.clone(),
        relationship: draft.relationship.clone(),
        email: draft.email.clone(),
        primary_phone: draft.primary_phone.clone(),
        secondary_phone: draft.secondary_phone.clone(),
        street_address_line1: draft.street_address_line1.clone(),
        street_address_line2: draft.street_address_line2.clone(),
        city: draft.city.clone(),
        state: draft.state.clone(),
        zip_code: draft.zip_code.clone(),
    }
}

fn draft_from_contact(contact: &EmergencyContact) -> ContactDraft {
    ContactDraft {
        full_name: contact.full_name.clone(),
        preferred_name: contact.preferred_name.clone(),
        relationship: contact.relationship.clone(),
        email: contact.email.clone(),
        primary_phone: contact.primary_phone.clone(),
        secondary_phone: contact.secondary_phone.clone(),
        street_address_line1: contact.street_address_line1.clone(),
        street_address_line2: contact.street_address_line2.clone(),
        city: contact.city.clone(),
        state: contact.state.clone(),
        zip_code: contact.zip_code.clone(),
    }
}

async fn contact_new_form(current: CurrentUser) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    Ok(AskamaTemplateResponse::into_response(contact_form_template(
        "Add an emergency contact".into(),
        &ContactDraft::default(),
        None,
    )))
}

async fn contact_new_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let draft = form.draft();
    if let Err(error) = draft.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            AskamaTemplateResponse::into_response(contact_form_template(
                "Add an emergency contact".into(),
                &draft,
                Some(error),
            )),
        )
            .into_response());
    }
    state.accounts.insert_contact(user.id, &draft).await?;
    Ok(Redirect::to("/profile").into_response())
}

async fn contact_edit_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(contact_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let contact = state.accounts.contact(user.id, contact_id).await?;
    Ok(AskamaTemplateResponse::into_response(contact_form_template(
        format!("Edit contact {}", contact.full_name),
        &draft_from_contact(&contact),
        None,
    )))
}

async fn contact_edit_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(contact_id): Path<i64>,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let draft = form.draft();
    if let Err(error) = draft.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            AskamaTemplateResponse::into_response(contact_form_template(
                "Edit contact".into(),
                &draft,
                Some(error),
            )),
        )
            .into_response());
    }
    state
        .accounts
        .update_contact(user.id, contact_id, &draft)
        .await?;
    Ok(Redirect::to("/profile").into_response())
}

async fn contact_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(contact_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    state.accounts.delete_contact(user.id, contact_id).await?;
    Ok(Redirect::to("/profile"))
}

// ---- vehicles ----

#[derive(Template)]
#[template(path = "account/vehicle_form.html")]
struct VehicleFormTemplate {
    page_title: String,
    show_error: bool,
    error_message: String,
    make: String,
    model: String,
    year: String,
    color: String,
    lic_plate_num: String,
    lic_plate_st: String,
}

#[derive(Deserialize)]
struct VehicleForm {
    make: String,
    model: String,
    year: Option<String>,
    color: Option<String>,
    lic_plate_num: Option<String>,
    lic_plate_st: Option<String>,
}

impl VehicleForm {
    fn draft(&self) -> VehicleDraft {
        VehicleDraft {
            make: self.make.trim().to_owned(),
            model: self.model.trim().to_owned(),
            year: optional(&self.year),
            color: optional(&self.color),
            lic_plate_num: optional(&self.lic_plate_num),
            lic_plate_st: optional(&self.lic_plate_st),
        }
    }
}

fn vehicle_form_template(
    page_title: String,
    draft: &VehicleDraft,
    error: Option<ValidationError>,
) -> VehicleFormTemplate {
    VehicleFormTemplate {
        page_title,
        show_error: error.is_some(),
        error_message: error.map(|e| e.message).unwrap_or_default(),
        make: draft.make.clone(),
        model: draft.model.clone(),
        year: draft.year.clone(),
        color: draft.color.clone(),
        lic_plate_num: draft.lic_plate_num.clone(),
        lic_plate_st: draft.lic_plate_st.clone(),
    }
}

fn draft_from_vehicle(vehicle: &Vehicle) -> VehicleDraft {
    VehicleDraft {
        make: vehicle.make.clone(),
        model: vehicle.model.clone(),
        year: vehicle.year.clone(),
        color: vehicle.color.clone(),
        lic_plate_num: vehicle.lic_plate_num.clone(),
        lic_plate_st: vehicle.lic_plate_st.clone(),
    }
}

async fn vehicle_new_form(current: CurrentUser) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    Ok(AskamaTemplateResponse::into_response(vehicle_form_template(
        "Add a vehicle".into(),
        &VehicleDraft::default(),
        None,
    )))
}

async fn vehicle_new_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<VehicleForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let draft = form.draft();
    if let Err(error) = draft.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            AskamaTemplateResponse::into_response(vehicle_form_template(
                "Add a vehicle".into(),
                &draft,
                Some(error),
            )),
        )
            .into_response());
    }
    state.accounts.insert_vehicle(user.id, &draft).await?;
    Ok(Redirect::to("/profile").into_response())
}

async fn vehicle_edit_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(vehicle_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let vehicle = state.accounts.vehicle(user.id, vehicle_id).await?;
    Ok(AskamaTemplateResponse::into_response(vehicle_form_template(
        format!("Edit {}", vehicle.describe()),
        &draft_from_vehicle(&vehicle),
        None,
    )))
}

async fn vehicle_edit_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(vehicle_id): Path<i64>,
    Form(form): Form<VehicleForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let draft = form.draft();
    if let Err(error) = draft.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            AskamaTemplateResponse::into_response(vehicle_form_template(
                "Edit vehicle".into(),
                &draft,
                Some(error),
            )),
        )
            .into_response());
    }
    state
        .accounts
        .update_vehicle(user.id, vehicle_id, &draft)
        .await?;
    Ok(Redirect::to("/profile").into_response())
}

async fn vehicle_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(vehicle_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    state.accounts.delete_vehicle(user.id, vehicle_id).await?;
    Ok(Redirect::to("/profile"))
}
