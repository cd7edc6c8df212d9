use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::gear::{validate_item, ItemView},
    models::location::{LocationKind, NewLocation, TripLocation, ValidationError},
    models::member::{validate_guest_name, MemberView, TripGuest},
    models::schedule::{DateGroup, UNASSIGNED},
    models::trip::{Trip, TripDraft},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trip_list))
        .route("/new", get(trip_create_form).post(trip_create_submit))
        .route("/:trip_id", get(trip_detail))
        .route("/:trip_id/edit", get(trip_edit_form).post(trip_edit_submit))
        .route("/:trip_id/delete", post(trip_delete))
        .route(
            "/:trip_id/locations/:kind/new",
            get(location_create_form).post(location_create_submit),
        )
        .route(
            "/:trip_id/locations/:kind/:location_id/edit",
            get(location_edit_form).post(location_edit_submit),
        )
        .route(
            "/:trip_id/locations/:kind/:location_id/delete",
            post(location_delete),
        )
        .route("/:trip_id/members", get(members_page).post(member_add))
        .route("/:trip_id/members/:member_id/update", post(member_update))
        .route("/:trip_id/members/:member_id/delete", post(member_delete))
        .route("/:trip_id/guests", post(guest_add))
        .route("/:trip_id/guests/:guest_id/delete", post(guest_delete))
        .route("/:trip_id/gear", get(gear_page).post(item_add))
        .route("/:trip_id/gear/:item_id/claim", post(item_claim))
        .route("/:trip_id/gear/:item_id/delete", post(item_delete))
        .route("/:trip_id/emergency_info", get(emergency_info))
        .route("/ajax/user_exists", get(user_exists))
}

// ---- shared view rows ----

#[derive(Clone)]
struct TripRow {
    id: i64,
    title: String,
    start_date: String,
    nights: u32,
}

impl TripRow {
    fn from_trip(trip: &Trip) -> Self {
        Self {
            id: trip.id,
            title: trip.title.clone(),
            start_date: trip.start_date.to_string(),
            nights: trip.number_nights,
        }
    }
}

#[derive(Clone, Default)]
struct LocationRow {
    id: i64,
    kind_slug: &'static str,
    title: String,
    label: String,
    coords: String,
}

impl LocationRow {
    fn from_location(location: &TripLocation) -> Self {
        let coords = match (location.latitude, location.longitude) {
            (Some(lat), Some(lon)) => format!("{lat}, {lon}"),
            _ => String::new(),
        };
        Self {
            id: location.id,
            kind_slug: location.kind.slug(),
            title: location.title.clone(),
            label: location.date.to_string(),
            coords,
        }
    }
}

#[derive(Clone)]
struct GroupRow {
    label: String,
    locations: Vec<LocationRow>,
}

fn group_rows(groups: Vec<DateGroup>) -> Vec<GroupRow> {
    groups
        .into_iter()
        .map(|group| GroupRow {
            label: group.label.to_string(),
            locations: group.locations.iter().map(LocationRow::from_location).collect(),
        })
        .collect()
}

// ---- trips ----

#[derive(Template)]
#[template(path = "trips/index.html")]
struct TripsListTemplate {
    upcoming: Vec<TripRow>,
    past: Vec<TripRow>,
}

async fn trip_list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let trips = state.trips.list_trips(user.id).await?;
    let (past, upcoming): (Vec<_>, Vec<_>) = trips.iter().partition(|trip| trip.is_in_the_past());
    Ok(AskamaTemplateResponse::into_response(TripsListTemplate {
        upcoming: upcoming.iter().map(|t| TripRow::from_trip(t)).collect(),
        past: past.iter().map(|t| TripRow::from_trip(t)).collect(),
    }))
}

#[derive(Template)]
#[template(path = "trips/trip_form.html")]
struct TripFormTemplate {
    page_title: String,
    submit_button_title: String,
    cancel_path: String,
    show_error: bool,
    error_message: String,
    title_value: String,
    start_date_value: String,
    number_nights_value: u32,
}

#[derive(Deserialize)]
struct TripForm {
    title: String,
    start_date: String,
    number_nights: u32,
}

async fn trip_create_form(current: CurrentUser) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    Ok(AskamaTemplateResponse::into_response(TripFormTemplate {
        page_title: "Start planning a new trip".into(),
        submit_button_title: "Save Trip".into(),
        cancel_path: "/trips".into(),
        show_error: false,
        error_message: String::new(),
        title_value: String::new(),
        start_date_value: String::new(),
        number_nights_value: 0,
    }))
}

fn parse_trip_form(form: &TripForm) -> Result<TripDraft, ValidationError> {
    let start_date = NaiveDate::parse_from_str(form.start_date.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new("start_date", "Enter a valid start date"))?;
    let draft = TripDraft {
        title: form.title.trim().to_owned(),
        start_date,
        number_nights: form.number_nights,
    };
    draft.validate()?;
    Ok(draft)
}

fn render_trip_form_error(
    form: &TripForm,
    error: ValidationError,
    page_title: &str,
    submit_button_title: &str,
    cancel_path: String,
) -> Response {
    (
        StatusCode::BAD_REQUEST,
        AskamaTemplateResponse::into_response(TripFormTemplate {
            page_title: page_title.into(),
            submit_button_title: submit_button_title.into(),
            cancel_path,
            show_error: true,
            error_message: error.message,
            title_value: form.title.clone(),
            start_date_value: form.start_date.clone(),
            number_nights_value: form.number_nights,
        }),
    )
        .into_response()
}

async fn trip_create_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let draft = match parse_trip_form(&form) {
        Ok(draft) => draft,
        Err(error) => {
            return Ok(render_trip_form_error(
                &form,
                error,
                "Start planning a new trip",
                "Save Trip",
                "/trips".into(),
            ))
        }
    };
    let trip = state.trips.create_trip(user.id, &draft).await?;
    Ok(Redirect::to(&format!("/trips/{}", trip.id)).into_response())
}

#[derive(Template)]
#[template(path = "trips/detail.html")]
struct TripDetailTemplate {
    trip_id: i64,
    title: String,
    start_date: String,
    nights: u32,
    is_past: bool,
    is_organizer: bool,
    has_trailhead: bool,
    trailhead: LocationRow,
    has_endpoint: bool,
    endpoint: LocationRow,
    objective_groups: Vec<GroupRow>,
    camp_groups: Vec<GroupRow>,
    unassigned_objectives: Vec<LocationRow>,
    unassigned_camps: Vec<LocationRow>,
    member_count: usize,
    guest_count: usize,
}

async fn trip_detail(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    let locations = state.trips.locations(trip_id).await?;
    let members = state.trips.members(trip_id).await?;
    let guests = state.trips.guests(trip_id).await?;

    let trailhead = trip.trailhead(&locations).map(LocationRow::from_location);
    let endpoint = trip.endpoint(&locations).map(LocationRow::from_location);

    Ok(AskamaTemplateResponse::into_response(TripDetailTemplate {
        trip_id: trip.id,
        title: trip.title.clone(),
        start_date: trip.start_date.to_string(),
        nights: trip.number_nights,
        is_past: trip.is_in_the_past(),
        is_organizer: state.trips.is_organizer(trip_id, user.id).await?,
        has_trailhead: trailhead.is_some(),
        trailhead: trailhead.unwrap_or_default(),
        has_endpoint: endpoint.is_some(),
        endpoint: endpoint.unwrap_or_default(),
        objective_groups: group_rows(trip.location_context(LocationKind::Objective, &locations)),
        camp_groups: group_rows(trip.location_context(LocationKind::Camp, &locations)),
        unassigned_objectives: trip
            .unassigned_locations(LocationKind::Objective, &locations)
            .iter()
            .map(LocationRow::from_location)
            .collect(),
        unassigned_camps: trip
            .unassigned_locations(LocationKind::Camp, &locations)
            .iter()
            .map(LocationRow::from_location)
            .collect(),
        member_count: members.len(),
        guest_count: guests.len(),
    }))
}

async fn trip_edit_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    Ok(AskamaTemplateResponse::into_response(TripFormTemplate {
        page_title: format!("Edit {}", trip.title),
        submit_button_title: "Save Trip".into(),
        cancel_path: format!("/trips/{trip_id}"),
        show_error: false,
        error_message: String::new(),
        title_value: trip.title.clone(),
        start_date_value: trip.start_date.to_string(),
        number_nights_value: trip.number_nights,
    }))
}

async fn trip_edit_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    let draft = match parse_trip_form(&form) {
        Ok(draft) => draft,
        Err(error) => {
            return Ok(render_trip_form_error(
                &form,
                error,
                "Edit trip",
                "Save Trip",
                format!("/trips/{trip_id}"),
            ))
        }
    };
    state.trips.update_trip(trip_id, &draft).await?;
    Ok(Redirect::to(&format!("/trips/{trip_id}")).into_response())
}

async fn trip_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    state.trips.delete_trip(trip_id).await?;
    Ok(Redirect::to("/trips"))
}

// ---- locations ----

#[derive(Clone)]
struct ChoiceRow {
    value: String,
    selected: bool,
}

#[derive(Template)]
#[template(path = "trips/location_form.html")]
struct LocationFormTemplate {
    page_title: String,
    submit_button_title: String,
    cancel_path: String,
    trip_id: i64,
    show_error: bool,
    error_message: String,
    title_value: String,
    latitude_value: String,
    longitude_value: String,
    choices: Vec<ChoiceRow>,
}

#[derive(Deserialize)]
struct LocationForm {
    title: Option<String>,
    date: String,
    latitude: Option<String>,
    longitude: Option<String>,
}

/// The date select always re-derives its options from the live trip, so a
/// form rendered before the trip was edited still validates against the
/// current span on submit.
fn choice_rows(trip: &Trip, kind: LocationKind, selected: &str) -> Vec<ChoiceRow> {
    let mut rows = vec![ChoiceRow {
        value: UNASSIGNED.to_owned(),
        selected: selected.is_empty() || selected == UNASSIGNED,
    }];
    for label in trip.date_choices(kind.date_mode()) {
        let value = label.to_string();
        rows.push(ChoiceRow {
            selected: value == selected,
            value,
        });
    }
    rows
}

fn parse_kind(slug: &str) -> Result<LocationKind, AppError> {
    LocationKind::from_slug(slug)
        .ok_or_else(|| AppError::BadRequest(format!("`{slug}` is not a location type")))
}

fn parse_coordinate(
    raw: Option<&String>,
    field: &'static str,
) -> Result<Option<f64>, ValidationError> {
    let Some(raw) = raw else { return Ok(None) };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ValidationError::new(field, format!("Enter {field} as a decimal number")))
}

/// User input that does not even parse as a label is a validation failure
/// (a tampered select), unlike a stored label failing to parse, which is a
/// defect and propagates as 500.
fn parse_location_form(
    form: &LocationForm,
    trip: &Trip,
    kind: LocationKind,
) -> Result<NewLocation, ValidationError> {
    let date = form
        .date
        .parse()
        .map_err(|_| ValidationError::new("date", "Select one of the offered dates"))?;
    let location = NewLocation {
        trip_id: trip.id,
        kind,
        title: form
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_owned(),
        date,
        latitude: parse_coordinate(form.latitude.as_ref(), "latitude")?,
        longitude: parse_coordinate(form.longitude.as_ref(), "longitude")?,
    };
    location.validate(trip)?;
    Ok(location)
}

fn render_location_form(
    trip: &Trip,
    kind: LocationKind,
    page_title: &str,
    title_value: String,
    selected_date: &str,
    latitude_value: String,
    longitude_value: String,
    error: Option<ValidationError>,
) -> Response {
    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (
        status,
        AskamaTemplateResponse::into_response(LocationFormTemplate {
            page_title: page_title.to_owned(),
            submit_button_title: kind.submit_title().to_owned(),
            cancel_path: format!("/trips/{}", trip.id),
            trip_id: trip.id,
            show_error: error.is_some(),
            error_message: error.map(|e| e.message).unwrap_or_default(),
            title_value,
            latitude_value,
            longitude_value,
            choices: choice_rows(trip, kind, selected_date),
        }),
    )
        .into_response()
}

async fn location_create_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, kind_slug)): Path<(i64, String)>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let kind = parse_kind(&kind_slug)?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    Ok(render_location_form(
        &trip,
        kind,
        kind.page_title_new(),
        String::new(),
        UNASSIGNED,
        String::new(),
        String::new(),
        None,
    ))
}

async fn location_create_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, kind_slug)): Path<(i64, String)>,
    Form(form): Form<LocationForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let kind = parse_kind(&kind_slug)?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    match parse_location_form(&form, &trip, kind) {
        Ok(location) => {
            state.trips.insert_location(&location).await?;
            Ok(Redirect::to(&format!("/trips/{trip_id}")).into_response())
        }
        Err(error) => Ok(render_location_form(
            &trip,
            kind,
            kind.page_title_new(),
            form.title.clone().unwrap_or_default(),
            &form.date,
            form.latitude.clone().unwrap_or_default(),
            form.longitude.clone().unwrap_or_default(),
            Some(error),
        )),
    }
}

async fn location_edit_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, kind_slug, location_id)): Path<(i64, String, i64)>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let kind = parse_kind(&kind_slug)?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    let location = state.trips.location(trip_id, location_id).await?;
    if location.kind != kind {
        return Err(AppError::NotFound);
    }
    Ok(render_location_form(
        &trip,
        kind,
        kind.page_title_edit(),
        location.title.clone(),
        &location.date.to_string(),
        location.latitude.map(|v| v.to_string()).unwrap_or_default(),
        location.longitude.map(|v| v.to_string()).unwrap_or_default(),
        None,
    ))
}

async fn location_edit_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, kind_slug, location_id)): Path<(i64, String, i64)>,
    Form(form): Form<LocationForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let kind = parse_kind(&kind_slug)?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    let existing = state.trips.location(trip_id, location_id).await?;
    if existing.kind != kind {
        return Err(AppError::NotFound);
    }
    match parse_location_form(&form, &trip, kind) {
        Ok(parsed) => {
            let updated = TripLocation {
                id: existing.id,
                trip_id: existing.trip_id,
                kind: existing.kind,
                title: parsed.title,
                date: parsed.date,
                latitude: parsed.latitude,
                longitude: parsed.longitude,
            };
            state.trips.update_location(&updated).await?;
            Ok(Redirect::to(&format!("/trips/{trip_id}")).into_response())
        }
        Err(error) => Ok(render_location_form(
            &trip,
            kind,
            kind.page_title_edit(),
            form.title.clone().unwrap_or_default(),
            &form.date,
            form.latitude.clone().unwrap_or_default(),
            form.longitude.clone().unwrap_or_default(),
            Some(error),
        )),
    }
}

async fn location_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, kind_slug, location_id)): Path<(i64, String, i64)>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    parse_kind(&kind_slug)?;
    state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    state.trips.delete_location(trip_id, location_id).await?;
    Ok(Redirect::to(&format!("/trips/{trip_id}")))
}

// ---- members & guests ----

#[derive(Clone)]
struct MemberRow {
    id: i64,
    username: String,
    email: String,
    organizer: bool,
    pending: bool,
}

impl MemberRow {
    fn from_view(view: &MemberView) -> Self {
        Self {
            id: view.member.id,
            username: view.username.clone(),
            email: view.email.clone(),
            organizer: view.member.organizer,
            pending: view.member.accept_reqd,
        }
    }
}

#[derive(Clone)]
struct GuestRow {
    id: i64,
    name: String,
}

impl GuestRow {
    fn from_guest(guest: &TripGuest) -> Self {
        Self {
            id: guest.id,
            name: guest.name.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "trips/members.html")]
struct MembersTemplate {
    trip_id: i64,
    trip_title: String,
    is_organizer: bool,
    members: Vec<MemberRow>,
    guests: Vec<GuestRow>,
    show_error: bool,
    error_message: String,
}

async fn render_members_page(
    state: &AppState,
    trip: &Trip,
    user_id: i64,
    error: Option<String>,
) -> Result<Response, AppError> {
    let members = state.trips.members(trip.id).await?;
    let guests = state.trips.guests(trip.id).await?;
    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        AskamaTemplateResponse::into_response(MembersTemplate {
            trip_id: trip.id,
            trip_title: trip.title.clone(),
            is_organizer: state.trips.is_organizer(trip.id, user_id).await?,
            members: members.iter().map(MemberRow::from_view).collect(),
            guests: guests.iter().map(GuestRow::from_guest).collect(),
            show_error: error.is_some(),
            error_message: error.unwrap_or_default(),
        }),
    )
        .into_response())
}

async fn members_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    render_members_page(&state, &trip, user.id, None).await
}

#[derive(Deserialize)]
struct MemberAddForm {
    email: String,
}

async fn member_add(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Form(form): Form<MemberAddForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    let Some((invitee_id, _)) = state.trips.user_by_email(&form.email).await? else {
        return render_members_page(
            &state,
            &trip,
            user.id,
            Some(format!("No account is registered for {}", form.email.trim())),
        )
        .await;
    };
    match state.trips.add_member(trip_id, invitee_id).await {
        Ok(()) => Ok(Redirect::to(&format!("/trips/{trip_id}/members")).into_response()),
        Err(AppError::BadRequest(msg)) => {
            render_members_page(&state, &trip, user.id, Some(msg)).await
        }
        Err(err) => Err(err),
    }
}

#[derive(Deserialize)]
struct MemberUpdateForm {
    organizer: Option<String>,
}

async fn member_update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, member_id)): Path<(i64, i64)>,
    Form(form): Form<MemberUpdateForm>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    state
        .trips
        .set_member_organizer(trip_id, member_id, form.organizer.is_some())
        .await?;
    Ok(Redirect::to(&format!("/trips/{trip_id}/members")))
}

async fn member_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, member_id)): Path<(i64, i64)>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    state.trips.remove_member(trip_id, member_id).await?;
    Ok(Redirect::to(&format!("/trips/{trip_id}/members")))
}

#[derive(Deserialize)]
struct GuestAddForm {
    name: String,
}

async fn guest_add(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Form(form): Form<GuestAddForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    if let Err(error) = validate_guest_name(&form.name) {
        return render_members_page(&state, &trip, user.id, Some(error.message)).await;
    }
    state.trips.add_guest(trip_id, &form.name).await?;
    Ok(Redirect::to(&format!("/trips/{trip_id}/members")).into_response())
}

async fn guest_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, guest_id)): Path<(i64, i64)>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    state.trips.remove_guest(trip_id, guest_id).await?;
    Ok(Redirect::to(&format!("/trips/{trip_id}/members")))
}

#[derive(Deserialize)]
struct UserExistsQuery {
    email: String,
}

/// JSON probe used by the members page to check an email before inviting.
async fn user_exists(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<UserExistsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    current.require_user()?;
    let found = state.trips.user_by_email(&query.email).await?;
    Ok(Json(match found {
        Some((_, username)) => serde_json::json!({ "exists": true, "username": username }),
        None => serde_json::json!({ "exists": false }),
    }))
}

// ---- gear ----

#[derive(Clone)]
struct ItemRow {
    id: i64,
    description: String,
    quantity: u32,
    owners: String,
    unclaimed: bool,
}

impl ItemRow {
    fn from_view(view: &ItemView) -> Self {
        Self {
            id: view.item.id,
            description: view.item.description.clone(),
            quantity: view.item.quantity,
            owners: view.owners.join(", "),
            unclaimed: view.owners.is_empty(),
        }
    }
}

#[derive(Template)]
#[template(path = "trips/gear.html")]
struct GearTemplate {
    trip_id: i64,
    trip_title: String,
    is_organizer: bool,
    items: Vec<ItemRow>,
    show_error: bool,
    error_message: String,
}

async fn render_gear_page(
    state: &AppState,
    trip: &Trip,
    user_id: i64,
    error: Option<String>,
) -> Result<Response, AppError> {
    let items = state.trips.items(trip.id).await?;
    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        AskamaTemplateResponse::into_response(GearTemplate {
            trip_id: trip.id,
            trip_title: trip.title.clone(),
            is_organizer: state.trips.is_organizer(trip.id, user_id).await?,
            items: items.iter().map(ItemRow::from_view).collect(),
            show_error: error.is_some(),
            error_message: error.unwrap_or_default(),
        }),
    )
        .into_response())
}

async fn gear_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    render_gear_page(&state, &trip, user.id, None).await
}

#[derive(Deserialize)]
struct ItemForm {
    description: String,
    quantity: u32,
}

async fn item_add(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Form(form): Form<ItemForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    if let Err(error) = validate_item(&form.description, form.quantity) {
        return render_gear_page(&state, &trip, user.id, Some(error.message)).await;
    }
    state
        .trips
        .add_item(trip_id, &form.description, form.quantity)
        .await?;
    Ok(Redirect::to(&format!("/trips/{trip_id}/gear")).into_response())
}

async fn item_claim(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, item_id)): Path<(i64, i64)>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    state.trips.trip_for_member(trip_id, user.id).await?;
    state.trips.claim_item(trip_id, item_id, user.id).await?;
    Ok(Redirect::to(&format!("/trips/{trip_id}/gear")))
}

async fn item_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, item_id)): Path<(i64, i64)>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    state.trips.trip_for_member(trip_id, user.id).await?;
    require_organizer(&state, trip_id, user.id).await?;
    state.trips.remove_item(trip_id, item_id).await?;
    Ok(Redirect::to(&format!("/trips/{trip_id}/gear")))
}

// ---- emergency info ----

#[derive(Clone)]
struct ContactRow {
    name: String,
    relationship: String,
    phone: String,
}

#[derive(Clone)]
struct EmergencyEntry {
    username: String,
    contacts: Vec<ContactRow>,
    vehicles: Vec<String>,
}

#[derive(Template)]
#[template(path = "trips/emergency_info.html")]
struct EmergencyInfoTemplate {
    trip_id: i64,
    trip_title: String,
    entries: Vec<EmergencyEntry>,
}

/// Everything a rescue coordinator would want in one place: who is on the
/// trip, who to call for each of them, and which cars are at the trailhead.
async fn emergency_info(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let trip = state.trips.trip_for_member(trip_id, user.id).await?;
    let members = state.trips.members(trip_id).await?;

    let mut entries = Vec::with_capacity(members.len());
    for member in &members {
        let contacts = state.accounts.contacts_for(member.member.user_id).await?;
        let vehicles = state.accounts.vehicles_for(member.member.user_id).await?;
        entries.push(EmergencyEntry {
            username: member.username.clone(),
            contacts: contacts
                .iter()
                .map(|contact| ContactRow {
                    name: contact.full_name.clone(),
                    relationship: contact.relationship.clone(),
                    phone: contact.primary_phone.clone(),
                })
                .collect(),
            vehicles: vehicles.iter().map(|vehicle| vehicle.describe()).collect(),
        });
    }

    Ok(AskamaTemplateResponse::into_response(EmergencyInfoTemplate {
        trip_id: trip.id,
        trip_title: trip.title,
        entries,
    }))
}

async fn require_organizer(state: &AppState, trip_id: i64, user_id: i64) -> Result<(), AppError> {
    if state.trips.is_organizer(trip_id, user_id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
