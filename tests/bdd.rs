use std::{fmt, net::SocketAddr};

use anyhow::Context;
use chrono::NaiveDate;
use cucumber::{given, then, when, World as _};
use tempfile::TempDir;
use tripplan::{
    auth::{self, AuthenticatedUser},
    config::AppConfig,
    db::init_pool,
    models::location::{LocationKind, NewLocation},
    models::schedule::DateMode,
    models::trip::{Trip, TripDraft},
    state::AppState,
};

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    registered_user: Option<AuthenticatedUser>,
    trip: Option<Trip>,
    last_rejection: Option<String>,
}

impl AppWorld {
    fn app_state(&self) -> &AppState {
        self.state
            .as_ref()
            .expect("state must be initialised first")
            .app()
    }

    fn current_user(&self) -> &AuthenticatedUser {
        self.registered_user
            .as_ref()
            .expect("a user must be registered first")
    }

    fn current_trip(&self) -> &Trip {
        self.trip.as_ref().expect("a trip must be created first")
    }

    async fn reload_trip(&mut self) {
        let trip_id = self.current_trip().id;
        let user_id = self.current_user().id;
        let trip = self
            .app_state()
            .trips
            .trip_for_member(trip_id, user_id)
            .await
            .expect("reload trip");
        self.trip = Some(trip);
    }
}

struct TestState {
    app: AppState,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url: database_url.clone(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cookie_secret: "bdd-cookie-secret".into(),
        };

        let db = init_pool(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let app = AppState::new(config, db);
        Ok(Self { app, _root: root })
    }

    fn app(&self) -> &AppState {
        &self.app
    }
}

fn parse_date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("a YYYY-MM-DD date")
}

fn parse_kind(raw: &str) -> LocationKind {
    LocationKind::from_slug(raw).expect("a known location kind")
}

fn mode_from_word(word: &str) -> DateMode {
    match word {
        "day" => DateMode::Day,
        "night" => DateMode::Night,
        other => panic!("unknown date mode word {other}"),
    }
}

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.registered_user = None;
    world.trip = None;
    world.last_rejection = None;
}

#[given(
    regex = r#"^a registered user \"([^\"]+)\" with email \"([^\"]+)\" and password \"([^\"]+)\"$"#
)]
async fn given_registered_user(
    world: &mut AppWorld,
    username: String,
    email: String,
    password: String,
) {
    register_user(world, username, email, password).await;
}

#[when(
    regex = r#"^I register a user \"([^\"]+)\" with email \"([^\"]+)\" and password \"([^\"]+)\"$"#
)]
async fn when_register_user(
    world: &mut AppWorld,
    username: String,
    email: String,
    password: String,
) {
    register_user(world, username, email, password).await;
}

#[then(regex = r#"^I can authenticate as \"([^\"]+)\" using password \"([^\"]+)\"$"#)]
async fn then_can_authenticate(world: &mut AppWorld, identifier: String, password: String) {
    let authed = auth::authenticate_user(world.app_state(), &identifier, &password)
        .await
        .expect("authentication");
    assert_eq!(authed.username, identifier);
}

#[then(regex = r#"^authenticating as \"([^\"]+)\" using password \"([^\"]+)\" fails$"#)]
async fn then_authentication_fails(world: &mut AppWorld, identifier: String, password: String) {
    let result = auth::authenticate_user(world.app_state(), &identifier, &password).await;
    assert!(result.is_err(), "authentication unexpectedly succeeded");
}

#[given(regex = r#"^a trip \"([^\"]+)\" starting on (\d{4}-\d{2}-\d{2}) with (\d+) nights?$"#)]
async fn given_trip(world: &mut AppWorld, title: String, start: String, nights: u32) {
    let draft = TripDraft {
        title,
        start_date: parse_date(&start),
        number_nights: nights,
    };
    draft.validate().expect("a valid trip draft");
    let owner_id = world.current_user().id;
    let trip = world
        .app_state()
        .trips
        .create_trip(owner_id, &draft)
        .await
        .expect("create trip");
    world.trip = Some(trip);
}

#[when(regex = r#"^the trip is changed to (\d+) nights?$"#)]
async fn when_trip_shrinks(world: &mut AppWorld, nights: u32) {
    let trip = world.current_trip().clone();
    let draft = TripDraft {
        title: trip.title,
        start_date: trip.start_date,
        number_nights: nights,
    };
    world
        .app_state()
        .trips
        .update_trip(trip.id, &draft)
        .await
        .expect("update trip");
    world.reload_trip().await;
}

#[when("the trip is deleted")]
async fn when_trip_deleted(world: &mut AppWorld) {
    let trip_id = world.current_trip().id;
    world
        .app_state()
        .trips
        .delete_trip(trip_id)
        .await
        .expect("delete trip");
}

#[then(regex = r#"^the (day|night) choices are \"([^\"]*)\"$"#)]
async fn then_choices_are(world: &mut AppWorld, mode_word: String, expected: String) {
    let mode = mode_from_word(&mode_word);
    let rendered: Vec<String> = world
        .current_trip()
        .date_choices(mode)
        .iter()
        .map(ToString::to_string)
        .collect();
    let expected: Vec<String> = if expected.is_empty() {
        Vec::new()
    } else {
        expected.split(", ").map(str::to_owned).collect()
    };
    assert_eq!(rendered, expected);
}

#[then(regex = r#"^there are (\d+) day choices and (\d+) night choices$"#)]
async fn then_choice_counts(world: &mut AppWorld, days: usize, nights: usize) {
    let trip = world.current_trip();
    assert_eq!(trip.date_choices(DateMode::Day).len(), days);
    assert_eq!(trip.date_choices(DateMode::Night).len(), nights);
}

#[when(regex = r#"^I add an? \"([a-z]+)\" location \"([^\"]*)\" dated \"([^\"]*)\"$"#)]
async fn when_add_location(world: &mut AppWorld, kind: String, title: String, label: String) {
    let kind = parse_kind(&kind);
    let trip = world.current_trip().clone();
    let date = match label.parse() {
        Ok(date) => date,
        Err(err) => {
            world.last_rejection = Some(format!("{err}"));
            return;
        }
    };
    let location = NewLocation {
        trip_id: trip.id,
        kind,
        title,
        date,
        latitude: None,
        longitude: None,
    };
    match location.validate(&trip) {
        Ok(()) => {
            world
                .app_state()
                .trips
                .insert_location(&location)
                .await
                .expect("insert location");
            world.last_rejection = None;
        }
        Err(error) => {
            assert_eq!(error.field, "date");
            world.last_rejection = Some(error.message);
        }
    }
}

#[then("the location is rejected with a date error")]
async fn then_location_rejected(world: &mut AppWorld) {
    assert!(
        world.last_rejection.is_some(),
        "expected the location to be rejected"
    );
}

#[then(regex = r#"^the trip has (\d+) stored locations?$"#)]
async fn then_stored_location_count(world: &mut AppWorld, expected: usize) {
    let trip_id = world.current_trip().id;
    let locations = world
        .app_state()
        .trips
        .locations(trip_id)
        .await
        .expect("load locations");
    assert_eq!(locations.len(), expected);
}

#[then(regex = r#"^the trip trailhead is \"([^\"]*)\"$"#)]
async fn then_trailhead_is(world: &mut AppWorld, expected: String) {
    let trip = world.current_trip();
    let locations = world
        .app_state()
        .trips
        .locations(trip.id)
        .await
        .expect("load locations");
    let trailhead = trip.trailhead(&locations).expect("a trailhead");
    assert_eq!(trailhead.title, expected);
}

#[then(regex = r#"^the stored \"([a-z]+)\" locations? no longer validates?$"#)]
async fn then_stored_location_invalid(world: &mut AppWorld, kind: String) {
    let kind = parse_kind(&kind);
    let trip = world.current_trip().clone();
    let locations = world
        .app_state()
        .trips
        .locations(trip.id)
        .await
        .expect("load locations");
    let mut checked = 0;
    for location in locations.iter().filter(|l| l.kind == kind) {
        checked += 1;
        assert!(
            location.validate(&trip).is_err(),
            "{} should no longer validate",
            location.date
        );
    }
    assert!(checked > 0, "no stored {kind} locations to check");
}

#[then(regex = r#"^the ([a-z]+) context has (\d+) buckets?$"#)]
async fn then_context_bucket_count(world: &mut AppWorld, kind: String, expected: usize) {
    let kind = parse_kind(&kind);
    let trip = world.current_trip().clone();
    let locations = world
        .app_state()
        .trips
        .locations(trip.id)
        .await
        .expect("load locations");
    let context = trip.location_context(kind, &locations);
    assert_eq!(context.len(), expected);
}

#[then(regex = r#"^the ([a-z]+) bucket \"([^\"]*)\" holds (\d+) locations?$"#)]
async fn then_context_bucket_holds(
    world: &mut AppWorld,
    kind: String,
    label: String,
    expected: usize,
) {
    let kind = parse_kind(&kind);
    let trip = world.current_trip().clone();
    let locations = world
        .app_state()
        .trips
        .locations(trip.id)
        .await
        .expect("load locations");
    let context = trip.location_context(kind, &locations);
    let bucket = context
        .iter()
        .find(|group| group.label.to_string() == label)
        .unwrap_or_else(|| panic!("no bucket labelled {label}"));
    assert_eq!(bucket.locations.len(), expected);
}

async fn register_user(world: &mut AppWorld, username: String, email: String, password: String) {
    let created = auth::register_user(world.app_state(), &username, &email, &password)
        .await
        .expect("register user");
    world.registered_user = Some(created);
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
