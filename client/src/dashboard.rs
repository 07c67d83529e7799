//! The controller. Every user gesture and timer tick lands on one of the
//! operations below, which coordinate the components in [`AppState`] and
//! push the results through the three ports.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};
use traffic_shared::{ChatRequest, LatLon, RouteQuery};

use crate::chat::{self, ChatTurn};
use crate::config::SEARCH_ZOOM;
use crate::error::InputError;
use crate::picker::{Endpoint, SearchHit, parse_lat_lon};
use crate::ports::{Field, MapSurface, Presentation, TrafficApi};
use crate::route::RouteOutcome;
use crate::session::SessionToken;
use crate::state::AppState;
use crate::viewport::BaseLayer;

pub const LOCATION_NOT_FOUND: &str = "Location not found. Try a different search term.";
pub const SEARCH_FAILED: &str = "Error searching location. Please try again.";
pub const NO_ROUTE_FOUND: &str = "No route found";
pub const ROUTE_FAILED: &str = "Error calculating route. Please try again.";

pub struct Dashboard<A, M, P> {
    api: Rc<A>,
    map: Rc<M>,
    ui: Rc<P>,
    state: Rc<RefCell<AppState>>,
}

impl<A, M, P> Clone for Dashboard<A, M, P> {
    fn clone(&self) -> Self {
        Self {
            api: Rc::clone(&self.api),
            map: Rc::clone(&self.map),
            ui: Rc::clone(&self.ui),
            state: Rc::clone(&self.state),
        }
    }
}

impl<A, M, P> Dashboard<A, M, P>
where
    A: TrafficApi,
    M: MapSurface,
    P: Presentation,
{
    pub fn new(api: A, map: M, ui: P, session: SessionToken) -> Self {
        Self {
            api: Rc::new(api),
            map: Rc::new(map),
            ui: Rc::new(ui),
            state: Rc::new(RefCell::new(AppState::new(session))),
        }
    }

    /// Show the initial view and greet the user.
    pub fn start(&self) {
        let session = {
            let state = self.state.borrow();
            state.viewport.attach(&*self.map);
            state.session.clone()
        };
        info!(session = %session, "dashboard started");
        self.say(chat::WELCOME_MESSAGE);
    }

    pub async fn load_cities(&self) {
        match self.api.cities().await {
            Ok(cities) => {
                info!(count = cities.len(), "loaded cities");
                self.ui.set_cities(&cities);
                self.state.borrow_mut().cities = cities;
            }
            Err(e) => warn!(error = %e, "failed to load cities"),
        }
    }

    /// Make `name` the active city: recenter, drop the route and incident
    /// markers, fetch fresh incidents. Blank or unknown names are ignored.
    pub async fn change_city(&self, name: &str) {
        if name.is_empty() {
            return;
        }
        let city = {
            let mut state = self.state.borrow_mut();
            let Some(city) = state.cities.iter().find(|city| city.name == name).cloned() else {
                debug!(city = name, "ignoring unknown city");
                return;
            };
            state.current_city = Some(city.clone());
            state.viewport.focus_city(city.center(), &*self.map);
            city
        };

        self.clear_route();
        self.state.borrow_mut().incidents.clear(&*self.map);

        self.load_traffic_data().await;
        self.say(&chat::city_switched_message(&city.name));
    }

    /// Replace the incident overlay with a fresh fetch for the active city.
    pub async fn load_traffic_data(&self) {
        let Some(bbox) = self
            .state
            .borrow()
            .current_city
            .as_ref()
            .map(|city| city.bbox.clone())
        else {
            return;
        };

        match self.api.incidents(&bbox).await {
            Ok(incidents) => {
                debug!(count = incidents.len(), bbox = %bbox, "loaded incidents");
                self.state
                    .borrow_mut()
                    .incidents
                    .apply(incidents, &*self.map, &*self.ui);
            }
            Err(e) => warn!(error = %e, bbox = %bbox, "failed to load incidents"),
        }
    }

    pub fn map_click(&self, position: LatLon) -> Option<Endpoint> {
        let filled = self
            .state
            .borrow_mut()
            .picker
            .on_map_click(position, &*self.map, &*self.ui);
        debug!(?filled, lat = position.lat, lon = position.lon, "map click");
        filled
    }

    pub fn switch_base_layer(&self, base: BaseLayer) {
        self.state
            .borrow_mut()
            .viewport
            .switch_base_layer(base, &*self.map);
    }

    pub async fn search_location(&self) {
        let query = self.ui.field(Field::SearchQuery).trim().to_string();
        if query.is_empty() {
            self.reject(InputError::EmptySearch);
            return;
        }
        let city_context = self.state.borrow().city_name().unwrap_or_default().to_string();

        match self.api.geocode(&query, &city_context).await {
            Ok(result) if result.found => {
                let hit = SearchHit::from(&result);
                let message = chat::location_found_message(&hit.display_name);
                {
                    let mut state = self.state.borrow_mut();
                    state.viewport.focus(hit.position, SEARCH_ZOOM, &*self.map);
                    let marker = state.picker.show_search_hit(hit, &*self.map);
                    self.map.open_popup(marker);
                }
                self.say(&message);
            }
            Ok(_) => self.ui.notify(LOCATION_NOT_FOUND),
            Err(e) => {
                warn!(error = %e, query = %query, "geocode failed");
                self.ui.notify(SEARCH_FAILED);
            }
        }
    }

    pub fn set_as_start(&self, position: LatLon) {
        self.assign(Endpoint::Start, position);
    }

    pub fn set_as_end(&self, position: LatLon) {
        self.assign(Endpoint::End, position);
    }

    /// Position of the last search hit, for promoting it to start or end.
    pub fn search_hit_position(&self) -> Option<LatLon> {
        self.state.borrow().picker.search_hit().map(|hit| hit.position)
    }

    fn assign(&self, endpoint: Endpoint, position: LatLon) {
        self.state
            .borrow_mut()
            .picker
            .assign(endpoint, position, &*self.map, &*self.ui);
    }

    pub async fn calculate_route(&self) {
        let query = match self.route_query() {
            Ok(query) => query,
            Err(e) => {
                self.reject(e);
                return;
            }
        };

        let route = match self.api.route(&query).await {
            Ok(route) => route,
            Err(e) => {
                warn!(error = %e, "route request failed");
                self.ui.notify(ROUTE_FAILED);
                return;
            }
        };

        let outcome = self.state.borrow_mut().route.show(&route, &*self.map);
        match outcome {
            RouteOutcome::NoRoute => self.ui.notify(NO_ROUTE_FOUND),
            RouteOutcome::Drawn { summary, notice } => {
                info!(
                    points = route.coordinates.len(),
                    recommended = route.recommended,
                    "route drawn"
                );
                self.ui.show_route_summary(Some(&summary));
                if let Some(notice) = notice {
                    self.say(&notice);
                }
            }
        }
    }

    fn route_query(&self) -> Result<RouteQuery, InputError> {
        let start = self.ui.field(Field::StartLocation);
        let end = self.ui.field(Field::EndLocation);
        let (start, end) = (start.trim(), end.trim());
        if start.is_empty() || end.is_empty() {
            return Err(InputError::MissingEndpoints);
        }
        Ok(RouteQuery {
            start: parse_lat_lon(start)?,
            end: parse_lat_lon(end)?,
            avoid_traffic: self.ui.avoid_traffic(),
        })
    }

    /// Empty both slots and remove the route with its markers and summary.
    pub fn clear_route(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.route.clear(&*self.map);
            state.picker.clear(&*self.map, &*self.ui);
        }
        self.ui.show_route_summary(None);
    }

    pub async fn send_chat(&self) {
        let message = self.ui.field(Field::ChatInput).trim().to_string();
        if message.is_empty() {
            return;
        }
        self.ui.set_field(Field::ChatInput, "");

        let request = {
            let state = self.state.borrow();
            state.city_name().map(|city| ChatRequest {
                session_id: state.session.as_str().to_string(),
                message: message.clone(),
                city: city.to_string(),
                incidents: state.incidents.current().to_vec(),
                flows: state.flows.clone(),
            })
        };
        let Some(request) = request else {
            self.say(chat::NO_CITY_MESSAGE);
            return;
        };

        self.append(ChatTurn::user(message));
        if self.state.borrow_mut().chat.begin_typing() {
            self.ui.set_typing(true);
        }

        let reply = self.api.chat(&request).await;
        if self.state.borrow_mut().chat.end_typing() {
            self.ui.set_typing(false);
        }
        match reply {
            Ok(reply) => {
                debug!(from_ai = reply.from_ai, "assistant replied");
                self.say(&reply.message);
            }
            Err(e) => {
                warn!(error = %e, "chat request failed");
                self.say(chat::APOLOGY_MESSAGE);
            }
        }
    }

    /// One refresh period elapsed.
    pub async fn refresh_tick(&self) {
        if self.state.borrow().current_city.is_none() {
            return;
        }
        debug!("refreshing incidents");
        self.load_traffic_data().await;
    }

    fn say(&self, text: &str) {
        self.append(ChatTurn::assistant(text));
    }

    fn append(&self, turn: ChatTurn) {
        let mut state = self.state.borrow_mut();
        self.ui.append_turn(state.chat.push(turn));
    }

    fn reject(&self, error: InputError) {
        debug!(%error, "input rejected");
        self.ui.notify(&error.to_string());
    }
}

#[cfg(test)]
impl<A, M, P> Dashboard<A, M, P> {
    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn ui(&self) -> &P {
        &self.ui
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;
    use traffic_shared::{ChatReply, GeocodeResult, Route, TrafficCondition};

    use super::*;
    use crate::chat::Role;
    use crate::error::ApiError;
    use crate::ports::{Overlay, PinIcon, TileLayer};
    use crate::testing::{
        ApiCall, FakeApi, FakeMap, FakePresentation, MapOp, city, flow, incident, route,
    };

    type TestDashboard = Dashboard<FakeApi, FakeMap, FakePresentation>;

    fn dashboard() -> TestDashboard {
        Dashboard::new(
            FakeApi::default(),
            FakeMap::default(),
            FakePresentation::default(),
            SessionToken::mint(1_700_000_000_000, 42),
        )
    }

    /// A dashboard with Paris loaded and selected.
    fn in_paris() -> TestDashboard {
        let dash = dashboard();
        dash.api().push_cities(Ok(vec![city("Paris", "2.2,48.8,2.4,48.9")]));
        dash.api().push_incidents(Ok(vec![incident(2, 10.0)]));
        block_on(dash.load_cities());
        block_on(dash.change_city("Paris"));
        dash
    }

    fn assistant_texts(ui: &FakePresentation) -> Vec<String> {
        ui.turns()
            .into_iter()
            .filter(|turn| turn.role == Role::Assistant)
            .map(|turn| turn.text)
            .collect()
    }

    #[test]
    fn start_attaches_map_and_greets() {
        let dash = dashboard();
        dash.start();

        assert_eq!(dash.map().tiles(), vec![TileLayer::Streets]);
        assert_eq!(
            dash.ui().turns(),
            vec![ChatTurn::assistant(chat::WELCOME_MESSAGE)]
        );
    }

    #[test]
    fn load_cities_fills_selector() {
        let dash = dashboard();
        dash.api().push_cities(Ok(vec![city("Paris", "b"), city("Lyon", "c")]));
        block_on(dash.load_cities());

        let names: Vec<String> = dash.ui().cities().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Paris", "Lyon"]);
    }

    #[test]
    fn failed_city_load_is_silent() {
        let dash = dashboard();
        dash.api().push_cities(Err(ApiError::Status(503)));
        block_on(dash.load_cities());

        assert!(dash.ui().cities().is_empty());
        assert!(dash.ui().notices().is_empty());
    }

    #[test]
    fn changing_city_recenters_and_loads_incidents() {
        let dash = in_paris();

        assert!(dash.map().ops().contains(&MapOp::SetView(
            LatLon::new(48.8566, 2.3522),
            crate::config::CITY_ZOOM
        )));
        assert_eq!(
            dash.api().calls(),
            vec![
                ApiCall::Cities,
                ApiCall::Incidents("2.2,48.8,2.4,48.9".into())
            ]
        );
        assert_eq!(dash.ui().incidents().len(), 1);
        assert_eq!(dash.map().live_count(), 1);
        assert_eq!(
            assistant_texts(dash.ui()).last().map(String::as_str),
            Some(chat::city_switched_message("Paris").as_str())
        );
    }

    #[test]
    fn unknown_or_blank_city_is_ignored() {
        let dash = in_paris();
        let calls = dash.api().calls().len();

        block_on(dash.change_city(""));
        block_on(dash.change_city("Atlantis"));

        assert_eq!(dash.api().calls().len(), calls);
        assert_eq!(dash.with_state(|s| s.city_name().map(str::to_string)), Some("Paris".into()));
    }

    #[test]
    fn changing_city_clears_route_and_old_incidents() {
        let dash = in_paris();
        dash.map_click(LatLon::new(48.85, 2.35));
        dash.map_click(LatLon::new(48.86, 2.36));
        let mut drawn = route(3);
        drawn.traffic_points = vec![flow(55.0)];
        dash.api().push_route(Ok(drawn));
        block_on(dash.calculate_route());
        assert!(dash.ui().route_summary().is_some());

        dash.api().push_incidents(Err(ApiError::Network("offline".into())));
        block_on(dash.change_city("Paris"));

        assert_eq!(dash.map().live_count(), 0);
        assert_eq!(dash.ui().field(Field::StartLocation), "");
        assert_eq!(dash.ui().route_summary(), None);
    }

    #[test]
    fn incident_refresh_computes_stats() {
        let dash = in_paris();
        dash.api()
            .push_incidents(Ok(vec![incident(4, 30.0), incident(2, 5.0)]));
        block_on(dash.refresh_tick());

        let stats = dash.ui().stats().unwrap();
        assert_eq!(stats.incident_count, 2);
        assert_eq!(stats.speed_label(), "43 km/h");
        assert_eq!(stats.condition, TrafficCondition::Heavy);
        assert_eq!(dash.map().live_count(), 2);
    }

    #[test]
    fn refresh_without_city_does_nothing() {
        let dash = dashboard();
        block_on(dash.refresh_tick());
        assert!(dash.api().calls().is_empty());
    }

    #[test]
    fn empty_refresh_resets_stats() {
        let dash = in_paris();
        dash.api().push_incidents(Ok(Vec::new()));
        block_on(dash.refresh_tick());

        let stats = dash.ui().stats().unwrap();
        assert_eq!(stats.speed_label(), "60 km/h");
        assert_eq!(stats.condition.label(), "Free Flow");
        assert_eq!(dash.map().live_count(), 0);
    }

    #[test]
    fn failed_refresh_keeps_previous_overlay() {
        let dash = in_paris();
        dash.api().push_incidents(Err(ApiError::Status(500)));
        block_on(dash.refresh_tick());

        assert_eq!(dash.map().live_count(), 1);
        assert!(dash.ui().notices().is_empty());
    }

    #[test]
    fn third_click_is_a_no_op() {
        let dash = dashboard();
        assert_eq!(dash.map_click(LatLon::new(1.0, 1.0)), Some(Endpoint::Start));
        assert_eq!(dash.map_click(LatLon::new(2.0, 2.0)), Some(Endpoint::End));
        assert_eq!(dash.map_click(LatLon::new(3.0, 3.0)), None);

        assert_eq!(dash.ui().field(Field::StartLocation), "1.00000, 1.00000");
        assert_eq!(dash.ui().field(Field::EndLocation), "2.00000, 2.00000");
        assert_eq!(dash.map().live_count(), 2);
    }

    #[test]
    fn clear_route_resets_everything_it_owns() {
        let dash = in_paris();
        dash.map_click(LatLon::new(48.85, 2.35));
        dash.map_click(LatLon::new(48.86, 2.36));
        let mut drawn = route(4);
        drawn.traffic_points = vec![flow(80.0), flow(40.0)];
        dash.api().push_route(Ok(drawn));
        block_on(dash.calculate_route());
        // start, end, polyline, two congestion markers, one incident
        assert_eq!(dash.map().live_count(), 6);

        dash.clear_route();

        assert_eq!(dash.ui().field(Field::StartLocation), "");
        assert_eq!(dash.ui().field(Field::EndLocation), "");
        assert_eq!(dash.ui().route_summary(), None);
        assert_eq!(dash.map().live_count(), 1);
        assert_eq!(dash.map_click(LatLon::new(1.0, 1.0)), Some(Endpoint::Start));
    }

    #[test]
    fn invalid_coordinates_make_no_request() {
        let dash = dashboard();
        dash.ui().set_field(Field::StartLocation, "somewhere");
        dash.ui().set_field(Field::EndLocation, "48.8, 2.3");

        block_on(dash.calculate_route());

        assert!(dash.api().calls().is_empty());
        assert_eq!(
            dash.ui().notices(),
            vec![InputError::InvalidCoordinates.to_string()]
        );
    }

    #[test]
    fn missing_endpoint_makes_no_request() {
        let dash = dashboard();
        dash.ui().set_field(Field::StartLocation, "48.8, 2.3");

        block_on(dash.calculate_route());

        assert!(dash.api().calls().is_empty());
        assert_eq!(
            dash.ui().notices(),
            vec!["Please enter both start and end locations".to_string()]
        );
    }

    #[test]
    fn route_request_carries_parsed_points_and_toggle() {
        let dash = dashboard();
        dash.ui().set_field(Field::StartLocation, "48.85, 2.35");
        dash.ui().set_field(Field::EndLocation, "48.87, 2.30");
        dash.ui().set_avoid_traffic(true);
        dash.api().push_route(Ok(route(2)));

        block_on(dash.calculate_route());

        assert_eq!(
            dash.api().calls(),
            vec![ApiCall::Route(RouteQuery {
                start: LatLon::new(48.85, 2.35),
                end: LatLon::new(48.87, 2.30),
                avoid_traffic: true,
            })]
        );
        let summary = dash.ui().route_summary().unwrap();
        assert_eq!(summary.distance_label(), "12.35 km");
        assert_eq!(summary.duration_label(), "26 minutes");
    }

    #[test]
    fn empty_route_discards_previous_and_notifies() {
        let dash = dashboard();
        dash.ui().set_field(Field::StartLocation, "48.85, 2.35");
        dash.ui().set_field(Field::EndLocation, "48.87, 2.30");
        let mut first = route(3);
        first.traffic_points = vec![flow(90.0)];
        dash.api().push_route(Ok(first));
        block_on(dash.calculate_route());
        let summary = dash.ui().route_summary();
        assert_eq!(dash.map().live_count(), 2);

        dash.api().push_route(Ok(route(0)));
        block_on(dash.calculate_route());

        assert_eq!(dash.map().live_count(), 0);
        assert_eq!(dash.ui().notices(), vec![NO_ROUTE_FOUND.to_string()]);
        assert_eq!(dash.ui().route_summary(), summary);
    }

    #[test]
    fn failed_route_request_notifies() {
        let dash = dashboard();
        dash.ui().set_field(Field::StartLocation, "48.85, 2.35");
        dash.ui().set_field(Field::EndLocation, "48.87, 2.30");
        dash.api().push_route(Err(ApiError::Decode("bad json".into())));

        block_on(dash.calculate_route());

        assert_eq!(dash.ui().notices(), vec![ROUTE_FAILED.to_string()]);
    }

    #[test]
    fn recommended_heavy_route_only_praises() {
        let dash = dashboard();
        dash.ui().set_field(Field::StartLocation, "48.85, 2.35");
        dash.ui().set_field(Field::EndLocation, "48.87, 2.30");
        let mut best = route(3);
        best.recommended = true;
        best.recommendation_reason = Some("Avoids the ring road".into());
        best.average_congestion = Some(72.0);
        dash.api().push_route(Ok(best));

        block_on(dash.calculate_route());

        let said = assistant_texts(dash.ui());
        assert_eq!(said.len(), 1);
        assert!(said[0].starts_with("I found a better route! Avoids the ring road."));
    }

    #[test]
    fn search_hit_zooms_marks_and_announces() {
        let dash = in_paris();
        dash.ui().set_field(Field::SearchQuery, "  Louvre ");
        dash.api().push_geocode(Ok(GeocodeResult {
            found: true,
            latitude: 48.8606,
            longitude: 2.3376,
            display_name: "Louvre".into(),
            message: None,
        }));
        dash.map().clear_ops();

        block_on(dash.search_location());

        assert_eq!(
            dash.api().calls().last(),
            Some(&ApiCall::Geocode {
                query: "Louvre".into(),
                city: "Paris".into()
            })
        );
        let ops = dash.map().ops();
        assert_eq!(ops[0], MapOp::SetView(LatLon::new(48.8606, 2.3376), SEARCH_ZOOM));
        assert!(matches!(ops.last(), Some(MapOp::OpenPopup(_))));
        assert_eq!(
            dash.search_hit_position(),
            Some(LatLon::new(48.8606, 2.3376))
        );
        assert_eq!(
            assistant_texts(dash.ui()).last(),
            Some(&chat::location_found_message("Louvre"))
        );
    }

    #[test]
    fn search_without_city_sends_empty_context() {
        let dash = dashboard();
        dash.ui().set_field(Field::SearchQuery, "Louvre");
        dash.api().push_geocode(Ok(GeocodeResult::default()));

        block_on(dash.search_location());

        assert_eq!(
            dash.api().calls(),
            vec![ApiCall::Geocode {
                query: "Louvre".into(),
                city: String::new()
            }]
        );
        assert_eq!(dash.ui().notices(), vec![LOCATION_NOT_FOUND.to_string()]);
    }

    #[test]
    fn blank_search_is_rejected_locally() {
        let dash = dashboard();
        dash.ui().set_field(Field::SearchQuery, "   ");
        block_on(dash.search_location());

        assert!(dash.api().calls().is_empty());
        assert_eq!(
            dash.ui().notices(),
            vec!["Please enter a location to search".to_string()]
        );
    }

    #[test]
    fn failed_search_notifies() {
        let dash = dashboard();
        dash.ui().set_field(Field::SearchQuery, "Louvre");
        dash.api().push_geocode(Err(ApiError::Status(502)));
        block_on(dash.search_location());

        assert_eq!(dash.ui().notices(), vec![SEARCH_FAILED.to_string()]);
    }

    #[test]
    fn set_as_start_then_end_leaves_one_marker_each() {
        let dash = dashboard();
        dash.set_as_start(LatLon::new(1.0, 1.0));
        dash.set_as_start(LatLon::new(2.0, 2.0));
        dash.set_as_end(LatLon::new(3.0, 3.0));
        dash.set_as_end(LatLon::new(4.0, 4.0));

        let pins: Vec<(PinIcon, LatLon)> = dash
            .map()
            .live_overlays()
            .into_iter()
            .filter_map(|overlay| match overlay {
                Overlay::Pin { icon, position, .. } => Some((icon, position)),
                _ => None,
            })
            .collect();
        assert_eq!(
            pins,
            vec![
                (PinIcon::Start, LatLon::new(2.0, 2.0)),
                (PinIcon::End, LatLon::new(4.0, 4.0))
            ]
        );
        assert_eq!(dash.ui().field(Field::EndLocation), "4.00000, 4.00000");
    }

    #[test]
    fn chat_without_city_answers_locally() {
        let dash = dashboard();
        dash.ui().set_field(Field::ChatInput, "How is traffic?");

        block_on(dash.send_chat());

        assert!(dash.api().calls().is_empty());
        assert_eq!(
            dash.ui().turns(),
            vec![ChatTurn::assistant(chat::NO_CITY_MESSAGE)]
        );
        assert_eq!(dash.ui().field(Field::ChatInput), "");
    }

    #[test]
    fn blank_chat_is_ignored() {
        let dash = in_paris();
        let turns = dash.ui().turns().len();
        dash.ui().set_field(Field::ChatInput, "  ");

        block_on(dash.send_chat());

        assert_eq!(dash.ui().turns().len(), turns);
        assert_eq!(dash.api().calls().len(), 2);
    }

    #[test]
    fn chat_sends_context_and_appends_reply() {
        let dash = in_paris();
        let before = dash.ui().turns().len();
        dash.ui().set_field(Field::ChatInput, " Any jams? ");
        dash.api().push_chat(Ok(ChatReply {
            message: "Light traffic downtown.".into(),
            from_ai: true,
            timestamp: None,
        }));

        block_on(dash.send_chat());

        let Some(ApiCall::Chat(request)) = dash.api().calls().last().cloned() else {
            panic!("expected a chat call");
        };
        assert_eq!(request.session_id, "session_1700000000000_000000016");
        assert_eq!(request.message, "Any jams?");
        assert_eq!(request.city, "Paris");
        assert_eq!(request.incidents.len(), 1);
        assert!(request.flows.is_empty());

        assert_eq!(
            dash.ui().turns()[before..].to_vec(),
            vec![
                ChatTurn::user("Any jams?"),
                ChatTurn::assistant("Light traffic downtown.")
            ]
        );
        assert!(!dash.ui().typing());
        assert_eq!(dash.ui().typing_shown(), 1);
        assert_eq!(dash.ui().field(Field::ChatInput), "");
    }

    #[test]
    fn chat_failure_leaves_user_turn_and_apology() {
        let dash = in_paris();
        let before = dash.ui().turns().len();
        dash.ui().set_field(Field::ChatInput, "Any jams?");
        dash.api().push_chat(Err(ApiError::Network("offline".into())));

        block_on(dash.send_chat());

        assert_eq!(
            dash.ui().turns()[before..].to_vec(),
            vec![
                ChatTurn::user("Any jams?"),
                ChatTurn::assistant(chat::APOLOGY_MESSAGE)
            ]
        );
        assert!(!dash.ui().typing());
        assert!(!dash.with_state(|s| s.chat.is_typing()));
    }

    fn reply(text: &str) -> ChatReply {
        ChatReply {
            message: text.into(),
            from_ai: true,
            timestamp: None,
        }
    }

    #[test]
    fn placeholder_outlives_unrelated_turns() {
        let dash = in_paris();
        let release = dash.api().hold_chat();
        dash.api().push_chat(Ok(reply("Busy on the ring road.")));
        dash.api().push_incidents(Ok(Vec::new()));
        dash.ui().set_field(Field::ChatInput, "Any jams?");

        let mut pool = LocalPool::new();
        let sender = dash.clone();
        pool.spawner()
            .spawn_local(async move { sender.send_chat().await })
            .unwrap();
        pool.run_until_stalled();
        assert!(dash.ui().typing());

        block_on(dash.change_city("Paris"));
        assert_eq!(
            assistant_texts(dash.ui()).last(),
            Some(&chat::city_switched_message("Paris"))
        );
        assert!(dash.ui().typing());

        release.send(()).unwrap();
        pool.run();
        assert!(!dash.ui().typing());
        assert_eq!(
            assistant_texts(dash.ui()).last().map(String::as_str),
            Some("Busy on the ring road.")
        );
    }

    #[test]
    fn overlapping_sends_keep_placeholder_until_last_reply() {
        let dash = in_paris();
        let first = dash.api().hold_chat();
        let second = dash.api().hold_chat();
        dash.api().push_chat(Ok(reply("First answer.")));
        dash.api().push_chat(Ok(reply("Second answer.")));

        let mut pool = LocalPool::new();
        for question in ["Any jams?", "Best time to leave?"] {
            dash.ui().set_field(Field::ChatInput, question);
            let sender = dash.clone();
            pool.spawner()
                .spawn_local(async move { sender.send_chat().await })
                .unwrap();
            pool.run_until_stalled();
        }
        assert!(dash.ui().typing());

        first.send(()).unwrap();
        pool.run_until_stalled();
        assert!(dash.ui().typing());
        assert_eq!(
            assistant_texts(dash.ui()).last().map(String::as_str),
            Some("First answer.")
        );

        second.send(()).unwrap();
        pool.run();
        assert!(!dash.ui().typing());
        assert_eq!(dash.ui().typing_shown(), 1);
    }

    #[test]
    fn null_route_body_tears_down_and_reports_no_route() {
        let dash = dashboard();
        dash.ui().set_field(Field::StartLocation, "48.85, 2.35");
        dash.ui().set_field(Field::EndLocation, "48.87, 2.30");
        let mut first = route(3);
        first.traffic_points = vec![flow(75.0)];
        dash.api().push_route(Ok(first));
        block_on(dash.calculate_route());
        assert_eq!(dash.map().live_count(), 2);

        let empty: Route = serde_json::from_str(
            r#"{"coordinates": null, "distance": 0.0, "duration": 0.0,
                "routeTrafficPoints": null, "averageCongestion": null,
                "trafficLevel": null, "recommended": false, "recommendationReason": null}"#,
        )
        .unwrap();
        dash.api().push_route(Ok(empty));
        block_on(dash.calculate_route());

        assert_eq!(dash.map().live_count(), 0);
        assert_eq!(dash.ui().notices(), vec![NO_ROUTE_FOUND.to_string()]);
    }

    #[test]
    fn switching_layers_goes_through_viewport() {
        let dash = dashboard();
        dash.start();
        dash.switch_base_layer(BaseLayer::Hybrid);
        assert_eq!(
            dash.map().tiles(),
            vec![TileLayer::Hybrid, TileLayer::HybridLabels]
        );
        dash.switch_base_layer(BaseLayer::Streets);
        assert_eq!(dash.map().tiles(), vec![TileLayer::Streets]);
    }
}
