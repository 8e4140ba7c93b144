//! Turn orchestration: classify, dispatch, display, then opportunistically map
//! the place the user asked about.
//!
//! The session owns the transcript and the loading indicator. A turn holds a
//! `LoadingGuard` for as long as it is dispatching, and the guard is released
//! on every exit path, including a dropped turn future.

use crate::commands::{Command, CommandRouter};
use crate::core::error::GeoChatError;
use crate::extract;
use crate::gateway::{GeocodeResult, ToolGateway, ToolPayload};
use crate::map::{MapHandle, MapRenderer, MapRequest};
use crate::utils::text::sanitize_response;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;

const GEOCODE_NOT_FOUND: &str = "Could not geocode location";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

/// One transcript entry. Never edited or removed once appended.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Author,
    pub text: String,
    pub created_at: DateTime<Local>,
}

type LoadingListener = Arc<dyn Fn(bool) + Send + Sync>;

/// Visible "working on it" state. At most one guard exists at a time.
#[derive(Clone, Default)]
pub struct LoadingIndicator {
    active: Arc<AtomicBool>,
    listener: Option<LoadingListener>,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `listener` with `true` when a turn starts loading and `false` when it ends.
    pub fn with_listener(listener: impl Fn(bool) + Send + Sync + 'static) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            listener: Some(Arc::new(listener)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Shows the indicator, or returns `None` if another turn already holds it.
    pub fn try_begin(&self) -> Option<LoadingGuard> {
        self.active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        if let Some(listener) = &self.listener {
            listener(true);
        }
        Some(LoadingGuard {
            active: Arc::clone(&self.active),
            listener: self.listener.clone(),
        })
    }
}

pub struct LoadingGuard {
    active: Arc<AtomicBool>,
    listener: Option<LoadingListener>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(listener) = &self.listener {
            listener(false);
        }
    }
}

/// A place found and mapped by the automatic follow-up of a chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedPlace {
    pub candidate: String,
    pub result: GeocodeResult,
    pub map: MapHandle,
}

#[derive(Debug, Default)]
pub struct TurnOutcome {
    /// Map rendered for a successful `/geocode` command
    pub map: Option<MapHandle>,
    /// Background geocode of the place mentioned in a chat question. Its
    /// failures are logged and resolve to `None`.
    pub auto_geocode: Option<JoinHandle<Option<LocatedPlace>>>,
}

pub struct ChatSession {
    router: CommandRouter,
    gateway: Arc<ToolGateway>,
    renderer: Arc<dyn MapRenderer>,
    indicator: LoadingIndicator,
    messages: Vec<ChatMessage>,
    map_zoom: u8,
    should_continue: bool,
}

impl ChatSession {
    pub fn new(
        router: CommandRouter,
        gateway: Arc<ToolGateway>,
        renderer: Arc<dyn MapRenderer>,
        indicator: LoadingIndicator,
        map_zoom: u8,
    ) -> Self {
        Self {
            router,
            gateway,
            renderer,
            indicator,
            messages: Vec::new(),
            map_zoom,
            should_continue: true,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    pub fn should_continue(&self) -> bool {
        self.should_continue
    }

    /// Runs one user turn to completion and returns what it started.
    ///
    /// Every failure of the turn itself ends up in the transcript as an
    /// assistant message; only an empty input or an overlapping turn is
    /// returned as an error.
    pub async fn submit(&mut self, raw: &str) -> Result<TurnOutcome, GeoChatError> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(GeoChatError::Input("No query provided".to_string()));
        }

        if self.indicator.is_active() {
            return Err(GeoChatError::Busy);
        }

        let mut outcome = TurnOutcome::default();
        let classified = self.router.classify(input);

        // Only turns that reach a backend show the loading indicator
        let guard = match &classified {
            Ok(command) if command.is_remote() => {
                Some(self.indicator.try_begin().ok_or(GeoChatError::Busy)?)
            }
            _ => None,
        };
        self.push(Author::User, input.to_string());

        let command = match classified {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(error = %e, "command rejected");
                self.push(Author::Assistant, render_error(&e, None));
                return Ok(outcome);
            }
        };

        let Some(guard) = guard else {
            self.handle_local(command);
            return Ok(outcome);
        };

        let result = {
            let _loading = guard;
            self.gateway.dispatch(&command).await
        };

        match result {
            Ok(payload) => self.complete(input, payload, &mut outcome),
            Err(e) => self.push(Author::Assistant, render_error(&e, Some(&command))),
        }

        tracing::info!(kind = command.kind(), "turn finished");
        Ok(outcome)
    }

    fn handle_local(&mut self, command: Command) {
        match command {
            Command::Help => {
                let help = self.router.help_text();
                self.push(Author::Assistant, help);
            }
            Command::Quit => {
                self.should_continue = false;
            }
            Command::Unknown { name, .. } => {
                self.push(Author::Assistant, format!("Unknown command: {}", name));
            }
            other => {
                tracing::warn!(kind = other.kind(), "remote command reached local handler");
            }
        }
    }

    fn complete(&mut self, input: &str, payload: ToolPayload, outcome: &mut TurnOutcome) {
        match payload {
            ToolPayload::Answer(answer) => {
                self.push(Author::Assistant, sanitize_response(&answer));
                outcome.auto_geocode = Some(self.spawn_auto_geocode(input));
            }
            ToolPayload::Geocoded(found) => {
                self.push(
                    Author::Assistant,
                    format!(
                        "Found {} at latitude {:.4}, longitude {:.4}.",
                        found.location, found.coordinates.lat, found.coordinates.lon
                    ),
                );
                outcome.map = self.render_map(&found);
            }
            ToolPayload::Buffer {
                lat,
                lon,
                distance_km,
                result,
            } => {
                let mut text = format!(
                    "Created a {} km buffer around ({:.4}, {:.4}).",
                    distance_km, lat, lon
                );
                if let Some(kind) = result.pointer("/geometry/type").and_then(|t| t.as_str()) {
                    text.push_str(&format!(" Geometry: {}.", kind));
                }
                self.push(Author::Assistant, text);
            }
            ToolPayload::Tool { name, result } => {
                let dump = serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string());
                self.push(
                    Author::Assistant,
                    format!("Tool '{}' result:\n```json\n{}\n```", name, dump),
                );
            }
        }
    }

    fn render_map(&self, found: &GeocodeResult) -> Option<MapHandle> {
        let request = MapRequest {
            label: found.location.clone(),
            coordinates: found.coordinates,
            zoom: self.map_zoom,
        };
        match self.renderer.render(&request) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(location = %found.location, error = %e, "map render failed");
                None
            }
        }
    }

    /// Looks for a place name in the user's own question and maps the first
    /// one found. Runs after the answer is already in the transcript and never
    /// writes to it.
    fn spawn_auto_geocode(&self, query: &str) -> JoinHandle<Option<LocatedPlace>> {
        let gateway = Arc::clone(&self.gateway);
        let renderer = Arc::clone(&self.renderer);
        let zoom = self.map_zoom;
        let query = query.to_string();

        tokio::spawn(async move {
            let candidate = extract::primary_candidate(&query)?;
            tracing::debug!(
                name = %candidate.name,
                source = ?candidate.source,
                confidence = ?candidate.confidence,
                "auto-geocoding place from question"
            );
            let candidate = candidate.name;

            let located = async {
                let result = gateway.geocode(&candidate).await?;
                let map = renderer.render(&MapRequest {
                    label: result.location.clone(),
                    coordinates: result.coordinates,
                    zoom,
                })?;
                Ok::<_, GeoChatError>(LocatedPlace {
                    candidate: candidate.clone(),
                    result,
                    map,
                })
            }
            .await;

            match located {
                Ok(place) => Some(place),
                Err(e) => {
                    tracing::warn!(%candidate, error = %e, "automatic geocode failed");
                    None
                }
            }
        })
    }

    fn push(&mut self, role: Author, text: String) {
        self.messages.push(ChatMessage {
            role,
            text,
            created_at: Local::now(),
        });
    }
}

/// User-facing text for a failed turn.
fn render_error(err: &GeoChatError, command: Option<&Command>) -> String {
    match (err, command) {
        (GeoChatError::Usage(_), _) => err.to_string(),
        (GeoChatError::Backend(message), Some(Command::Geocode { location }))
            if message.contains(GEOCODE_NOT_FOUND) =>
        {
            format!(
                "Error: Location '{}' not found. Try a more specific place name.",
                location
            )
        }
        _ => format!("Error: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create_command_router;
    use crate::gateway::testing::{FakeChat, FakeGis};
    use crate::gateway::{ChatBackend, Coordinates};
    use crate::providers::chat::UnconfiguredChatBackend;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingRenderer {
        requests: Mutex<Vec<MapRequest>>,
    }

    impl MapRenderer for RecordingRenderer {
        fn render(&self, request: &MapRequest) -> Result<MapHandle, GeoChatError> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            Ok(MapHandle::new(format!("map-{}", requests.len())))
        }
    }

    /// Chat backend that only answers once notified.
    struct StalledChat {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl ChatBackend for StalledChat {
        async fn chat(&self, _query: &str) -> Result<String, GeoChatError> {
            self.gate.notified().await;
            Ok("late".to_string())
        }
    }

    fn session_with(
        chat: Arc<dyn ChatBackend>,
        gis: Arc<FakeGis>,
        renderer: Arc<RecordingRenderer>,
    ) -> ChatSession {
        ChatSession::new(
            create_command_router(),
            Arc::new(ToolGateway::new(chat, gis)),
            renderer,
            LoadingIndicator::new(),
            12,
        )
    }

    fn assistant_texts(session: &ChatSession) -> Vec<String> {
        session
            .messages()
            .iter()
            .filter(|m| m.role == Author::Assistant)
            .map(|m| m.text.clone())
            .collect()
    }

    #[tokio::test]
    async fn geocode_command_reports_coordinates_and_maps_them() {
        let gis = Arc::new(FakeGis::geocoding("Jaipur", 26.9, 75.8));
        let renderer = Arc::new(RecordingRenderer::default());
        let mut session = session_with(Arc::new(FakeChat::default()), gis.clone(), renderer.clone());

        let outcome = session.submit("/geocode Jaipur").await.unwrap();

        let texts = assistant_texts(&session);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("26.9000"));
        assert!(texts[0].contains("75.8000"));
        assert!(!texts[0].contains("Usage"));
        assert_eq!(outcome.map, Some(MapHandle::new("map-1")));
        assert!(outcome.auto_geocode.is_none());
        assert_eq!(gis.calls(), vec!["geocode:Jaipur"]);
        assert_eq!(session.messages()[0].role, Author::User);
    }

    #[tokio::test]
    async fn chat_answer_is_shown_before_auto_geocode_finishes() {
        let gate = Arc::new(Notify::new());
        let gis = FakeGis {
            geocode_gate: Some(gate.clone()),
            ..FakeGis::default()
        };
        gis.push_geocode(Ok(GeocodeResult {
            location: "Mumbai, India".to_string(),
            coordinates: Coordinates { lat: 19.07, lon: 72.87 },
        }));
        let gis = Arc::new(gis);
        let renderer = Arc::new(RecordingRenderer::default());
        let chat = Arc::new(FakeChat::answering(
            "Based on my analysis: Flood zones follow the Mithi river.",
        ));
        let mut session = session_with(chat, gis.clone(), renderer.clone());

        let outcome = session
            .submit("How can I find flood zones near Mumbai?")
            .await
            .unwrap();

        // The answer is already in the transcript while the geocode is stalled
        assert_eq!(
            assistant_texts(&session),
            vec!["Flood zones follow the Mithi river.".to_string()]
        );
        assert!(!session.indicator.is_active());
        let handle = outcome.auto_geocode.expect("chat turns spawn a follow-up");
        assert!(!handle.is_finished());
        assert!(renderer.requests.lock().unwrap().is_empty());

        gate.notify_one();
        let place = handle.await.unwrap().expect("Mumbai should be located");

        assert_eq!(place.candidate, "Mumbai");
        assert_eq!(gis.calls(), vec!["geocode:Mumbai"]);
        let requests = renderer.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].coordinates, Coordinates { lat: 19.07, lon: 72.87 });
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn auto_geocode_failure_stays_out_of_transcript() {
        let gis = Arc::new(FakeGis::default());
        gis.push_geocode(Err(GeoChatError::Transport(
            "Connection failed: reset by peer".to_string(),
        )));
        let renderer = Arc::new(RecordingRenderer::default());
        let chat = Arc::new(FakeChat::answering("Groundwater is shallow there."));
        let mut session = session_with(chat, gis.clone(), renderer.clone());

        let outcome = session.submit("Groundwater depth in Pune").await.unwrap();
        let place = outcome.auto_geocode.unwrap().await.unwrap();

        assert!(place.is_none());
        assert_eq!(gis.calls(), vec!["geocode:Pune"]);
        assert_eq!(
            assistant_texts(&session),
            vec!["Groundwater is shallow there.".to_string()]
        );
        assert!(renderer.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn question_without_place_skips_geocode() {
        let gis = Arc::new(FakeGis::default());
        let chat = Arc::new(FakeChat::answering("NDVI measures vegetation."));
        let mut session = session_with(chat, gis.clone(), Arc::new(RecordingRenderer::default()));

        let outcome = session.submit("what is ndvi").await.unwrap();

        assert!(outcome.auto_geocode.unwrap().await.unwrap().is_none());
        assert!(gis.calls().is_empty());
    }

    #[tokio::test]
    async fn usage_error_is_shown_without_network_call() {
        let gis = Arc::new(FakeGis::default());
        let mut session = session_with(
            Arc::new(FakeChat::default()),
            gis.clone(),
            Arc::new(RecordingRenderer::default()),
        );

        session.submit("/buffer 1 2").await.unwrap();

        assert_eq!(
            assistant_texts(&session),
            vec!["Usage: /buffer [lat] [lon] [distance_km]".to_string()]
        );
        assert!(gis.calls().is_empty());
        assert!(!session.indicator.is_active());
    }

    #[tokio::test]
    async fn parse_error_is_prefixed() {
        let gis = Arc::new(FakeGis::default());
        let mut session = session_with(
            Arc::new(FakeChat::default()),
            gis.clone(),
            Arc::new(RecordingRenderer::default()),
        );

        session.submit("/buffer 19.07 x 10").await.unwrap();

        assert_eq!(
            assistant_texts(&session),
            vec!["Error: Invalid coordinates or distance".to_string()]
        );
        assert!(gis.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_location_gets_friendly_message() {
        let mut session = session_with(
            Arc::new(FakeChat::default()),
            Arc::new(FakeGis::default()),
            Arc::new(RecordingRenderer::default()),
        );

        session.submit("/geocode Atlantis").await.unwrap();

        assert_eq!(
            assistant_texts(&session),
            vec!["Error: Location 'Atlantis' not found. Try a more specific place name.".to_string()]
        );
    }

    #[tokio::test]
    async fn other_geocode_errors_pass_through() {
        let gis = Arc::new(FakeGis::default());
        gis.push_geocode(Err(GeoChatError::Backend(
            "Coordinates (51.5, -0.1) are outside India's geographic region".to_string(),
        )));
        let mut session = session_with(
            Arc::new(FakeChat::default()),
            gis,
            Arc::new(RecordingRenderer::default()),
        );

        session.submit("/geocode London").await.unwrap();

        assert_eq!(
            assistant_texts(&session),
            vec!["Error: Coordinates (51.5, -0.1) are outside India's geographic region".to_string()]
        );
    }

    #[tokio::test]
    async fn transport_failure_is_reported_and_indicator_cleared() {
        let chat = Arc::new(FakeChat::failing(GeoChatError::Transport(
            "Connection failed: refused".to_string(),
        )));
        let gis = Arc::new(FakeGis::default());
        let mut session = session_with(chat, gis.clone(), Arc::new(RecordingRenderer::default()));

        let outcome = session.submit("Soil types near Nagpur").await.unwrap();

        assert_eq!(
            assistant_texts(&session),
            vec!["Error: Connection failed: refused".to_string()]
        );
        assert!(outcome.auto_geocode.is_none());
        assert!(gis.calls().is_empty());
        assert!(!session.indicator.is_active());
    }

    #[tokio::test]
    async fn buffer_and_tool_results_are_summarised() {
        let gis = Arc::new(FakeGis::default());
        gis.push_value(Ok(serde_json::json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": []}
        })));
        gis.push_value(Ok(serde_json::json!(42.5)));
        let mut session = session_with(
            Arc::new(FakeChat::default()),
            gis.clone(),
            Arc::new(RecordingRenderer::default()),
        );

        session.submit("/buffer 19.07 72.87 5").await.unwrap();
        session
            .submit(r#"/tool calculate_area {"units": "km2"}"#)
            .await
            .unwrap();

        let texts = assistant_texts(&session);
        assert_eq!(
            texts[0],
            "Created a 5 km buffer around (19.0700, 72.8700). Geometry: Polygon."
        );
        assert_eq!(texts[1], "Tool 'calculate_area' result:\n```json\n42.5\n```");
        assert_eq!(
            gis.calls(),
            vec![
                "buffer:19.07:72.87:5".to_string(),
                r#"tool:calculate_area:{"units":"km2"}"#.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn local_commands_stay_local() {
        let gis = Arc::new(FakeGis::default());
        let mut session = session_with(
            Arc::new(FakeChat::default()),
            gis.clone(),
            Arc::new(RecordingRenderer::default()),
        );

        session.submit("/help").await.unwrap();
        session.submit("/route Delhi Agra").await.unwrap();
        assert!(session.should_continue());
        session.submit("/quit").await.unwrap();

        let texts = assistant_texts(&session);
        assert!(texts[0].contains("/geocode"));
        assert_eq!(texts[1], "Unknown command: /route");
        assert_eq!(texts.len(), 2);
        assert!(!session.should_continue());
        assert!(gis.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let mut session = session_with(
            Arc::new(FakeChat::default()),
            Arc::new(FakeGis::default()),
            Arc::new(RecordingRenderer::default()),
        );

        let err = session.submit("   ").await.unwrap_err();

        assert!(matches!(err, GeoChatError::Input(_)));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn dropped_turn_releases_indicator() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorded = events.clone();
        let indicator = LoadingIndicator::with_listener(move |on| recorded.lock().unwrap().push(on));
        let gate = Arc::new(Notify::new());
        let mut session = ChatSession::new(
            create_command_router(),
            Arc::new(ToolGateway::new(
                Arc::new(StalledChat { gate }),
                Arc::new(FakeGis::default()),
            )),
            Arc::new(RecordingRenderer::default()),
            indicator.clone(),
            12,
        );

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), session.submit("slow question")).await;

        assert!(timed_out.is_err());
        assert!(!indicator.is_active());
        assert!(!session.indicator.is_active());
        assert_eq!(*events.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn slash_commands_work_without_chat_provider() {
        let chat = Arc::new(UnconfiguredChatBackend::new("No Gemini API key found".to_string()));
        let gis = Arc::new(FakeGis::geocoding("Jaipur", 26.9, 75.8));
        let mut session = session_with(chat, gis, Arc::new(RecordingRenderer::default()));

        session.submit("/geocode Jaipur").await.unwrap();
        let outcome = session.submit("Rainfall in Jaipur").await.unwrap();

        let texts = assistant_texts(&session);
        assert!(texts[0].contains("26.9000"));
        assert_eq!(texts[1], "Error: Configuration error: No Gemini API key found");
        assert!(outcome.auto_geocode.is_none());
    }

    #[tokio::test]
    async fn local_turns_never_show_indicator() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorded = events.clone();
        let indicator = LoadingIndicator::with_listener(move |on| recorded.lock().unwrap().push(on));
        let mut session = ChatSession::new(
            create_command_router(),
            Arc::new(ToolGateway::new(
                Arc::new(FakeChat::default()),
                Arc::new(FakeGis::geocoding("Jaipur", 26.9, 75.8)),
            )),
            Arc::new(RecordingRenderer::default()),
            indicator,
            12,
        );

        session.submit("/buffer 1 2").await.unwrap();
        session.submit("/help").await.unwrap();
        session.submit("/route Delhi").await.unwrap();
        assert!(events.lock().unwrap().is_empty());

        session.submit("/geocode Jaipur").await.unwrap();
        assert_eq!(*events.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn turn_during_dispatch_is_busy() {
        let indicator = LoadingIndicator::new();
        let mut session = ChatSession::new(
            create_command_router(),
            Arc::new(ToolGateway::new(
                Arc::new(FakeChat::default()),
                Arc::new(FakeGis::default()),
            )),
            Arc::new(RecordingRenderer::default()),
            indicator.clone(),
            12,
        );

        let _held = indicator.try_begin().unwrap();
        let err = session.submit("/help").await.unwrap_err();

        assert!(matches!(err, GeoChatError::Busy));
        assert!(session.messages().is_empty());
    }

    #[test]
    fn indicator_admits_one_turn_at_a_time() {
        let indicator = LoadingIndicator::new();

        let first = indicator.try_begin().expect("idle indicator starts");
        assert!(indicator.is_active());
        assert!(indicator.try_begin().is_none());

        drop(first);
        assert!(!indicator.is_active());
        assert!(indicator.try_begin().is_some());
    }
}
