//! End-to-end pipeline scenarios driven through the facade crate.

use std::sync::Arc;

use serde_json::json;

use troupe::{
    Agent, Content, InMemoryMemoryService, InMemorySessionStore, LlmAgentConfig, MemorySearchTool,
    Part, Runner, RunnerConfig, SessionKey, SessionStore, ToolOutcome, WorkflowConfig,
};
use troupe_testing::{MockModel, MockTool};

const APP: &str = "TripPlannerApp";
const USER: &str = "user1";

fn scout(
    name: &str,
    output_key: &str,
    findings: &str,
    query: &str,
) -> Arc<Agent> {
    let model = MockModel::with_text(findings)
        .then_tool_call("google_search", json!({ "query": query }));
    let search = MockTool::new("google_search")
        .with_description("Searches the web")
        .with_default_response(json!({ "results": findings }));

    Arc::new(
        Agent::llm(
            LlmAgentConfig::new(name, Arc::new(model))
                .with_description(format!("Scouts {} for the requested city.", output_key))
                .with_instruction(
                    "Extract the city from the request, search for it, and output only a brief list.",
                )
                .with_tool(Arc::new(search))
                .with_output_key(output_key),
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn trip_planner_pipeline_merges_scout_results_before_planning() {
    let restaurant_scout = scout(
        "RestaurantScout",
        "restaurant_list",
        "Sushi Dai, Ichiran, Narisawa",
        "top 3 restaurants in Tokyo",
    );
    let activity_scout = scout(
        "ActivityScout",
        "activity_list",
        "Senso-ji, Shibuya Crossing, teamLab",
        "top 3 activities in Tokyo",
    );

    let scouts = Arc::new(
        Agent::parallel(
            WorkflowConfig::new("CityScouts")
                .with_description("Scouts for restaurants and activities in parallel.")
                .with_child(restaurant_scout)
                .with_child(activity_scout),
        )
        .unwrap(),
    );

    let planner_model = Arc::new(MockModel::with_text(
        "Morning: Senso-ji. Lunch: Sushi Dai. Afternoon: teamLab. Dinner: Narisawa.",
    ));
    let planner = Arc::new(
        Agent::llm(
            LlmAgentConfig::new("ItineraryPlanner", planner_model.clone()).with_instruction(
                "Create a one-day itinerary based on the following research:\n\n\
                 Restaurants: {restaurant_list}\n\
                 Activities: {activity_list}\n\n\
                 Combine them into a logical schedule.",
            ),
        )
        .unwrap(),
    );

    let pipeline = Arc::new(
        Agent::sequential(
            WorkflowConfig::new("TripPlannerPipeline")
                .with_description("Executes scouting and then planning.")
                .with_child(scouts)
                .with_child(planner),
        )
        .unwrap(),
    );

    let store = Arc::new(InMemorySessionStore::new());
    store.create(SessionKey::new(APP, USER, "s1")).await.unwrap();
    let runner = Runner::new(RunnerConfig::new(APP, pipeline, store.clone())).unwrap();

    let stream = runner
        .run(USER, "s1", Content::user_text("Plan a trip to Tokyo"))
        .await
        .unwrap();
    let (events, outcome) = stream.collect().await;
    assert!(outcome.is_none(), "{:?}", outcome.map(|e| e.to_string()));

    // Both scout lists were in the context map before the planner ran:
    // its rendered instruction embeds them.
    let rendered = planner_model.last_request().unwrap().instruction;
    assert!(rendered.contains("Sushi Dai, Ichiran, Narisawa"));
    assert!(rendered.contains("Senso-ji, Shibuya Crossing, teamLab"));

    // The final content references both lists.
    let final_event = events.last().unwrap();
    assert_eq!(final_event.author, "ItineraryPlanner");
    assert!(final_event.text().contains("Sushi Dai"));
    assert!(final_event.text().contains("Senso-ji"));

    // The session state carries both output keys.
    let session = store.get(&SessionKey::new(APP, USER, "s1")).await.unwrap();
    assert_eq!(
        session.state.get("restaurant_list"),
        Some("Sushi Dai, Ichiran, Narisawa")
    );
    assert_eq!(
        session.state.get("activity_list"),
        Some("Senso-ji, Shibuya Crossing, teamLab")
    );

    // The interleaving of the two scouts' events is nondeterministic by
    // design, so assert the multiset of authors, not an order: each
    // scout produced its tool round (request, result) plus its findings,
    // and the planner ended the run.
    let mut authors: Vec<&str> = events.iter().map(|e| e.author.as_str()).collect();
    authors.sort_unstable();
    assert_eq!(
        authors,
        [
            "ActivityScout",
            "ActivityScout",
            "ActivityScout",
            "ItineraryPlanner",
            "RestaurantScout",
            "RestaurantScout",
            "RestaurantScout",
        ]
    );
}

#[tokio::test]
async fn agent_recalls_facts_from_earlier_sessions_via_memory_search() {
    let store = Arc::new(InMemorySessionStore::new());
    let memory = Arc::new(InMemoryMemoryService::new());

    // First session: the user states a fact; the completed session is
    // flushed to memory when the run ends.
    let greeter = Arc::new(
        Agent::llm(LlmAgentConfig::new(
            "assistant",
            Arc::new(MockModel::with_text("반가워요, 철수님!")),
        ))
        .unwrap(),
    );
    store
        .create(SessionKey::new("MemoryApp", USER, "session1"))
        .await
        .unwrap();
    let first_runner = Runner::new(
        RunnerConfig::new("MemoryApp", greeter, store.clone()).with_memory(memory.clone()),
    )
    .unwrap();
    let stream = first_runner
        .run(USER, "session1", Content::user_text("내 이름은 철수"))
        .await
        .unwrap();
    let (_, outcome) = stream.collect().await;
    assert!(outcome.is_none());

    // Second session: the agent searches memory before answering.
    let recall_model = Arc::new(
        MockModel::with_text("당신의 이름은 철수입니다.")
            .then_tool_call(MemorySearchTool::NAME, json!({ "query": "이름" })),
    );
    let recaller = Arc::new(
        Agent::llm(
            LlmAgentConfig::new("assistant", recall_model)
                .with_instruction(
                    "Use search_memory when the user asks about personal info. \
                     If the conversation is in Korean, search with Korean keywords.",
                )
                .with_tool(Arc::new(MemorySearchTool::new())),
        )
        .unwrap(),
    );
    store
        .create(SessionKey::new("MemoryApp", USER, "session2"))
        .await
        .unwrap();
    let second_runner = Runner::new(
        RunnerConfig::new("MemoryApp", recaller, store.clone()).with_memory(memory.clone()),
    )
    .unwrap();
    let stream = second_runner
        .run(USER, "session2", Content::user_text("내 이름이 뭐야?"))
        .await
        .unwrap();
    let (events, outcome) = stream.collect().await;
    assert!(outcome.is_none());

    // The tool result carried the remembered fragment.
    let tool_result = events
        .iter()
        .flat_map(|e| e.content.parts.iter())
        .find_map(|p| match p {
            Part::ToolResult(r) => Some(r),
            _ => None,
        })
        .expect("expected a tool result event");
    match &tool_result.outcome {
        ToolOutcome::Success { output } => {
            let results = output["results"].as_array().unwrap();
            assert!(
                results
                    .iter()
                    .any(|r| r.as_str().unwrap().contains("내 이름은 철수"))
            );
        }
        other => panic!("expected success outcome, got {:?}", other),
    }

    assert_eq!(events.last().unwrap().text(), "당신의 이름은 철수입니다.");
}
