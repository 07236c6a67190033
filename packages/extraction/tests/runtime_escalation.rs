//! Integration tests for escalation across engines.
//!
//! These tests drive the runtime end to end with mock providers:
//! 1. Load a template
//! 2. Escalate through the try-list
//! 3. Check which engines were reached and what the caller gets back

use std::sync::Arc;
use std::time::{Duration, Instant};

use contract_extraction::{
    testing::{MockEmbedder, MockLlm, MockNer},
    EngineConfig, EngineError, EngineType, EscalationMode, EscalationPolicy, ExtractionRequest,
    ExtractionRuntime, ExtractionTemplate, NerEntity, Rule, RuleAction, RuleCondition,
    RuntimeConfig, SemanticContract, Subentity,
};

const DATE_PATTERN: &str = r"(?<day>\d{1,2})[/-](?<month>\d{1,2})[/-](?<year>\d{2,4})";

/// Helper: composite date-of-birth contract, all fields required.
fn dob() -> SemanticContract {
    SemanticContract::composite(
        "date",
        "Date of birth",
        vec![
            Subentity::new("day", "Day"),
            Subentity::new("month", "Month"),
            Subentity::new("year", "Year"),
        ],
    )
    .with_id("dob")
}

fn christmas_rule() -> Rule {
    Rule::new(
        RuleCondition::contains(["christmas"]),
        RuleAction::emit([("day", "25"), ("month", "12"), ("year", "1990")]),
    )
}

/// Helper: regex, then rules, with the LLM as default engine.
fn dob_template() -> ExtractionTemplate {
    ExtractionTemplate::new(
        dob(),
        vec![
            EngineConfig::regex([DATE_PATTERN]),
            EngineConfig::rule_based(vec![christmas_rule()]),
            EngineConfig::llm(None),
        ],
        EscalationPolicy::new(EngineType::Llm)
            .with_engine(EngineType::Regex, 1)
            .with_engine(EngineType::RuleBased, 2),
    )
}

#[tokio::test]
async fn test_regex_match_short_circuits() {
    let llm = Arc::new(MockLlm::new());
    let runtime = ExtractionRuntime::new().with_llm(llm.clone());

    let result = runtime
        .extract_template(&dob_template(), "15/04/2020")
        .await
        .unwrap();

    assert!(result.has_match);
    assert_eq!(result.values["day"], "15");
    assert_eq!(result.values["month"], "04");
    assert_eq!(result.values["year"], "2020");
    assert_eq!(result.source, Some(EngineType::Regex));
    assert!((result.confidence - 0.95).abs() < 1e-6);
    assert!(result.errors.is_empty());

    // later engines are never invoked
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_exhaustion_reports_union_of_errors() {
    let llm = Arc::new(MockLlm::new().with_default_response("I'm not sure, sorry"));
    let runtime = ExtractionRuntime::new().with_llm(llm.clone());

    let result = runtime
        .extract_template(&dob_template(), "I forget")
        .await
        .unwrap();

    assert!(!result.has_match);
    assert!(result.values.is_empty());
    assert_eq!(result.source, None);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(
        &result.errors[..3],
        &[
            "missing required field: Day (day)",
            "missing required field: Month (month)",
            "missing required field: Year (year)",
        ]
    );
    // regex and rules report the same missing fields; they appear once
    assert_eq!(result.errors.len(), 4);
    assert!(result.errors[3].starts_with("llm engine failed: unparseable response"));
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_second_engine_wins_when_first_misses() {
    let llm = Arc::new(MockLlm::new());
    let runtime = ExtractionRuntime::new().with_llm(llm.clone());

    let result = runtime
        .extract_template(&dob_template(), "born on Christmas")
        .await
        .unwrap();

    assert_eq!(result.source, Some(EngineType::RuleBased));
    assert_eq!(result.values["day"], "25");
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_default_engine_tried_last() {
    let llm = Arc::new(
        MockLlm::new().with_response("the third of May", r#"{"day": "3", "month": "5", "year": "1985"}"#),
    );
    let runtime = ExtractionRuntime::new().with_llm(llm.clone());

    let result = runtime
        .extract_template(&dob_template(), "the third of May, 1985")
        .await
        .unwrap();

    assert!(result.has_match);
    assert_eq!(result.source, Some(EngineType::Llm));
    assert_eq!(result.values["month"], "5");
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_invalid_capture_escalates() {
    // the regex captures an impossible month; the LLM gets a chance
    let llm = Arc::new(MockLlm::new().with_default_response(r#"{"day": "31", "month": "1", "year": "2013"}"#));
    let runtime = ExtractionRuntime::new().with_llm(llm.clone());

    let result = runtime
        .extract_template(&dob_template(), "31/13/2012")
        .await
        .unwrap();

    assert_eq!(result.source, Some(EngineType::Llm));
    assert_eq!(result.values["month"], "1");
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_disabled_engine_is_skipped() {
    let llm = Arc::new(MockLlm::new().with_default_response(r#"{"day": "1", "month": "2", "year": "2003"}"#));
    let runtime = ExtractionRuntime::new().with_llm(llm.clone());

    let mut template = dob_template();
    template.escalation = EscalationPolicy::new(EngineType::Llm)
        .with_disabled_engine(EngineType::Regex, 1)
        .with_engine(EngineType::RuleBased, 2);

    let result = runtime.extract_template(&template, "15/04/2020").await.unwrap();

    assert_eq!(result.source, Some(EngineType::Llm));
    assert_eq!(result.values["year"], "2003");
}

#[tokio::test]
async fn test_engine_timeout_escalates() {
    let ner = Arc::new(
        MockNer::new()
            .with_entities("Ada, 15/04/2020", vec![NerEntity::new("15", "DAY")])
            .with_delay(Duration::from_millis(500)),
    );
    let runtime = ExtractionRuntime::new()
        .with_ner(ner.clone())
        .with_llm(Arc::new(MockLlm::new()));

    let template = ExtractionTemplate::new(
        dob(),
        vec![
            EngineConfig::ner([("DAY", "day")]).with_timeout_ms(30),
            EngineConfig::regex([DATE_PATTERN]),
            EngineConfig::llm(None),
        ],
        EscalationPolicy::new(EngineType::Llm)
            .with_engine(EngineType::Ner, 1)
            .with_engine(EngineType::Regex, 2),
    );

    let result = runtime.extract_template(&template, "Ada, 15/04/2020").await.unwrap();

    assert_eq!(result.source, Some(EngineType::Regex));
    assert_eq!(ner.calls().len(), 1);
}

#[tokio::test]
async fn test_timeout_reported_on_exhaustion() {
    let llm = Arc::new(MockLlm::new().with_delay(Duration::from_millis(500)));
    let runtime = ExtractionRuntime::new()
        .with_llm(llm)
        .with_config(RuntimeConfig::new().with_engine_timeout_ms(EngineType::Llm, 20));

    let template = ExtractionTemplate::new(
        SemanticContract::simple("email", "Email"),
        vec![EngineConfig::llm(None)],
        EscalationPolicy::new(EngineType::Llm).with_engine(EngineType::Llm, 1),
    );

    let result = runtime.extract_template(&template, "write to me").await.unwrap();

    assert!(!result.has_match);
    assert_eq!(result.errors, vec!["llm engine failed: timed out after 20ms"]);
}

#[tokio::test]
async fn test_provider_failure_is_soft() {
    let llm = Arc::new(MockLlm::new().failing(EngineError::Transport("connection reset".into())));
    let runtime = ExtractionRuntime::new().with_llm(llm);

    let result = runtime
        .extract_template(&dob_template(), "I forget")
        .await
        .unwrap();

    assert!(!result.has_match);
    assert!(result
        .errors
        .contains(&"llm engine failed: transport error: connection reset".to_string()));
}

#[tokio::test]
async fn test_llm_cache_hit_across_calls() {
    let llm = Arc::new(MockLlm::new().with_default_response(r#"{"day": "3", "month": "5", "year": "1985"}"#));
    let runtime = ExtractionRuntime::new().with_llm(llm.clone());
    let plan = runtime.load(&dob_template()).unwrap();

    let first = runtime.extract(&plan, "the third of May, 1985").await;
    let second = runtime.extract(&plan, "The third of  May, 1985").await;

    assert_eq!(first, second);
    assert_eq!(llm.call_count(), 1);
    assert_eq!(runtime.llm_cache().len(), 1);
}

#[tokio::test]
async fn test_llm_cache_expires() {
    let llm = Arc::new(MockLlm::new().with_default_response(r#"{"day": "3", "month": "5", "year": "1985"}"#));
    let runtime = ExtractionRuntime::new()
        .with_llm(llm.clone())
        .with_config(RuntimeConfig::new().with_llm_cache_ttl_secs(0));
    let plan = runtime.load(&dob_template()).unwrap();

    runtime.extract(&plan, "the third of May, 1985").await;
    runtime.extract(&plan, "the third of May, 1985").await;

    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_concurrent_mode_matches_sequential() {
    let inputs = ["15/04/2020", "born on Christmas", "I forget", "3rd of May 1985"];

    for input in inputs {
        let llm = || {
            Arc::new(
                MockLlm::new()
                    .with_response("3rd of May", r#"{"day": "3", "month": "5", "year": "1985"}"#)
                    .with_default_response("no idea"),
            )
        };

        let sequential = ExtractionRuntime::new().with_llm(llm());
        let concurrent = ExtractionRuntime::new()
            .with_llm(llm())
            .with_config(RuntimeConfig::new().with_mode(EscalationMode::Concurrent));

        let a = sequential.extract_template(&dob_template(), input).await.unwrap();
        let b = concurrent.extract_template(&dob_template(), input).await.unwrap();

        assert_eq!(a, b, "modes disagree on {:?}", input);
    }
}

#[tokio::test]
async fn test_concurrent_mode_does_not_wait_for_slow_engines() {
    let llm = Arc::new(MockLlm::new().with_delay(Duration::from_millis(800)));
    let runtime = ExtractionRuntime::new()
        .with_llm(llm)
        .with_config(RuntimeConfig::new().with_mode(EscalationMode::Concurrent));

    let start = Instant::now();
    let result = runtime
        .extract_template(&dob_template(), "15/04/2020")
        .await
        .unwrap();

    assert_eq!(result.source, Some(EngineType::Regex));
    assert!(
        start.elapsed() < Duration::from_millis(400),
        "waited {:?} for an engine behind the winner",
        start.elapsed()
    );
}

#[tokio::test]
async fn test_concurrent_mode_waits_for_earlier_engines() {
    // ner is first in the try-list and slower than regex; it still wins
    let ner = Arc::new(
        MockNer::new()
            .with_entities(
                "15/04/2020",
                vec![
                    NerEntity::new("15", "DAY"),
                    NerEntity::new("4", "MONTH"),
                    NerEntity::new("2020", "YEAR"),
                ],
            )
            .with_delay(Duration::from_millis(100)),
    );
    let runtime = ExtractionRuntime::new()
        .with_ner(ner.clone())
        .with_llm(Arc::new(MockLlm::new()))
        .with_config(RuntimeConfig::new().with_mode(EscalationMode::Concurrent));

    let template = ExtractionTemplate::new(
        dob(),
        vec![
            EngineConfig::ner([("DAY", "day"), ("MONTH", "month"), ("YEAR", "year")]),
            EngineConfig::regex([DATE_PATTERN]),
            EngineConfig::llm(None),
        ],
        EscalationPolicy::new(EngineType::Llm)
            .with_engine(EngineType::Ner, 1)
            .with_engine(EngineType::Regex, 2),
    );

    let result = runtime.extract_template(&template, "15/04/2020").await.unwrap();

    assert_eq!(result.source, Some(EngineType::Ner));
    assert_eq!(result.values["month"], "4");
    assert_eq!(ner.calls().len(), 1);
}

#[tokio::test]
async fn test_templates_sharing_a_contract_keep_their_own_examples() {
    let embedder = Arc::new(
        MockEmbedder::new()
            .with_embedding("yes please", vec![1.0, 0.0, 0.0])
            .with_embedding("no thanks", vec![0.0, 1.0, 0.0])
            .with_embedding("nope", vec![0.0, 1.0, 0.0]),
    );
    let runtime = ExtractionRuntime::new().with_embedder(embedder);

    let confirm = || SemanticContract::simple("confirmation", "Confirmation").with_id("confirm");
    let template = |positives: &[&str]| {
        ExtractionTemplate::new(
            confirm(),
            vec![EngineConfig::embedding(
                positives.iter().copied(),
                Vec::<String>::new(),
                0.9,
            )],
            EscalationPolicy::new(EngineType::Embedding).with_engine(EngineType::Embedding, 1),
        )
    };

    let accept = runtime
        .extract_template(&template(&["yes please"]), "nope")
        .await
        .unwrap();
    let refuse = runtime
        .extract_template(&template(&["no thanks"]), "nope")
        .await
        .unwrap();

    assert!(!accept.has_match);
    assert!(refuse.has_match);
    assert_eq!(refuse.values["value"], "no thanks");
    assert_eq!(refuse.source, Some(EngineType::Embedding));
}

#[tokio::test]
async fn test_handle_request_and_json_response() {
    let runtime = ExtractionRuntime::new().with_llm(Arc::new(MockLlm::new()));
    let plan = runtime.load(&dob_template()).unwrap();

    let request: ExtractionRequest = serde_json::from_str(r#"{"text": "15/04/2020"}"#).unwrap();
    let result = runtime.handle(&plan, &request).await;

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["hasMatch"], true);
    assert_eq!(json["source"], "regex");
    assert_eq!(json["values"]["day"], "15");
    assert!(json["errors"].as_array().unwrap().is_empty());
}
