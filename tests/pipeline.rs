use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use product_page_generator::copy::{build_blocks, build_fallback, cta_label, normalize, render_document, select_framework, RemotePayload};
use product_page_generator::gemini::{GeminiClient, TextGenerator, DEMO_KEY};
use product_page_generator::generation::{resolve, CopyService, CopyServiceError, HttpCopyService, ModelCopyService};
use product_page_generator::jobs::JobQueue;
use product_page_generator::models::{BlockType, GenerateCopyRequest, MarketingFramework, ProductInput, ToneSetting};
use product_page_generator::notify::Notifier;
use product_page_generator::scrape::HttpScraper;
use product_page_generator::{router, AppState, GenerationEvent, GenerationOrchestrator, Phase};

fn mug() -> ProductInput {
    ProductInput {
        title: "Mug".into(),
        description: "Ceramic mug".into(),
        price: 12.0,
        images: vec!["mug.jpg".into()],
        tone: Some(ToneSetting::Luxury),
        ..Default::default()
    }
}

fn block_types(blocks: &[product_page_generator::models::GeneratedBlock]) -> Vec<BlockType> {
    blocks.iter().map(|b| b.block_type).collect()
}

#[test]
fn luxury_mug_gets_four_ps_page() {
    let result = build_fallback(&mug(), "");
    assert_eq!(result.framework, MarketingFramework::FourPs);
    assert_eq!(block_types(&result.blocks), vec![BlockType::Hook, BlockType::Summary, BlockType::Cta]);
    assert_eq!(result.blocks[2].headline, cta_label(MarketingFramework::FourPs));
}

#[test]
fn assembly_and_rendering_are_deterministic() {
    let product = ProductInput {
        features: Some(vec!["Dishwasher safe".into()]),
        key_benefits: Some(vec!["Keeps coffee hot".into()]),
        ..mug()
    };
    let framework = select_framework(Some(&product));
    let first = build_blocks(&product, framework);
    assert_eq!(first, build_blocks(&product, framework));
    assert_eq!(render_document(&product, &first), render_document(&product, &first));
}

#[test]
fn fallback_is_total_for_any_prompt() {
    for prompt in ["", "   ", "write something", "<script>"] {
        let result = build_fallback(&ProductInput::default(), prompt);
        assert!(!result.blocks.is_empty());
        assert_eq!(result.blocks.first().map(|b| b.block_type), Some(BlockType::Hook));
        assert_eq!(result.blocks.last().map(|b| b.block_type), Some(BlockType::Cta));
    }
}

#[test]
fn technical_tone_always_selects_fab() {
    let product = ProductInput {
        tone: Some(ToneSetting::Technical),
        description: "Your dream problem solver for the future".into(),
        ..mug()
    };
    assert_eq!(select_framework(Some(&product)), MarketingFramework::Fab);
}

#[test]
fn bullets_are_deduplicated_and_empty_use_cases_omitted() {
    let product = ProductInput {
        features: Some(vec!["A".into(), "A".into(), "B".into()]),
        use_cases: Some(vec![]),
        ..mug()
    };
    let blocks = build_blocks(&product, MarketingFramework::Aida);
    let features = blocks.iter().find(|b| b.block_type == BlockType::Features).unwrap();
    assert_eq!(features.bullets, Some(vec!["A".to_string(), "B".to_string()]));
    assert!(blocks.iter().all(|b| b.block_type != BlockType::UseCases));
}

#[test]
fn legacy_text_payload_is_rebuilt_locally() {
    let payload = RemotePayload::classify(&json!({ "copy": "x" }));
    assert_eq!(payload, RemotePayload::LegacyText("x".into()));
    assert_eq!(normalize(&payload, &mug(), "prompt"), build_fallback(&mug(), "x"));
}

struct GatedService;

#[async_trait]
impl CopyService for GatedService {
    async fn generate(&self, request: &GenerateCopyRequest) -> Result<Value, CopyServiceError> {
        if request.prompt == "first" {
            std::future::pending::<()>().await;
        }
        Ok(json!({
            "framework": "PAS",
            "headline": request.prompt,
            "blocks": [{ "id": "hook-0", "type": "hook", "title": "Hook", "headline": "h", "body": "b" }],
            "html": "<article></article>"
        }))
    }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<GenerationEvent>) -> GenerationEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap()
}

#[tokio::test]
async fn only_the_latest_cycle_is_observed() {
    let (orchestrator, mut events) = GenerationOrchestrator::new(Arc::new(GatedService), Duration::from_secs(30));
    orchestrator.update(Some(&mug()), Some("first"));
    orchestrator.update(Some(&mug()), Some("second"));

    assert!(matches!(next_event(&mut events).await, GenerationEvent::Loading));
    assert!(matches!(next_event(&mut events).await, GenerationEvent::Loading));
    match next_event(&mut events).await {
        GenerationEvent::Settled { result, advisory } => {
            assert_eq!(result.headline, "second");
            assert_eq!(result.framework, MarketingFramework::Pas);
            assert!(advisory.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(orchestrator.phase(), Phase::Settled { fallback: false });
    assert!(tokio::time::timeout(Duration::from_millis(100), events.recv()).await.is_err());
}

fn demo_generator() -> Arc<dyn TextGenerator> {
    Arc::new(GeminiClient::new(DEMO_KEY.into(), "http://127.0.0.1:9".into(), "demo".into(), Duration::from_secs(1)))
}

#[tokio::test]
async fn http_copy_service_round_trips_through_the_api() {
    let generator = demo_generator();
    let scraper = Arc::new(HttpScraper::new(Duration::from_secs(1)).unwrap());
    let notifier = Notifier::new(Duration::ZERO);
    let state = AppState {
        store: Arc::default(),
        generator: generator.clone(),
        copy_service: Arc::new(ModelCopyService::new(generator.clone())),
        scraper: scraper.clone(),
        jobs: JobQueue::start(1, 100, Vec::new(), scraper, generator, notifier.clone()),
        notifier,
        request_timeout: Duration::from_secs(5),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router(state)).await.unwrap() });

    let service = HttpCopyService::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
    let outcome = resolve(&service, &mug(), "Write copy for a mug", Duration::from_secs(5)).await;
    assert!(outcome.advisory.is_none());
    assert_eq!(outcome.result, build_fallback(&mug(), "Write copy for a mug"));
}

#[tokio::test]
async fn unreachable_copy_service_falls_back_with_advisory() {
    let service = HttpCopyService::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    let outcome = resolve(&service, &mug(), "prompt", Duration::from_secs(2)).await;
    assert_eq!(outcome.advisory.as_deref(), Some("Failed to generate AI copy, using fallback content."));
    assert_eq!(outcome.result, build_fallback(&mug(), "prompt"));
}
