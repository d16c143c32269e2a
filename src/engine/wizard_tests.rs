// Scenario tests for the wizard engine
use crate::{
    engine::{
        registry::{steps_for, EDIT_NAME_PROMPT, FIRST_STEP_BACK},
        validation::{CATEGORY_NOT_IN_LIST, PRICE_DIGITS_ONLY},
        wizard::{Completion, StepOutcome, WizardEngine, WizardSettings, BANNER_SAVED, CANCELED, PRODUCT_SAVED},
        CatalogStorage, ChatTransport, InMemoryCatalog, InMemorySessionStore, RecordingTransport, SessionStore,
    },
    models::{
        Category, CategoryId, ConversationId, FieldName, FieldValue, InfoPage, Keyboard, PhotoRef, Product,
        ProductFields, ProductId, StepRejection, UserInput, WizardEventType, WizardKind,
    },
    Result, WizardError,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const CHAT: ConversationId = ConversationId(100);

// Test helpers
struct Harness {
    engine: WizardEngine,
    sessions: Arc<InMemorySessionStore>,
    catalog: Arc<InMemoryCatalog>,
    transport: Arc<RecordingTransport>,
}

fn setup_with_catalog(catalog: Arc<dyn CatalogStorage>, inner: Arc<InMemoryCatalog>) -> Harness {
    let sessions = Arc::new(InMemorySessionStore::new());
    let transport = Arc::new(RecordingTransport::new());
    let engine = WizardEngine::new(
        sessions.clone(),
        catalog,
        transport.clone(),
        WizardSettings::default(),
    );
    Harness {
        engine,
        sessions,
        catalog: inner,
        transport,
    }
}

fn setup() -> Harness {
    let catalog = Arc::new(InMemoryCatalog::with_seed(
        ["Food", "Drinks"],
        ["main", "catalog", "cart", "about", "payment", "shipping"],
    ));
    setup_with_catalog(catalog.clone(), catalog)
}

async fn send(h: &Harness, input: UserInput) -> StepOutcome {
    h.engine.handle(CHAT, &input).await.unwrap()
}

async fn existing_product(h: &Harness) -> Product {
    h.catalog
        .create_product(ProductFields {
            name: "Old lamp".to_string(),
            description: "An old desk lamp".to_string(),
            category_id: CategoryId(1),
            price: Decimal::new(1500, 2),
            image: PhotoRef::from("old-photo"),
        })
        .await
        .unwrap()
}

/// Catalog whose writes always fail
struct FailingCatalog {
    inner: Arc<InMemoryCatalog>,
}

#[async_trait]
impl CatalogStorage for FailingCatalog {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.inner.list_categories().await
    }

    async fn list_info_pages(&self) -> Result<Vec<InfoPage>> {
        self.inner.list_info_pages().await
    }

    async fn list_products(&self, category: CategoryId) -> Result<Vec<Product>> {
        self.inner.list_products(category).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.inner.get_product(id).await
    }

    async fn create_product(&self, _fields: ProductFields) -> Result<Product> {
        Err(WizardError::Storage(anyhow::anyhow!("database is locked")))
    }

    async fn update_product(&self, _id: ProductId, _fields: ProductFields) -> Result<Product> {
        Err(WizardError::Storage(anyhow::anyhow!("database is locked")))
    }

    async fn delete_product(&self, _id: ProductId) -> Result<()> {
        Err(WizardError::Storage(anyhow::anyhow!("database is locked")))
    }

    async fn set_banner_image(&self, _page_name: &str, _image: PhotoRef) -> Result<()> {
        Err(WizardError::Storage(anyhow::anyhow!("database is locked")))
    }
}

#[tokio::test]
async fn test_start_product_wizard_prompts_first_step() {
    let h = setup();

    let outcome = h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    assert_eq!(outcome, StepOutcome::Started { wizard: WizardKind::ProductUpsert, editing: false });

    let sent = h.transport.last().await.unwrap();
    assert_eq!(sent.text(), Some(steps_for(WizardKind::ProductUpsert)[0].prompt));
    assert_eq!(sent.keyboard(), Some(&Keyboard::Remove));

    let session = h.sessions.get(CHAT).await;
    assert_eq!(session.current_step(), Some((WizardKind::ProductUpsert, 0)));
}

#[tokio::test]
async fn test_start_while_active_is_refused() {
    let h = setup();
    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();

    let err = h.engine.start(CHAT, WizardKind::BannerAssignment).await.unwrap_err();
    assert!(matches!(err, WizardError::SessionBusy { .. }));
    assert_eq!(h.sessions.get(CHAT).await.current_step(), Some((WizardKind::ProductUpsert, 0)));
}

#[tokio::test]
async fn test_full_product_wizard_creates_product() {
    let h = setup();
    let mut events = h.engine.events().subscribe();
    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();

    assert_eq!(send(&h, UserInput::text("Widget")).await, StepOutcome::Advanced { wizard: WizardKind::ProductUpsert, to: 1 });
    assert_eq!(send(&h, UserInput::text("A useful widget")).await, StepOutcome::Advanced { wizard: WizardKind::ProductUpsert, to: 2 });

    // The category prompt carries one button per category
    let category_prompt = h.transport.last().await.unwrap();
    assert_eq!(category_prompt.text(), Some("Choose the category:"));
    assert_eq!(category_prompt.keyboard().unwrap().callback_data(), vec!["1", "2"]);

    assert_eq!(send(&h, UserInput::callback("2")).await, StepOutcome::Advanced { wizard: WizardKind::ProductUpsert, to: 3 });
    assert_eq!(send(&h, UserInput::text("9.99")).await, StepOutcome::Advanced { wizard: WizardKind::ProductUpsert, to: 4 });

    let outcome = send(&h, UserInput::photo("widget-photo")).await;
    let expected = ProductFields {
        name: "Widget".to_string(),
        description: "A useful widget".to_string(),
        category_id: CategoryId(2),
        price: Decimal::new(999, 2),
        image: PhotoRef::from("widget-photo"),
    };
    match outcome {
        StepOutcome::Completed(Completion::Product(product)) => assert_eq!(product.fields(), expected),
        other => panic!("expected completion, got {:?}", other),
    }

    assert_eq!(h.catalog.product_count().await, 1);
    assert_eq!(h.transport.last_text().await.as_deref(), Some(PRODUCT_SAVED));

    let session = h.sessions.get(CHAT).await;
    assert!(session.is_idle());
    assert!(session.collected_fields.is_empty());

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.event_type);
    }
    assert_eq!(kinds.first(), Some(&WizardEventType::Started { editing: false }));
    assert_eq!(kinds.last(), Some(&WizardEventType::Completed));
    assert_eq!(kinds.len(), 6);
}

#[tokio::test]
async fn test_invalid_input_leaves_session_unchanged() {
    let h = setup();
    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    send(&h, UserInput::text("Widget")).await;

    let before = h.sessions.get(CHAT).await;
    let invalid_inputs = [
        UserInput::text("abc"),
        UserInput::photo("p"),
        UserInput::callback("1"),
    ];
    for input in invalid_inputs {
        let outcome = send(&h, input).await;
        assert!(matches!(outcome, StepOutcome::Reprompted(_)));
        let after = h.sessions.get(CHAT).await;
        assert_eq!(after.state, before.state);
        assert_eq!(after.collected_fields, before.collected_fields);
    }
}

#[tokio::test]
async fn test_price_abc_reprompts_with_digits_hint() {
    let h = setup();
    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    send(&h, UserInput::text("Widget")).await;
    send(&h, UserInput::text("A useful widget")).await;
    send(&h, UserInput::callback("1")).await;

    let outcome = send(&h, UserInput::text("abc")).await;
    assert_eq!(outcome, StepOutcome::Reprompted(StepRejection::invalid(PRICE_DIGITS_ONLY)));
    assert_eq!(h.transport.last_text().await.as_deref(), Some(PRICE_DIGITS_ONLY));
    assert_eq!(h.sessions.get(CHAT).await.current_step(), Some((WizardKind::ProductUpsert, 3)));
    assert!(h.sessions.get(CHAT).await.field(FieldName::Price).is_none());
}

#[tokio::test]
async fn test_unknown_category_reprompts_with_buttons() {
    let h = setup();
    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    send(&h, UserInput::text("Widget")).await;
    send(&h, UserInput::text("A useful widget")).await;

    let outcome = send(&h, UserInput::callback("77")).await;
    assert!(matches!(outcome, StepOutcome::Reprompted(StepRejection::UnknownSelection { .. })));

    let sent = h.transport.last().await.unwrap();
    assert_eq!(sent.text(), Some(CATEGORY_NOT_IN_LIST));
    assert_eq!(sent.keyboard().unwrap().callback_data(), vec!["1", "2"]);
    assert_eq!(h.sessions.get(CHAT).await.current_step(), Some((WizardKind::ProductUpsert, 2)));
}

#[tokio::test]
async fn test_back_from_first_step_is_rejected() {
    for wizard in [WizardKind::ProductUpsert, WizardKind::BannerAssignment] {
        let h = setup();
        h.engine.start(CHAT, wizard).await.unwrap();
        let before = h.sessions.get(CHAT).await;

        let outcome = send(&h, UserInput::text("back")).await;
        assert!(matches!(outcome, StepOutcome::NavigationRejected(StepRejection::FirstStep { .. })));
        assert_eq!(h.transport.last_text().await.as_deref(), Some(FIRST_STEP_BACK));

        let after = h.sessions.get(CHAT).await;
        assert_eq!(after.state, before.state);
        assert_eq!(after.collected_fields, before.collected_fields);
    }
}

#[tokio::test]
async fn test_back_from_category_returns_to_description() {
    let h = setup();
    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    send(&h, UserInput::text("Widget")).await;
    send(&h, UserInput::text("A useful widget")).await;

    // Category is the third step (index 2); back lands on description
    let outcome = send(&h, UserInput::text("/back")).await;
    assert_eq!(outcome, StepOutcome::SteppedBack { wizard: WizardKind::ProductUpsert, to: 1 });

    let session = h.sessions.get(CHAT).await;
    assert_eq!(session.current_step(), Some((WizardKind::ProductUpsert, 1)));
    assert_eq!(session.field(FieldName::Name), Some(&FieldValue::Text("Widget".to_string())));
    assert_eq!(
        h.transport.last_text().await.as_deref(),
        Some("Ok, you are on the previous step \n Enter the description of the product again:")
    );

    // Moving forward again overwrites the description
    send(&h, UserInput::text("A better widget")).await;
    let session = h.sessions.get(CHAT).await;
    assert_eq!(session.field(FieldName::Description), Some(&FieldValue::Text("A better widget".to_string())));
    assert_eq!(session.current_step(), Some((WizardKind::ProductUpsert, 2)));
}

#[tokio::test]
async fn test_back_onto_category_step_shows_buttons() {
    let h = setup();
    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    send(&h, UserInput::text("Widget")).await;
    send(&h, UserInput::text("A useful widget")).await;
    send(&h, UserInput::callback("1")).await;

    send(&h, UserInput::text("back")).await;
    let sent = h.transport.last().await.unwrap();
    assert_eq!(sent.keyboard().unwrap().callback_data(), vec!["1", "2"]);
}

#[tokio::test]
async fn test_cancel_clears_session() {
    let h = setup();
    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    send(&h, UserInput::text("Widget")).await;

    let outcome = send(&h, UserInput::text("CANCEL")).await;
    assert_eq!(outcome, StepOutcome::Cancelled);
    assert_eq!(h.transport.last_text().await.as_deref(), Some(CANCELED));

    let session = h.sessions.get(CHAT).await;
    assert!(session.is_idle());
    assert!(session.collected_fields.is_empty());
}

#[tokio::test]
async fn test_cancel_when_idle_is_a_no_op() {
    let h = setup();

    assert_eq!(send(&h, UserInput::text("cancel")).await, StepOutcome::Ignored);
    assert_eq!(send(&h, UserInput::text("/cancel")).await, StepOutcome::Ignored);
    assert_eq!(send(&h, UserInput::text("back")).await, StepOutcome::Ignored);

    assert!(h.transport.messages().await.is_empty());
    assert!(h.sessions.get(CHAT).await.is_idle());
}

#[tokio::test]
async fn test_edit_with_reuse_keeps_existing_values() {
    let h = setup();
    let product = existing_product(&h).await;

    let outcome = h.engine.start_edit(CHAT, product.id).await.unwrap();
    assert_eq!(outcome, StepOutcome::Started { wizard: WizardKind::ProductUpsert, editing: true });
    assert_eq!(h.transport.last_text().await.as_deref(), Some(EDIT_NAME_PROMPT));

    send(&h, UserInput::text(".")).await;
    assert_eq!(
        h.sessions.get(CHAT).await.field(FieldName::Name),
        Some(&FieldValue::Text("Old lamp".to_string()))
    );

    send(&h, UserInput::text(".")).await;
    assert_eq!(
        h.sessions.get(CHAT).await.field(FieldName::Description),
        Some(&FieldValue::Text(product.description.clone()))
    );

    send(&h, UserInput::callback("2")).await;

    send(&h, UserInput::text(".")).await;
    assert_eq!(
        h.sessions.get(CHAT).await.field(FieldName::Price),
        Some(&FieldValue::Price(Decimal::new(1500, 2)))
    );

    let outcome = send(&h, UserInput::text(".")).await;
    let updated = match outcome {
        StepOutcome::Completed(Completion::Product(product)) => product,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(updated.id, product.id);
    assert_eq!(updated.name, "Old lamp");
    assert_eq!(updated.description, "An old desk lamp");
    assert_eq!(updated.category_id, CategoryId(2));
    assert_eq!(updated.price, Decimal::new(1500, 2));
    assert_eq!(updated.image, PhotoRef::from("old-photo"));

    // Updated in place, not inserted
    assert_eq!(h.catalog.product_count().await, 1);
    assert!(h.sessions.get(CHAT).await.edit_context.is_none());
}

#[tokio::test]
async fn test_edit_unknown_product_fails() {
    let h = setup();
    let err = h.engine.start_edit(CHAT, ProductId(404)).await.unwrap_err();
    assert!(matches!(err, WizardError::NotFound(_)));
    assert!(h.sessions.get(CHAT).await.is_idle());
}

#[tokio::test]
async fn test_edit_contexts_are_per_conversation() {
    let h = setup();
    let product = existing_product(&h).await;
    let other = ConversationId(200);

    h.engine.start_edit(CHAT, product.id).await.unwrap();
    h.engine.start(other, WizardKind::ProductUpsert).await.unwrap();

    // The second admin is adding, so "." is just a too-short name there
    let outcome = h.engine.handle(other, &UserInput::text(".")).await.unwrap();
    assert!(matches!(outcome, StepOutcome::Reprompted(_)));
    assert!(h.sessions.get(other).await.edit_context.is_none());

    let outcome = h.engine.handle(CHAT, &UserInput::text(".")).await.unwrap();
    assert_eq!(outcome, StepOutcome::Advanced { wizard: WizardKind::ProductUpsert, to: 1 });
}

#[tokio::test]
async fn test_completion_failure_is_reported_and_session_cleared() {
    let inner = Arc::new(InMemoryCatalog::with_seed(["Food"], ["main"]));
    let failing = Arc::new(FailingCatalog { inner: inner.clone() });
    let h = setup_with_catalog(failing, inner);

    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    send(&h, UserInput::text("Widget")).await;
    send(&h, UserInput::text("A useful widget")).await;
    send(&h, UserInput::callback("1")).await;
    send(&h, UserInput::text("9.99")).await;

    let outcome = send(&h, UserInput::photo("widget-photo")).await;
    match outcome {
        StepOutcome::CompletionFailed { error } => assert!(error.contains("database is locked")),
        other => panic!("expected completion failure, got {:?}", other),
    }

    let text = h.transport.last_text().await.unwrap();
    assert!(text.starts_with("Error: \n "));
    assert!(text.contains("database is locked"));
    assert!(h.sessions.get(CHAT).await.is_idle());
    assert_eq!(h.catalog.product_count().await, 0);
}

#[tokio::test]
async fn test_banner_wizard_sets_banner() {
    let h = setup();
    h.engine.start(CHAT, WizardKind::BannerAssignment).await.unwrap();

    let prompt = h.transport.last_text().await.unwrap();
    assert!(prompt.starts_with("Send a banner photo."));
    assert!(prompt.ends_with("main, catalog, cart, about, payment, shipping"));

    let outcome = send(&h, UserInput::photo_with_caption("banner-photo", "about")).await;
    assert_eq!(outcome, StepOutcome::Completed(Completion::Banner { page: "about".to_string() }));
    assert_eq!(h.catalog.banner_of("about").await, Some(PhotoRef::from("banner-photo")));
    assert_eq!(h.transport.last_text().await.as_deref(), Some(BANNER_SAVED));
    assert!(h.sessions.get(CHAT).await.is_idle());
}

#[tokio::test]
async fn test_banner_with_unknown_page_does_not_set_banner() {
    let h = setup();
    h.engine.start(CHAT, WizardKind::BannerAssignment).await.unwrap();

    let outcome = send(&h, UserInput::photo_with_caption("banner-photo", "contacts")).await;
    assert!(matches!(outcome, StepOutcome::Reprompted(StepRejection::UnknownSelection { .. })));

    for page in ["main", "catalog", "cart", "about", "payment", "shipping"] {
        assert_eq!(h.catalog.banner_of(page).await, None);
    }
    assert_eq!(h.sessions.get(CHAT).await.current_step(), Some((WizardKind::BannerAssignment, 0)));

    let outcome = send(&h, UserInput::text("main")).await;
    assert!(matches!(outcome, StepOutcome::Reprompted(StepRejection::Invalid { .. })));
}

#[tokio::test]
async fn test_banner_completion_failure_clears_session() {
    let inner = Arc::new(InMemoryCatalog::with_seed(["Food"], ["main"]));
    let failing = Arc::new(FailingCatalog { inner: inner.clone() });
    let h = setup_with_catalog(failing, inner);

    h.engine.start(CHAT, WizardKind::BannerAssignment).await.unwrap();
    let outcome = send(&h, UserInput::photo_with_caption("b", "main")).await;
    assert!(matches!(outcome, StepOutcome::CompletionFailed { .. }));
    assert!(h.sessions.get(CHAT).await.is_idle());
}

#[tokio::test]
async fn test_duplicate_deliveries_are_serialized() {
    let h = Arc::new(setup());
    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();

    // The same name delivered twice at once: one advances to description,
    // the other is then validated as a description
    let first = {
        let h = Arc::clone(&h);
        tokio::spawn(async move { h.engine.handle(CHAT, &UserInput::text("Widget")).await })
    };
    let second = {
        let h = Arc::clone(&h);
        tokio::spawn(async move { h.engine.handle(CHAT, &UserInput::text("Widget")).await })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let session = h.sessions.get(CHAT).await;
    assert_eq!(session.current_step(), Some((WizardKind::ProductUpsert, 2)));
    assert_eq!(session.field(FieldName::Name), Some(&FieldValue::Text("Widget".to_string())));
    assert_eq!(session.field(FieldName::Description), Some(&FieldValue::Text("Widget".to_string())));
}

/// Transport that can be switched to refuse every delivery
struct FlakyTransport {
    inner: RecordingTransport,
    failing: AtomicBool,
}

impl FlakyTransport {
    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(WizardError::Transport("chat unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChatTransport for FlakyTransport {
    async fn send_text(&self, conversation: ConversationId, text: &str, keyboard: Option<Keyboard>) -> Result<()> {
        self.check()?;
        self.inner.send_text(conversation, text, keyboard).await
    }

    async fn send_photo(
        &self,
        conversation: ConversationId,
        photo: &PhotoRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        self.check()?;
        self.inner.send_photo(conversation, photo, caption, keyboard).await
    }

    async fn send_animation(&self, conversation: ConversationId, animation: &str) -> Result<()> {
        self.check()?;
        self.inner.send_animation(conversation, animation).await
    }

    async fn delete_message(&self, conversation: ConversationId, message_id: i64) -> Result<()> {
        self.check()?;
        self.inner.delete_message(conversation, message_id).await
    }
}

fn setup_flaky() -> (WizardEngine, Arc<InMemorySessionStore>, Arc<FlakyTransport>) {
    let sessions = Arc::new(InMemorySessionStore::new());
    let catalog = Arc::new(InMemoryCatalog::with_seed(["Food", "Drinks"], ["main"]));
    let transport = Arc::new(FlakyTransport {
        inner: RecordingTransport::new(),
        failing: AtomicBool::new(false),
    });
    let engine = WizardEngine::new(sessions.clone(), catalog, transport.clone(), WizardSettings::default());
    (engine, sessions, transport)
}

#[tokio::test]
async fn test_lock_entries_are_dropped_when_idle() {
    let h = setup();

    for id in 0..1000 {
        let outcome = h.engine.handle(ConversationId(id), &UserInput::text("hello")).await.unwrap();
        assert_eq!(outcome, StepOutcome::Ignored);
    }
    assert_eq!(h.engine.lock_count(), 0);

    h.engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    assert_eq!(h.engine.lock_count(), 1);
    send(&h, UserInput::text("cancel")).await;
    assert_eq!(h.engine.lock_count(), 0);

    h.engine.start(CHAT, WizardKind::BannerAssignment).await.unwrap();
    let outcome = send(&h, UserInput::photo_with_caption("b", "main")).await;
    assert!(matches!(outcome, StepOutcome::Completed(_)));
    assert_eq!(h.engine.lock_count(), 0);

    h.engine.start_edit(CHAT, ProductId(404)).await.unwrap_err();
    assert_eq!(h.engine.lock_count(), 0);
}

#[tokio::test]
async fn test_start_is_undone_when_prompt_cannot_be_sent() {
    let (engine, sessions, transport) = setup_flaky();

    transport.set_failing(true);
    let err = engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap_err();
    assert!(matches!(err, WizardError::Transport(_)));
    assert!(sessions.get(CHAT).await.is_idle());
    assert_eq!(engine.lock_count(), 0);

    transport.set_failing(false);
    let outcome = engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    assert_eq!(outcome, StepOutcome::Started { wizard: WizardKind::ProductUpsert, editing: false });
}

#[tokio::test]
async fn test_step_is_rolled_back_when_next_prompt_cannot_be_sent() {
    let (engine, sessions, transport) = setup_flaky();
    engine.start(CHAT, WizardKind::ProductUpsert).await.unwrap();
    engine.handle(CHAT, &UserInput::text("Widget")).await.unwrap();

    transport.set_failing(true);
    let err = engine
        .handle(CHAT, &UserInput::text("A very useful widget"))
        .await
        .unwrap_err();
    assert!(matches!(err, WizardError::Transport(_)));
    assert_eq!(sessions.get(CHAT).await.current_step(), Some((WizardKind::ProductUpsert, 1)));

    // Back is rolled back the same way
    let err = engine.handle(CHAT, &UserInput::text("back")).await.unwrap_err();
    assert!(matches!(err, WizardError::Transport(_)));
    assert_eq!(sessions.get(CHAT).await.current_step(), Some((WizardKind::ProductUpsert, 1)));

    transport.set_failing(false);
    let outcome = engine
        .handle(CHAT, &UserInput::text("A very useful widget"))
        .await
        .unwrap();
    assert_eq!(outcome, StepOutcome::Advanced { wizard: WizardKind::ProductUpsert, to: 2 });
    assert_eq!(
        transport.inner.last().await.and_then(|m| m.keyboard().cloned()),
        Some(Keyboard::inline(vec![("Food", "1"), ("Drinks", "2")]))
    );
}
