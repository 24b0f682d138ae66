//! Integration tests for the search indexer orchestrator.
//!
//! These use the real orchestrator with a scripted consumer, a stub hotel
//! fetcher, and a mock index provider, so the full event → fetch → index
//! path runs without any external services.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use uuid::Uuid;

use booking_shared::{Hotel, HotelChangeEvent};
use search_indexer::consumer::StreamMessage;
use search_indexer::errors::IngestError;
use search_indexer::inventory::HotelFetcher;
use search_indexer::loader::SearchLoader;
use search_indexer::orchestrator::{Consumer, Orchestrator, OrchestratorConfig};
use search_indexer::processor::HotelProcessor;
use search_repository::{HotelDocument, HotelIndexProvider, HotelIndexService, SearchIndexError};

/// Consumer that delivers one scripted batch, then ends the stream.
struct ScriptedConsumer {
    events: Vec<HotelChangeEvent>,
    error_on_subscribe: bool,
    acked: Arc<Mutex<Vec<bool>>>,
}

impl ScriptedConsumer {
    fn new(events: Vec<HotelChangeEvent>) -> Self {
        Self {
            events,
            error_on_subscribe: false,
            acked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_subscribe_error() -> Self {
        Self {
            events: Vec::new(),
            error_on_subscribe: true,
            acked: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait::async_trait]
impl Consumer for ScriptedConsumer {
    fn subscribe(&self) -> Result<(), IngestError> {
        if self.error_on_subscribe {
            Err(IngestError::KafkaError("Mock subscribe error".to_string()))
        } else {
            Ok(())
        }
    }

    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::Receiver<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        let events = self.events.clone();
        let offsets = vec![("hotels-news".to_string(), 0, 1i64)];

        if !events.is_empty() {
            let _ = sender.send(StreamMessage::Events { events, offsets }).await;

            tokio::select! {
                _ = shutdown.recv() => {}
                Some(StreamMessage::Acknowledgment { success, .. }) = ack_receiver.recv() => {
                    self.acked.lock().unwrap().push(success);
                }
            }
        }

        let _ = sender.send(StreamMessage::End).await;
        Ok(())
    }
}

/// Fetcher serving a fixed inventory.
#[derive(Default)]
struct StubFetcher {
    hotels: HashMap<Uuid, Hotel>,
    fail: bool,
}

#[async_trait::async_trait]
impl HotelFetcher for StubFetcher {
    async fn hotel_by_id(&self, hotel_id: &Uuid) -> Result<Option<Hotel>, IngestError> {
        if self.fail {
            return Err(IngestError::fetch("stub fetch failure"));
        }
        Ok(self.hotels.get(hotel_id).cloned())
    }
}

/// Index provider recording every operation.
#[derive(Default)]
struct RecordingProvider {
    indexed: Mutex<Vec<HotelDocument>>,
    updated: Mutex<Vec<HotelDocument>>,
    deleted: Mutex<Vec<Uuid>>,
}

#[async_trait::async_trait]
impl HotelIndexProvider for RecordingProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn index_document(&self, document: &HotelDocument) -> Result<(), SearchIndexError> {
        self.indexed.lock().unwrap().push(document.clone());
        Ok(())
    }

    async fn update_document(&self, document: &HotelDocument) -> Result<(), SearchIndexError> {
        self.updated.lock().unwrap().push(document.clone());
        Ok(())
    }

    async fn delete_document(&self, hotel_id: &Uuid) -> Result<(), SearchIndexError> {
        self.deleted.lock().unwrap().push(*hotel_id);
        Ok(())
    }

    async fn search(
        &self,
        _query: &str,
        _offset: usize,
        _limit: usize,
    ) -> Result<Vec<HotelDocument>, SearchIndexError> {
        Ok(Vec::new())
    }
}

struct TestHarness {
    orchestrator: Orchestrator,
    provider: Arc<RecordingProvider>,
    acked: Arc<Mutex<Vec<bool>>>,
}

fn harness(events: Vec<HotelChangeEvent>, hotels: Vec<Hotel>, fail_fetch: bool) -> TestHarness {
    let provider = Arc::new(RecordingProvider::default());

    // The loader needs its own provider handle; share state through Arc.
    struct SharedProvider(Arc<RecordingProvider>);

    #[async_trait::async_trait]
    impl HotelIndexProvider for SharedProvider {
        async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
            self.0.ensure_index_exists().await
        }
        async fn index_document(&self, document: &HotelDocument) -> Result<(), SearchIndexError> {
            self.0.index_document(document).await
        }
        async fn update_document(&self, document: &HotelDocument) -> Result<(), SearchIndexError> {
            self.0.update_document(document).await
        }
        async fn delete_document(&self, hotel_id: &Uuid) -> Result<(), SearchIndexError> {
            self.0.delete_document(hotel_id).await
        }
        async fn search(
            &self,
            query: &str,
            offset: usize,
            limit: usize,
        ) -> Result<Vec<HotelDocument>, SearchIndexError> {
            self.0.search(query, offset, limit).await
        }
    }

    let index = Arc::new(HotelIndexService::new(Box::new(SharedProvider(Arc::clone(
        &provider,
    )))));
    let loader = SearchLoader::new(index);

    let fetcher = StubFetcher {
        hotels: hotels.into_iter().map(|h| (h.id, h)).collect(),
        fail: fail_fetch,
    };
    let processor = HotelProcessor::new(Arc::new(fetcher));

    let consumer = ScriptedConsumer::new(events);
    let acked = Arc::clone(&consumer.acked);

    TestHarness {
        orchestrator: Orchestrator::new(Arc::new(consumer), processor, loader),
        provider,
        acked,
    }
}

#[tokio::test]
async fn create_events_are_fetched_and_indexed() {
    let hotel_a = Hotel::named(Uuid::new_v4(), "Grand Plaza");
    let hotel_b = Hotel::named(Uuid::new_v4(), "Sea View");
    let events = vec![
        HotelChangeEvent::create(hotel_a.id),
        HotelChangeEvent::create(hotel_b.id),
    ];

    let mut h = harness(events, vec![hotel_a.clone(), hotel_b.clone()], false);

    let result = timeout(Duration::from_secs(5), h.orchestrator.run()).await;
    assert!(result.is_ok());
    assert!(result.unwrap().is_ok());

    let indexed = h.provider.indexed.lock().unwrap();
    assert_eq!(indexed.len(), 2);
    let names: Vec<_> = indexed.iter().map(|d| d.name.clone()).collect();
    assert!(names.contains(&"Grand Plaza".to_string()));
    assert!(names.contains(&"Sea View".to_string()));

    assert_eq!(h.acked.lock().unwrap().as_slice(), &[true]);
}

#[tokio::test]
async fn update_events_merge_into_the_index() {
    let hotel = Hotel::named(Uuid::new_v4(), "Grand Plaza");
    let events = vec![HotelChangeEvent::update(hotel.id)];

    let mut h = harness(events, vec![hotel], false);

    timeout(Duration::from_secs(5), h.orchestrator.run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(h.provider.updated.lock().unwrap().len(), 1);
    assert_eq!(h.provider.indexed.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn delete_events_remove_documents_without_fetching() {
    let id_a = Uuid::new_v4();
    let id_b = Uuid::new_v4();
    let events = vec![HotelChangeEvent::delete(id_a), HotelChangeEvent::delete(id_b)];

    // Empty inventory: deletes must not require a fetch.
    let mut h = harness(events, vec![], false);

    timeout(Duration::from_secs(5), h.orchestrator.run())
        .await
        .unwrap()
        .unwrap();

    let deleted = h.provider.deleted.lock().unwrap();
    assert_eq!(deleted.len(), 2);
    assert!(deleted.contains(&id_a));
    assert!(deleted.contains(&id_b));
}

#[tokio::test]
async fn fetch_failure_nacks_the_batch() {
    let events = vec![HotelChangeEvent::create(Uuid::new_v4())];

    let mut h = harness(events, vec![], true);

    timeout(Duration::from_secs(5), h.orchestrator.run())
        .await
        .unwrap()
        .unwrap();

    // The batch was not applied and was negatively acknowledged.
    assert_eq!(h.provider.indexed.lock().unwrap().len(), 0);
    assert_eq!(h.acked.lock().unwrap().as_slice(), &[false]);
}

#[tokio::test]
async fn empty_event_stream_completes_cleanly() {
    let mut h = harness(vec![], vec![], false);

    timeout(Duration::from_secs(5), h.orchestrator.run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(h.provider.indexed.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn subscribe_failure_surfaces() {
    let provider = Arc::new(RecordingProvider::default());

    struct SharedProvider(Arc<RecordingProvider>);
    #[async_trait::async_trait]
    impl HotelIndexProvider for SharedProvider {
        async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
            Ok(())
        }
        async fn index_document(&self, _d: &HotelDocument) -> Result<(), SearchIndexError> {
            Ok(())
        }
        async fn update_document(&self, _d: &HotelDocument) -> Result<(), SearchIndexError> {
            Ok(())
        }
        async fn delete_document(&self, _id: &Uuid) -> Result<(), SearchIndexError> {
            Ok(())
        }
        async fn search(
            &self,
            _q: &str,
            _o: usize,
            _l: usize,
        ) -> Result<Vec<HotelDocument>, SearchIndexError> {
            Ok(Vec::new())
        }
    }

    let index = Arc::new(HotelIndexService::new(Box::new(SharedProvider(provider))));
    let loader = SearchLoader::new(index);
    let processor = HotelProcessor::new(Arc::new(StubFetcher::default()));

    let mut orchestrator = Orchestrator::with_config(
        Arc::new(ScriptedConsumer::with_subscribe_error()),
        processor,
        loader,
        OrchestratorConfig::default(),
    );

    let result = timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .unwrap();

    match result {
        Err(IngestError::KafkaError(msg)) => assert_eq!(msg, "Mock subscribe error"),
        other => panic!("expected KafkaError, got {:?}", other),
    }
}

#[tokio::test]
async fn shutdown_stops_the_orchestrator() {
    let hotel = Hotel::named(Uuid::new_v4(), "Grand Plaza");
    let events = vec![HotelChangeEvent::create(hotel.id)];
    let h = harness(events, vec![hotel], false);

    let orchestrator = Arc::new(tokio::sync::Mutex::new(h.orchestrator));

    let shutdown_clone = Arc::clone(&orchestrator);
    let shutdown_handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_clone.lock().await.shutdown();
    });

    let run_clone = Arc::clone(&orchestrator);
    let run_handle = tokio::spawn(async move {
        let mut orchestrator = run_clone.lock().await;
        orchestrator.run().await
    });

    let (shutdown_result, run_result) = tokio::join!(shutdown_handle, run_handle);
    assert!(shutdown_result.is_ok());
    assert!(run_result.unwrap().is_ok());
}
