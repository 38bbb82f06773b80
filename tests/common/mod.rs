// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use ride_notify::config::Config;
use ride_notify::db::FirestoreDb;
use ride_notify::routes::create_router;
use ride_notify::services::{
    EventHandlers, ExpoClient, ParticipantCounter, PushDispatcher, RecipientDirectory,
    TokenReclaimer,
};
use ride_notify::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Write a document directly, bypassing the typed operations. The service
/// never creates ride or user documents itself (the mobile app does), so
/// emulator tests seed them here.
#[allow(dead_code)]
pub async fn seed_document<T>(db: &FirestoreDb, collection: &str, id: &str, doc: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync,
{
    let _: () = db
        .client()
        .expect("emulator client")
        .fluent()
        .update()
        .in_col(collection)
        .document_id(id)
        .object(doc)
        .execute()
        .await
        .expect("seed write failed");
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();

    let expo = ExpoClient::new(None).expect("Failed to build push client");
    let reclaimer = TokenReclaimer::new(db.clone());
    let dispatcher = PushDispatcher::new(expo, reclaimer);

    let recipients = RecipientDirectory::new(db.clone());
    let counter = ParticipantCounter::new(db.clone());
    let handlers = EventHandlers::new(recipients, dispatcher.clone(), counter);

    let state = Arc::new(AppState {
        config,
        db,
        dispatcher,
        handlers,
    });

    (create_router(state.clone()), state)
}
