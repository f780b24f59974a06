//! App and user scopes built from service locators.
//!
//! Demonstrates:
//! - Accessors keyed by their own path with `singleton!`
//! - A service behind a trait object
//! - A user-scoped child locator reaching app-scoped services
//! - Lifecycle hooks and the per-map trace callback
//!
//! Run with: `RUST_LOG=service_locator=debug cargo run --example app_scopes`

use service_locator::{
    singleton, try_singleton, ChildServiceLocator, Locator, LocatorKey, ServiceLocator,
    SingletonError, SingletonMap,
};
use std::sync::Arc;
use std::thread;
use tracing_subscriber::EnvFilter;

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Database {
    url: String,
}

#[derive(Debug)]
struct UserSession {
    user: String,
    database: Arc<Database>,
    started_at: u64,
}

// -------------------------------------------------------------------------
// App scope
// -------------------------------------------------------------------------

#[derive(Default)]
struct AppServices {
    base: ServiceLocator,
}

impl Locator for AppServices {
    fn singletons(&self) -> &SingletonMap<LocatorKey> {
        self.base.singletons()
    }

    fn activate(&self) {
        println!("   app scope activated");
    }

    fn deactivate(&self) {
        println!("   app scope deactivated");
    }
}

impl AppServices {
    fn database(&self) -> Result<Arc<Database>, SingletonError> {
        singleton!(self, || {
            println!("   building Database (runs once)");
            Database {
                url: "postgres://localhost/app".to_string(),
            }
        })
    }

    fn clock(&self) -> Result<Arc<Box<dyn Clock>>, SingletonError> {
        singleton!(self, || Box::new(FixedClock(1_700_000_000)) as Box<dyn Clock>)
    }
}

// -------------------------------------------------------------------------
// User scope
// -------------------------------------------------------------------------

struct UserServices {
    base: ChildServiceLocator<AppServices>,
    user: String,
}

impl Locator for UserServices {
    fn singletons(&self) -> &SingletonMap<LocatorKey> {
        self.base.singletons()
    }
}

impl UserServices {
    fn session(&self) -> Result<Arc<UserSession>, SingletonError> {
        try_singleton!(self, || {
            let app = self.base.parent();
            Ok(UserSession {
                user: self.user.clone(),
                database: app.database()?,
                started_at: app.clock()?.now(),
            })
        })
    }
}

fn main() -> Result<(), SingletonError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== service-locator: App Scopes ===\n");

    let app = Arc::new(AppServices::default());
    app.activate();

    app.singletons().set_trace_callback(|event| {
        println!("   [app-trace] {event}");
    });

    // -------------------------------------------------------------------------
    // 1. Concurrent first access builds the database once
    // -------------------------------------------------------------------------
    println!("1. Requesting the database from four threads...");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let app = Arc::clone(&app);
            thread::spawn(move || app.database())
        })
        .collect();

    for handle in handles {
        let database = handle.join().expect("worker thread panicked")?;
        println!("   got {}", database.url);
    }

    // -------------------------------------------------------------------------
    // 2. User scopes share app services but not their own
    // -------------------------------------------------------------------------
    println!("\n2. Opening two user scopes...");

    let alice = UserServices {
        base: ChildServiceLocator::new(Arc::clone(&app)),
        user: "alice".to_string(),
    };
    let bob = UserServices {
        base: ChildServiceLocator::new(Arc::clone(&app)),
        user: "bob".to_string(),
    };

    let alice_session = alice.session()?;
    let bob_session = bob.session()?;

    println!("   {} started at {}", alice_session.user, alice_session.started_at);
    println!("   {} started at {}", bob_session.user, bob_session.started_at);
    println!(
        "   same database: {}",
        Arc::ptr_eq(&alice_session.database, &bob_session.database)
    );
    println!(
        "   same session:  {}",
        Arc::ptr_eq(&alice_session, &bob_session)
    );

    // -------------------------------------------------------------------------
    // 3. Ending the app scope
    // -------------------------------------------------------------------------
    println!("\n3. Closing scopes...");

    drop(alice);
    drop(bob);
    app.singletons().clear_trace_callback();
    app.deactivate();

    println!("\n=== Example completed successfully ===");
    Ok(())
}
