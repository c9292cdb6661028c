//! # Brewvat Core Library
//!
//! This library provides the core business logic for the Brewvat kombucha
//! brew controller. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary, with any GUI being
//! a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Lifecycle**: A persisted recipe state machine (draft, brewing,
//!   paused, completed) whose live states are guarded by a single
//!   system-wide sensor lock
//! - **Storage**: SQLite-based recipe, lock and sample storage plus
//!   TOML-based configuration
//! - **Alerting**: Pure severity classification of temperature readings and
//!   per-session debouncing of banners, physical alerts and pushes
//! - **Feed**: Latest-sample-wins delivery from the probe bridge to
//!   observing sessions
//!
//! ## Key Components
//!
//! - [`BrewController`]: Lifecycle transitions and lock arbitration
//! - [`Store`]: Recipe, lock and sample persistence
//! - [`Config`]: Application configuration management
//! - [`AlertDebouncer`]: Alert gating for one observing session
//! - [`Notifier`]: Trait for push notification sinks

pub mod alerts;
pub mod error;
pub mod events;
pub mod feed;
pub mod lifecycle;
pub mod lock;
pub mod notify;
pub mod recipe;
pub mod sample;
pub mod session;
pub mod severity;
pub mod storage;

pub use alerts::{AlertAction, AlertDebouncer, MotionCue};
pub use error::{
    ConfigError, CoreError, LifecycleError, NotifyError, PartialPurgeFailure, StoreError,
};
pub use events::BrewEvent;
pub use feed::SensorHub;
pub use lifecycle::{BrewCommand, BrewController};
pub use lock::{AcquireOutcome, LockHolder};
pub use notify::{Notifier, NullNotifier, WebhookNotifier};
pub use recipe::{BrewStatus, Recipe};
pub use sample::TemperatureSample;
pub use session::{observe, AlertStream};
pub use severity::{evaluate, evaluate_default, Reading, Severity, Thresholds};
pub use storage::{BrewStore, Config, PurgeOutcome, Store};
