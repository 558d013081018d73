pub mod clock;
pub mod config;
pub mod controller;
pub mod intent;
pub mod scheduler;
pub mod state;


pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClassifierConfig;
pub use controller::Classifier;
pub use intent::SoundCategory;
pub use scheduler::{Deadline, DeferredTask, ManualScheduler, Scheduler, TaskId, TokioScheduler};
pub use state::{ClassifierState, TypingState};
