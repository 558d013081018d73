pub mod audio;
pub mod classifier;
pub mod commands;
pub mod diagnostics;
pub mod listener;
pub mod notification;
pub mod settings;
pub mod utils;

pub use classifier::{Classifier, SoundCategory};
pub use listener::{Listener, ListenerOptions};
