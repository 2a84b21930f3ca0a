pub mod car;
pub mod logbook;
pub mod reminder;
pub mod settings;
pub mod stats;
pub mod trip;
