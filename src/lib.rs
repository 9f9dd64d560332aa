pub mod capture;
pub mod gui;
pub mod logging;
pub mod map;
pub mod ocr;
pub mod settings;
pub mod world;
