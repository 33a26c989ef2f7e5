pub mod health_handlers;
pub mod ocr_handlers;
