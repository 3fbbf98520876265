pub mod dialog;
pub mod hints;
pub mod toast;
