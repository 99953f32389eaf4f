pub mod mailer;
pub mod place_locator;
pub mod places_directory;
pub mod recommendation;
pub mod scorer;
