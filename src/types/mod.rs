pub mod consensus;
pub mod location;
pub mod parameter;
pub mod report;
pub mod series;
pub mod source;
pub mod weather_code;
